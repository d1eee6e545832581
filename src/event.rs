//! Lifecycle notifications emitted by [`LazySink`](crate::LazySink).

/// A lifecycle notification.
///
/// Events fire synchronously, right after the transition they
/// describe has taken effect. For one instance, [`Preend`],
/// [`Prefinish`] and [`Flush`] are each observed at most once and
/// always in that order; [`Close`] is always last.
///
/// [`Preend`]: Event::Preend
/// [`Prefinish`]: Event::Prefinish
/// [`Flush`]: Event::Flush
/// [`Close`]: Event::Close
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
	/// The cork depth went from 0 to 1. Deliveries are now gated.
	Cork,
	/// The cork depth returned to 0. Gated work may proceed.
	Uncork,
	/// All items queued ahead of the close request have been
	/// delivered; the underlying sink is about to be closed.
	Preend,
	/// The underlying sink has been closed (or never existed); the
	/// flush hook is about to run.
	Prefinish,
	/// The flush hook has started.
	Flush,
	/// The adapter has been torn down. No further event follows.
	Close,
}

/// Receives [`Event`]s from a [`LazySink`](crate::LazySink).
///
/// An observer is registered at construction with
/// [`with_observer`](crate::LazySink::with_observer) and is called
/// from whichever operation performed the transition. The default
/// observer is `()`, which ignores everything.
pub trait Observe {
	/// Called once per event, in order of occurrence.
	fn event(&mut self, event: Event);
}

impl Observe for () {
	fn event(&mut self, _: Event) {}
}

impl<O: Observe + ?Sized> Observe for &mut O {
	fn event(&mut self, event: Event) {
		(**self).event(event);
	}
}

impl<O: Observe + ?Sized> Observe for alloc::boxed::Box<O> {
	fn event(&mut self, event: Event) {
		(**self).event(event);
	}
}
