//! Module containing the implementation for [`LazySink`].

use core::fmt;
use core::future::{self, Future};
use core::pin::Pin;
use core::task::{ready, Context, Poll, Waker};

use alloc::collections::VecDeque;

use futures_sink::Sink;
use pin_project::pin_project;

use crate::error::LazySinkError;
use crate::event::{Event, Observe};
use crate::teardown::Teardown;

mod close;
mod config;
mod end;
mod resolve;

use self::close::CloseState;
use self::resolve::{State, StateProj};

pub use self::config::Config;
pub use self::end::End;

/// Factory type of a [`LazySink`] built from an existing sink.
pub type ReadyFactory<S, E> = future::Ready<Result<S, E>>;

/// Flush hook of a [`LazySink`] built without one.
pub type NoFlush<E> = future::Ready<Result<(), E>>;

/// Adapter that defers creation of a [`Sink`] until first use.
///
/// A [`LazySink`] is built from a factory future instead of a ready
/// sink. It accepts items right away and queues them; the first
/// time an item has to actually reach the sink, the factory is
/// driven to completion and the sink it produces takes over. From
/// then on queued items are forwarded in the exact order they were
/// accepted.
///
/// Delivery can be held back with [`cork()`] and released with
/// [`uncork()`]. A cork is a barrier: no queued item reaches the
/// underlying sink while the cork depth is above zero, although the
/// factory is still allowed to make progress.
///
/// Closing the adapter runs a fixed sequence. The queue is drained,
/// the underlying sink is closed, the flush hook given to
/// [`with_flush()`] runs once, and the adapter destroys itself. An
/// [`Observe`]r registered with [`with_observer()`] is notified at
/// each step.
///
/// Any failure, whether from the factory, the sink or the flush
/// hook, destroys the adapter. A destroyed adapter silently drops
/// every further item.
///
/// [`cork()`]: LazySink::cork
/// [`uncork()`]: LazySink::uncork
/// [`with_flush()`]: LazySink::with_flush
/// [`with_observer()`]: LazySink::with_observer
#[pin_project]
pub struct LazySink<T, S, F, H, O = ()>
where
	S: Sink<T>,
{
	#[pin]
	state: State<S, F>,
	#[pin]
	flush: H,
	queue: VecDeque<Queued<T>>,
	config: Config,
	corked: usize,
	close: CloseState,
	terminal: Option<LazySinkError<S::Error>>,
	waker: Option<Waker>,
	observer: O,
}

/// One slot of the pending queue.
///
/// The close request travels through the same queue as the data so
/// that it can never overtake an item accepted before it.
#[derive(Debug)]
enum Queued<T> {
	Item(T),
	FlushRequest,
}

impl<T, S, F> LazySink<T, S, F, NoFlush<S::Error>>
where
	S: Sink<T>,
	F: Future<Output = Result<S, S::Error>>,
{
	/// Create a new [`LazySink`] over the sink `factory` produces.
	///
	/// The factory is not polled before the first item needs to
	/// reach the sink.
	#[inline]
	#[must_use]
	pub fn new(factory: F) -> Self {
		Self {
			state: State::Unresolved(factory),
			flush: future::ready(Ok(())),
			queue: VecDeque::new(),
			config: Config::default(),
			corked: 0,
			close: CloseState::Idle,
			terminal: None,
			waker: None,
			observer: (),
		}
	}
}

impl<T, S> LazySink<T, S, ReadyFactory<S, S::Error>, NoFlush<S::Error>>
where
	S: Sink<T>,
{
	/// Create a new [`LazySink`] over a sink that already exists.
	///
	/// The adapter behaves as if its factory had resolved to `sink`
	/// before the first write.
	#[inline]
	#[must_use]
	pub fn from_sink(sink: S) -> Self {
		Self {
			state: State::Resolved(sink),
			flush: future::ready(Ok(())),
			queue: VecDeque::new(),
			config: Config::default(),
			corked: 0,
			close: CloseState::Idle,
			terminal: None,
			waker: None,
			observer: (),
		}
	}
}

impl<T, S, F, H, O> LazySink<T, S, F, H, O>
where
	S: Sink<T>,
{
	/// Replace the flush hook.
	///
	/// The hook runs exactly once, after the underlying sink has
	/// been closed and before the adapter reports completion. An
	/// error it reports surfaces as [`LazySinkError::Flush`] and
	/// destroys the adapter.
	#[inline]
	#[must_use]
	pub fn with_flush<H2>(self, flush: H2) -> LazySink<T, S, F, H2, O>
	where
		H2: Future<Output = Result<(), S::Error>>,
	{
		LazySink {
			state: self.state,
			flush,
			queue: self.queue,
			config: self.config,
			corked: self.corked,
			close: self.close,
			terminal: self.terminal,
			waker: self.waker,
			observer: self.observer,
		}
	}

	/// Replace the observer.
	#[inline]
	#[must_use]
	pub fn with_observer<O2>(
		self,
		observer: O2,
	) -> LazySink<T, S, F, H, O2>
	where
		O2: Observe,
	{
		LazySink {
			state: self.state,
			flush: self.flush,
			queue: self.queue,
			config: self.config,
			corked: self.corked,
			close: self.close,
			terminal: self.terminal,
			waker: self.waker,
			observer,
		}
	}

	/// Replace the configuration.
	#[inline]
	#[must_use]
	pub fn with_config(mut self, config: Config) -> Self {
		self.config = config;
		self
	}

	/// Get a reference to the underlying sink, if it has resolved.
	#[inline]
	#[must_use]
	pub fn sink(&self) -> Option<&S> {
		self.state.get()
	}

	/// Get a mutable reference to the underlying sink, if it has
	/// resolved.
	///
	/// Sending through the sink directly can reorder it around
	/// items still queued in the adapter.
	#[inline]
	#[must_use]
	pub fn sink_mut(&mut self) -> Option<&mut S> {
		self.state.get_mut()
	}

	/// Destruct this [`LazySink`] and get back the underlying sink,
	/// if it had resolved.
	#[inline]
	#[must_use]
	pub fn into_sink(self) -> Option<S> {
		self.state.into_sink()
	}

	/// Get the configuration of this adapter.
	#[inline]
	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Get a reference to the observer.
	#[inline]
	#[must_use]
	pub fn observer(&self) -> &O {
		&self.observer
	}

	/// Get a mutable reference to the observer.
	#[inline]
	#[must_use]
	pub fn observer_mut(&mut self) -> &mut O {
		&mut self.observer
	}

	/// Get the current cork depth.
	#[inline]
	#[must_use]
	pub fn cork_depth(&self) -> usize {
		self.corked
	}

	/// Check whether the adapter has been destroyed.
	///
	/// An adapter is destroyed by [`destroy()`], by any error, or
	/// by the completion of a graceful close.
	///
	/// [`destroy()`]: LazySink::destroy
	#[inline]
	#[must_use]
	pub fn is_destroyed(&self) -> bool {
		self.state.is_destroyed()
	}
}

impl<T, S, F, H, O> LazySink<T, S, F, H, O>
where
	S: Sink<T>,
	O: Observe,
{
	/// Raise the cork depth by one.
	///
	/// While the depth is above zero no queued item reaches the
	/// underlying sink and the close sequence makes no progress
	/// past its next notification. Corks nest, every call must be
	/// matched by one [`uncork()`](LazySink::uncork).
	pub fn cork(&mut self) {
		self.corked += 1;
		if self.corked == 1 {
			self.observer.event(Event::Cork);
		}
	}

	/// Lower the cork depth by one.
	///
	/// When the depth returns to zero, delivery resumes and the
	/// task waiting on the adapter, if any, is woken. Calling this
	/// with the depth already at zero does nothing.
	pub fn uncork(&mut self) {
		match self.corked {
			0 => {},
			1 => {
				self.corked = 0;
				self.observer.event(Event::Uncork);
				if let Some(waker) = self.waker.take() {
					waker.wake();
				}
			},
			_ => self.corked -= 1,
		}
	}
}

impl<T, S, F, H, O> LazySink<T, S, F, H, O>
where
	S: Sink<T> + Teardown,
	O: Observe,
{
	/// Destroy the adapter immediately.
	///
	/// Queued items are discarded, the underlying sink is torn down
	/// through [`Teardown`] if it had resolved, and every further
	/// item is silently dropped. Calling this on an adapter that is
	/// already destroyed has no effect.
	pub fn destroy(&mut self) {
		self.destroy_inner(None);
	}

	/// Destroy the adapter immediately, recording `error`.
	///
	/// Behaves like [`destroy()`](LazySink::destroy) and in
	/// addition hands `error` to the next poll of the adapter,
	/// waking the task currently waiting on it, if any. The error
	/// is reported exactly once.
	pub fn destroy_with(&mut self, error: S::Error) {
		self.destroy_inner(Some(LazySinkError::Sink(error)));
	}

	fn destroy_inner(
		&mut self,
		error: Option<LazySinkError<S::Error>>,
	) {
		if self.state.is_destroyed() {
			return;
		}

		self.state.shutdown_mut();
		settle(
			&mut self.queue,
			&mut self.close,
			&mut self.terminal,
			&mut self.waker,
			&mut self.observer,
			error,
		);
	}
}

impl<T, S, F, H, O> LazySink<T, S, F, H, O>
where
	S: Sink<T> + Teardown + Unpin,
	F: Future<Output = Result<S, S::Error>>,
	H: Future<Output = Result<(), S::Error>>,
	O: Observe,
{
	/// Send one final item, then close the adapter.
	///
	/// Equivalent to feeding `item` and then driving the close
	/// sequence to completion.
	pub fn end(&mut self, item: T) -> End<'_, Self, T>
	where
		Self: Unpin,
		T: Unpin,
	{
		End::new(self, item)
	}

	/// Outcome of a poll on a destroyed adapter.
	///
	/// The first poll after a failed teardown reports the recorded
	/// error, every later one reports success.
	fn take_terminal(
		self: Pin<&mut Self>,
	) -> Result<(), LazySinkError<S::Error>> {
		match self.project().terminal.take() {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	/// Forward queued items into the underlying sink until none is
	/// left in front of the close marker.
	///
	/// Resolves the factory first if needed. The factory may make
	/// progress under a cork, delivery may not.
	fn poll_forward(
		mut self: Pin<&mut Self>,
		cx: &mut Context,
	) -> Poll<Result<(), LazySinkError<S::Error>>> {
		loop {
			let mut this = self.as_mut().project();

			if !matches!(this.queue.front(), Some(Queued::Item(_))) {
				return Poll::Ready(Ok(()));
			}

			match this.state.as_mut().poll_resolve(cx) {
				Poll::Ready(Ok(())) => {},
				Poll::Ready(Err(e)) => {
					settle(
						this.queue,
						this.close,
						this.terminal,
						this.waker,
						this.observer,
						None,
					);
					return Poll::Ready(Err(LazySinkError::Init(e)));
				},
				Poll::Pending => {
					park(this.waker, cx);
					return Poll::Pending;
				},
			}

			if *this.corked > 0 {
				park(this.waker, cx);
				return Poll::Pending;
			}

			let mut sink = match this.state.as_mut().project() {
				StateProj::Resolved(sink) => sink,
				_ => return Poll::Ready(Ok(())),
			};

			match sink.as_mut().poll_ready(cx) {
				Poll::Ready(Ok(())) => {},
				Poll::Ready(Err(e)) => {
					this.state.shutdown();
					settle(
						this.queue,
						this.close,
						this.terminal,
						this.waker,
						this.observer,
						None,
					);
					return Poll::Ready(Err(LazySinkError::Sink(e)));
				},
				Poll::Pending => {
					park(this.waker, cx);
					return Poll::Pending;
				},
			}

			let item = match this.queue.pop_front() {
				Some(Queued::Item(item)) => item,
				_ => return Poll::Ready(Ok(())),
			};

			if let Err(e) = sink.as_mut().start_send(item) {
				this.state.shutdown();
				settle(
					this.queue,
					this.close,
					this.terminal,
					this.waker,
					this.observer,
					None,
				);
				return Poll::Ready(Err(LazySinkError::Sink(e)));
			}
		}
	}
}

impl<T, S, F, H, O> Sink<T> for LazySink<T, S, F, H, O>
where
	S: Sink<T> + Teardown + Unpin,
	F: Future<Output = Result<S, S::Error>>,
	H: Future<Output = Result<(), S::Error>>,
	O: Observe,
{
	type Error = LazySinkError<S::Error>;

	fn poll_ready(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		if self.is_destroyed() {
			return Poll::Ready(self.take_terminal());
		}

		if self.queue.len() < self.config.backpressure_threshold() {
			return Poll::Ready(Ok(()));
		}

		ready!(self.as_mut().poll_forward(cx))?;
		Poll::Ready(Ok(()))
	}

	fn start_send(
		self: Pin<&mut Self>,
		item: T,
	) -> Result<(), Self::Error> {
		let this = self.project();

		if this.state.is_destroyed() {
			return Ok(());
		}

		assert!(
			*this.close == CloseState::Idle,
			"start_send called after poll_close"
		);

		this.queue.push_back(Queued::Item(item));
		Ok(())
	}

	fn poll_flush(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		if self.is_destroyed() {
			return Poll::Ready(self.take_terminal());
		}

		ready!(self.as_mut().poll_forward(cx))?;

		let mut this = self.project();

		if let StateProj::Resolved(sink) =
			this.state.as_mut().project()
		{
			match sink.poll_flush(cx) {
				Poll::Ready(Ok(())) => {},
				Poll::Ready(Err(e)) => {
					this.state.shutdown();
					settle(
						this.queue,
						this.close,
						this.terminal,
						this.waker,
						this.observer,
						None,
					);
					return Poll::Ready(Err(LazySinkError::Sink(e)));
				},
				Poll::Pending => {
					park(this.waker, cx);
					return Poll::Pending;
				},
			}
		}

		Poll::Ready(Ok(()))
	}

	fn poll_close(
		mut self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		if self.is_destroyed() {
			return Poll::Ready(self.take_terminal());
		}

		if self.close == CloseState::Idle {
			let this = self.as_mut().project();
			this.queue.push_back(Queued::FlushRequest);
			*this.close = CloseState::Draining;
		}

		self.poll_terminate(cx)
	}
}

impl<T, S, F, H, O> Teardown for LazySink<T, S, F, H, O>
where
	S: Sink<T> + Teardown,
	O: Observe,
{
	fn teardown(&mut self) {
		self.destroy();
	}
}

impl<T, S, F, H, O> fmt::Debug for LazySink<T, S, F, H, O>
where
	S: Sink<T>,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LazySink")
			.field("state", &self.state)
			.field("queued", &self.queue.len())
			.field("config", &self.config)
			.field("corked", &self.corked)
			.field("close", &self.close)
			.finish_non_exhaustive()
	}
}

/// Terminal bookkeeping shared by every way the adapter can end.
///
/// Discards the queue, latches the close sequence, records the
/// error for a later poll and wakes whoever is parked on the
/// adapter.
fn settle<T, E, O>(
	queue: &mut VecDeque<Queued<T>>,
	close: &mut CloseState,
	terminal: &mut Option<LazySinkError<E>>,
	waker: &mut Option<Waker>,
	observer: &mut O,
	error: Option<LazySinkError<E>>,
) where
	O: Observe,
{
	queue.clear();
	*close = CloseState::Done;
	*terminal = error;
	observer.event(Event::Close);
	if let Some(waker) = waker.take() {
		waker.wake();
	}
}

/// Remember the caller so that `uncork()` or `destroy()` can get
/// the adapter polled again.
fn park(slot: &mut Option<Waker>, cx: &Context<'_>) {
	*slot = Some(cx.waker().clone());
}

#[cfg(test)]
mod tests {
	use super::*;

	use core::convert::Infallible;

	use alloc::vec::Vec;

	struct Null;

	impl<T> Sink<T> for Null {
		type Error = Infallible;

		fn poll_ready(
			self: Pin<&mut Self>,
			_: &mut Context<'_>,
		) -> Poll<Result<(), Self::Error>> {
			Poll::Ready(Ok(()))
		}

		fn start_send(
			self: Pin<&mut Self>,
			_: T,
		) -> Result<(), Self::Error> {
			Ok(())
		}

		fn poll_flush(
			self: Pin<&mut Self>,
			_: &mut Context<'_>,
		) -> Poll<Result<(), Self::Error>> {
			Poll::Ready(Ok(()))
		}

		fn poll_close(
			self: Pin<&mut Self>,
			_: &mut Context<'_>,
		) -> Poll<Result<(), Self::Error>> {
			Poll::Ready(Ok(()))
		}
	}

	impl Teardown for Null {}

	#[derive(Default)]
	struct Recorder(Vec<Event>);

	impl Observe for Recorder {
		fn event(&mut self, event: Event) {
			self.0.push(event);
		}
	}

	#[test]
	fn cork_events_fire_on_edges_only() {
		let mut sink = LazySink::<u8, _, _, _>::from_sink(Null)
			.with_observer(Recorder::default());

		sink.cork();
		sink.cork();
		assert_eq!(sink.cork_depth(), 2);

		sink.uncork();
		sink.uncork();
		sink.uncork();
		assert_eq!(sink.cork_depth(), 0);

		assert_eq!(sink.observer().0, [Event::Cork, Event::Uncork]);
	}

	#[test]
	fn destroy_is_idempotent() {
		let mut sink = LazySink::<u8, _, _, _>::from_sink(Null)
			.with_observer(Recorder::default());

		sink.destroy();
		sink.destroy();

		assert!(sink.is_destroyed());
		assert_eq!(sink.observer().0, [Event::Close]);
	}

	#[test]
	fn destroyed_adapter_drops_items() {
		let mut sink = LazySink::<u8, _, _, _>::from_sink(Null);

		sink.destroy();

		assert_eq!(Pin::new(&mut sink).start_send(1), Ok(()));
		assert!(sink.sink().is_none());
	}
}
