use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{ready, Context, Poll};

use pin_project::pin_project;

use crate::teardown::Teardown;

/// Where the underlying sink currently lives.
///
/// The sink starts out as a factory future and is swapped in place
/// the first time the future completes. `Destroyed` is terminal, no
/// transition ever leaves it.
#[pin_project(project = StateProj)]
pub(crate) enum State<S, F> {
	Unresolved(#[pin] F),
	Resolved(#[pin] S),
	Destroyed,
}

impl<S, F> State<S, F> {
	pub(crate) fn is_destroyed(&self) -> bool {
		matches!(self, Self::Destroyed)
	}

	pub(crate) fn get(&self) -> Option<&S> {
		match self {
			Self::Resolved(sink) => Some(sink),
			_ => None,
		}
	}

	pub(crate) fn get_mut(&mut self) -> Option<&mut S> {
		match self {
			Self::Resolved(sink) => Some(sink),
			_ => None,
		}
	}

	pub(crate) fn into_sink(self) -> Option<S> {
		match self {
			Self::Resolved(sink) => Some(sink),
			_ => None,
		}
	}

	/// Drive the factory until the sink exists.
	///
	/// On factory error the state moves to `Destroyed` so that the
	/// spent future is never polled again.
	pub(crate) fn poll_resolve<E>(
		mut self: Pin<&mut Self>,
		cx: &mut Context,
	) -> Poll<Result<(), E>>
	where
		F: Future<Output = Result<S, E>>,
	{
		match self.as_mut().project() {
			StateProj::Unresolved(factory) => {
				match ready!(factory.poll(cx)) {
					Ok(sink) => {
						self.set(Self::Resolved(sink));
						Poll::Ready(Ok(()))
					},
					Err(e) => {
						self.set(Self::Destroyed);
						Poll::Ready(Err(e))
					},
				}
			},
			_ => Poll::Ready(Ok(())),
		}
	}
}

impl<S, F> State<S, F>
where
	S: Teardown,
{
	/// Tear down the sink, if there is one, and move to `Destroyed`.
	pub(crate) fn shutdown(mut self: Pin<&mut Self>)
	where
		S: Unpin,
	{
		if let StateProj::Resolved(sink) = self.as_mut().project() {
			sink.get_mut().teardown();
		}
		self.set(Self::Destroyed);
	}

	/// Unpinned variant of [`shutdown()`](State::shutdown).
	pub(crate) fn shutdown_mut(&mut self) {
		if let Self::Resolved(sink) = self {
			sink.teardown();
		}
		*self = Self::Destroyed;
	}
}

impl<S, F> fmt::Debug for State<S, F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Unresolved(_) => "Unresolved",
			Self::Resolved(_) => "Resolved",
			Self::Destroyed => "Destroyed",
		};
		f.write_str(name)
	}
}
