use core::future::Future;
use core::pin::Pin;
use core::task::{ready, Context, Poll};

use futures_sink::Sink;

use crate::error::LazySinkError;
use crate::event::{Event, Observe};
use crate::teardown::Teardown;

use super::resolve::StateProj;
use super::{park, settle, LazySink, Queued};

/// Progress of the graceful close sequence.
///
/// Advances strictly left to right. Each notification fires on the
/// transition out of its phase, so none can fire twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseState {
	Idle,
	Draining,
	Ending,
	Prefinished,
	Flushing,
	Done,
}

impl<T, S, F, H, O> LazySink<T, S, F, H, O>
where
	S: Sink<T> + Teardown + Unpin,
	F: Future<Output = Result<S, S::Error>>,
	H: Future<Output = Result<(), S::Error>>,
	O: Observe,
{
	/// Drive the close sequence to completion.
	///
	/// Expects the close marker to have been queued already. A cork
	/// gates the transitions out of `Ending` and `Prefinished`, not
	/// the notifications before them.
	pub(crate) fn poll_terminate(
		mut self: Pin<&mut Self>,
		cx: &mut Context,
	) -> Poll<Result<(), LazySinkError<S::Error>>> {
		loop {
			match self.close {
				CloseState::Idle | CloseState::Done => {
					return Poll::Ready(Ok(()))
				},
				CloseState::Draining => {
					ready!(self.as_mut().poll_forward(cx))?;

					let this = self.as_mut().project();
					let front = this.queue.pop_front();
					debug_assert!(
						matches!(front, Some(Queued::FlushRequest)),
						"drain must stop at the close marker"
					);
					this.observer.event(Event::Preend);
					*this.close = CloseState::Ending;
				},
				CloseState::Ending => {
					let mut this = self.as_mut().project();

					if *this.corked > 0 {
						park(this.waker, cx);
						return Poll::Pending;
					}

					if let StateProj::Resolved(sink) =
						this.state.as_mut().project()
					{
						match sink.poll_close(cx) {
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
								return Poll::Ready(Err(
									LazySinkError::Sink(e),
								));
							},
							Poll::Pending => {
								park(this.waker, cx);
								return Poll::Pending;
							},
						}
					}

					this.observer.event(Event::Prefinish);
					*this.close = CloseState::Prefinished;
				},
				CloseState::Prefinished => {
					let this = self.as_mut().project();

					if *this.corked > 0 {
						park(this.waker, cx);
						return Poll::Pending;
					}

					this.observer.event(Event::Flush);
					*this.close = CloseState::Flushing;
				},
				CloseState::Flushing => {
					let this = self.as_mut().project();

					match this.flush.poll(cx) {
						Poll::Ready(Ok(())) => {
							this.state.shutdown();
							settle(
								this.queue,
								this.close,
								this.terminal,
								this.waker,
								this.observer,
								None,
							);
							return Poll::Ready(Ok(()));
						},
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
							return Poll::Ready(Err(
								LazySinkError::Flush(e),
							));
						},
						Poll::Pending => {
							park(this.waker, cx);
							return Poll::Pending;
						},
					}
				},
			}
		}
	}
}
