//! Error types for `lazy-sink`.
use core::fmt::{self, Debug, Display};

trait Error: Debug + Display {}
impl<T: Debug + Display + ?Sized> Error for T {}

/// The error type returned by [`LazySink`](crate::LazySink).
///
/// All three kinds are terminal: whichever one occurs, the adapter
/// tears itself down and every later write is silently dropped. The
/// error is reported exactly once, through the operation that ran
/// into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LazySinkError<E> {
	/// The factory failed to produce the sink. The first operation
	/// that needed the sink receives this error; the flush hook
	/// never runs.
	Init(E),
	/// The resolved sink reported an error, either while accepting
	/// an item, while flushing, or while being closed.
	Sink(E),
	/// The flush hook reported an error. The underlying sink had
	/// already been closed successfully at this point.
	Flush(E),
}

impl<E> LazySinkError<E> {
	/// Get back the error reported by the collaborator.
	#[inline]
	pub fn into_inner(self) -> E {
		match self {
			Self::Init(e) => e,
			Self::Sink(e) => e,
			Self::Flush(e) => e,
		}
	}
}

impl<E: Error> Display for LazySinkError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		use LazySinkError as A;
		match self {
			A::Init(e) => write!(f, "{}", e),
			A::Sink(e) => write!(f, "{}", e),
			A::Flush(e) => write!(f, "{}", e),
		}
	}
}

#[cfg(feature = "std")]
impl<E: Error> std::error::Error for LazySinkError<E> {}
