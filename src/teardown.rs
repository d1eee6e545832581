//! Immediate teardown of underlying sinks.

/// This trait allows a sink to release its resources immediately.
///
/// [`LazySink`] calls [`teardown()`] exactly once when it is
/// destroyed, whether by [`destroy()`], by an error, or by the
/// completion of a graceful close. After the call the sink is never
/// touched again and is dropped with the adapter.
///
/// The default implementation does nothing. That is correct for any
/// sink whose resources are released by its [`Drop`] impl.
///
/// [`LazySink`]: crate::LazySink
/// [`teardown()`]: Teardown::teardown
/// [`destroy()`]: crate::LazySink::destroy
pub trait Teardown {
	/// Release the resources held by this sink.
	///
	/// Implementations must tolerate any state the sink happens to
	/// be in, including mid-send.
	fn teardown(&mut self) {}
}

impl<T: Teardown + ?Sized> Teardown for &mut T {
	fn teardown(&mut self) {
		(**self).teardown();
	}
}

impl<T: Teardown + ?Sized> Teardown for alloc::boxed::Box<T> {
	fn teardown(&mut self) {
		(**self).teardown();
	}
}

#[cfg(feature = "futures")]
impl<T> Teardown for futures_channel::mpsc::Sender<T> {
	fn teardown(&mut self) {
		self.close_channel();
	}
}

#[cfg(feature = "futures")]
impl<T> Teardown for futures_channel::mpsc::UnboundedSender<T> {
	fn teardown(&mut self) {
		self.close_channel();
	}
}
