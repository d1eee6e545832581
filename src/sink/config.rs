use core::fmt;
use core::num::NonZeroUsize;

/// Configuration for [`LazySink`].
///
/// [`LazySink`]: crate::LazySink
#[derive(Clone)]
#[must_use = "`Config`s don't do anything on their own"]
pub struct Config {
	pub(crate) backpressure_threshold: NonZeroUsize,
}

impl Default for Config {
	#[inline]
	fn default() -> Self {
		Self { backpressure_threshold: NonZeroUsize::MIN }
	}
}

impl Config {
	/// Create a configuration suited to streams of many small
	/// discrete items.
	///
	/// Equivalent to the default configuration with a backpressure
	/// threshold of 16.
	#[inline]
	pub fn for_items() -> Self {
		Self::default().with_backpressure_threshold(16)
	}

	/// Get the number of items the adapter will queue before it
	/// reports backpressure.
	#[inline]
	#[must_use]
	pub fn backpressure_threshold(&self) -> usize {
		self.backpressure_threshold.get()
	}

	/// Set the number of items the adapter will queue before it
	/// reports backpressure.
	///
	/// A `threshold` of 0 is treated as 1.
	#[inline]
	pub fn set_backpressure_threshold(
		&mut self,
		threshold: usize,
	) -> &mut Self {
		self.backpressure_threshold = NonZeroUsize::new(threshold)
			.unwrap_or(NonZeroUsize::MIN);
		self
	}

	/// Set the number of items the adapter will queue before it
	/// reports backpressure.
	///
	/// A `threshold` of 0 is treated as 1.
	#[inline]
	pub fn with_backpressure_threshold(
		mut self,
		threshold: usize,
	) -> Self {
		self.set_backpressure_threshold(threshold);
		self
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field(
				"backpressure_threshold",
				&self.backpressure_threshold(),
			)
			.finish()
	}
}
