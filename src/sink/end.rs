use core::future::Future;
use core::pin::Pin;
use core::task::{ready, Context, Poll};

use futures_sink::Sink;

/// Future for the [`end()`] method.
///
/// Sends one final item and then drives the sink's close to
/// completion.
///
/// [`end()`]: crate::LazySink::end
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` them"]
pub struct End<'a, Si, Item>
where
	Si: Sink<Item> + Unpin + ?Sized,
	Item: Unpin,
{
	sink: &'a mut Si,
	item: Option<Item>,
}

impl<'a, Si, Item> End<'a, Si, Item>
where
	Si: Sink<Item> + Unpin + ?Sized,
	Item: Unpin,
{
	pub(crate) fn new(sink: &'a mut Si, item: Item) -> Self {
		Self { sink, item: Some(item) }
	}
}

impl<'a, Si, Item> Future for End<'a, Si, Item>
where
	Si: Sink<Item> + Unpin + ?Sized,
	Item: Unpin,
{
	type Output = Result<(), Si::Error>;

	fn poll(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Self::Output> {
		let this = self.get_mut();
		let mut sink = Pin::new(&mut *this.sink);

		if this.item.is_some() {
			ready!(sink.as_mut().poll_ready(cx))?;

			// SAFETY: We checked this above.
			let item = this
				.item
				.take()
				.expect("item should not have been None");
			sink.as_mut().start_send(item)?;
		}

		sink.poll_close(cx)
	}
}
