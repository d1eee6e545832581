#![allow(dead_code)]

use std::cell::RefCell;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use futures::Sink;

use lazy_sink::{Event, Observe, Teardown};

struct Shared<T> {
	items: Vec<T>,
	flushes: usize,
	closed: bool,
	teardowns: usize,
	ready: bool,
	waker: Option<Waker>,
	fail_send: Option<String>,
	fail_close: Option<String>,
}

impl<T> Default for Shared<T> {
	fn default() -> Self {
		Self {
			items: Vec::new(),
			flushes: 0,
			closed: false,
			teardowns: 0,
			ready: true,
			waker: None,
			fail_send: None,
			fail_close: None,
		}
	}
}

/// In-memory sink that records everything done to it.
///
/// Its [`Handle`] shares the recorded state with the test body.
pub struct MockSink<T> {
	shared: Rc<RefCell<Shared<T>>>,
}

/// Test-side view of a [`MockSink`].
pub struct Handle<T> {
	shared: Rc<RefCell<Shared<T>>>,
}

pub fn mock<T>() -> (MockSink<T>, Handle<T>) {
	let shared = Rc::new(RefCell::new(Shared::default()));
	(MockSink { shared: Rc::clone(&shared) }, Handle { shared })
}

impl<T> Clone for Handle<T> {
	fn clone(&self) -> Self {
		Self { shared: Rc::clone(&self.shared) }
	}
}

impl<T> Handle<T> {
	pub fn items(&self) -> Vec<T>
	where
		T: Clone,
	{
		self.shared.borrow().items.clone()
	}

	pub fn flushes(&self) -> usize {
		self.shared.borrow().flushes
	}

	pub fn is_closed(&self) -> bool {
		self.shared.borrow().closed
	}

	pub fn teardowns(&self) -> usize {
		self.shared.borrow().teardowns
	}

	/// Gate the sink's readiness. Turning it back on wakes the task
	/// parked on the last `poll_ready`.
	pub fn set_ready(&self, ready: bool) {
		let waker = {
			let mut shared = self.shared.borrow_mut();
			shared.ready = ready;
			if ready {
				shared.waker.take()
			} else {
				None
			}
		};

		if let Some(waker) = waker {
			waker.wake();
		}
	}

	pub fn fail_next_send(&self, msg: &str) {
		self.shared.borrow_mut().fail_send = Some(msg.to_owned());
	}

	pub fn fail_close(&self, msg: &str) {
		self.shared.borrow_mut().fail_close = Some(msg.to_owned());
	}
}

impl<T> Sink<T> for MockSink<T> {
	type Error = String;

	fn poll_ready(
		self: Pin<&mut Self>,
		cx: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		let mut shared = self.shared.borrow_mut();

		if shared.ready {
			Poll::Ready(Ok(()))
		} else {
			shared.waker = Some(cx.waker().clone());
			Poll::Pending
		}
	}

	fn start_send(
		self: Pin<&mut Self>,
		item: T,
	) -> Result<(), Self::Error> {
		let mut shared = self.shared.borrow_mut();

		if let Some(e) = shared.fail_send.take() {
			return Err(e);
		}

		shared.items.push(item);
		Ok(())
	}

	fn poll_flush(
		self: Pin<&mut Self>,
		_: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		self.shared.borrow_mut().flushes += 1;
		Poll::Ready(Ok(()))
	}

	fn poll_close(
		self: Pin<&mut Self>,
		_: &mut Context<'_>,
	) -> Poll<Result<(), Self::Error>> {
		let mut shared = self.shared.borrow_mut();

		if let Some(e) = shared.fail_close.take() {
			return Poll::Ready(Err(e));
		}

		shared.closed = true;
		Poll::Ready(Ok(()))
	}
}

impl<T> Teardown for MockSink<T> {
	fn teardown(&mut self) {
		self.shared.borrow_mut().teardowns += 1;
	}
}

/// Observer that remembers every event in order.
#[derive(Debug, Default)]
pub struct Recorder {
	events: Vec<Event>,
}

impl Recorder {
	pub fn events(&self) -> &[Event] {
		&self.events
	}
}

impl Observe for Recorder {
	fn event(&mut self, event: Event) {
		self.events.push(event);
	}
}
