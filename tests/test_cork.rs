#![allow(missing_docs)]

mod common;

use std::pin::Pin;
use std::task::Context;

use futures::task::noop_waker_ref;
use futures::{Sink, SinkExt};

use lazy_sink::{Config, Event, LazySink};

use self::common::{mock, Recorder};

#[test]
fn test_cork_delays_delivery() {
	futures::executor::block_on(async {
		let (sink, handle) = mock::<u8>();
		let mut lazy = LazySink::from_sink(sink)
			.with_config(Config::for_items())
			.with_observer(Recorder::default());
		let mut cx = Context::from_waker(noop_waker_ref());

		lazy.cork();
		lazy.feed(1).await.unwrap();
		lazy.feed(2).await.unwrap();
		assert!(handle.items().is_empty());

		// A flush cannot get past the cork.
		assert!(Pin::new(&mut lazy).poll_flush(&mut cx).is_pending());
		assert!(handle.items().is_empty());

		lazy.uncork();
		lazy.flush().await.unwrap();

		assert_eq!(handle.items(), [1, 2]);
		assert_eq!(
			lazy.observer().events(),
			[Event::Cork, Event::Uncork]
		);
	});
}

#[test]
fn test_cork_uncork_before_writes_changes_nothing() {
	futures::executor::block_on(async {
		let (sink, handle) = mock::<u8>();
		let mut lazy = LazySink::from_sink(sink);

		lazy.cork();
		lazy.uncork();

		lazy.send(1).await.unwrap();
		lazy.send(2).await.unwrap();

		assert_eq!(handle.items(), [1, 2]);
	});
}

#[test]
fn test_nested_corks_all_must_release() {
	futures::executor::block_on(async {
		let (sink, handle) = mock::<u8>();
		let mut lazy = LazySink::from_sink(sink)
			.with_config(Config::for_items());
		let mut cx = Context::from_waker(noop_waker_ref());

		lazy.cork();
		lazy.cork();
		lazy.feed(1).await.unwrap();

		lazy.uncork();
		assert!(Pin::new(&mut lazy).poll_flush(&mut cx).is_pending());
		assert!(handle.items().is_empty());

		lazy.uncork();
		lazy.flush().await.unwrap();
		assert_eq!(handle.items(), [1]);
	});
}

#[test]
fn test_uncork_when_not_corked_is_a_noop() {
	let (sink, _handle) = mock::<u8>();
	let mut lazy =
		LazySink::from_sink(sink).with_observer(Recorder::default());

	lazy.uncork();

	assert_eq!(lazy.cork_depth(), 0);
	assert!(lazy.observer().events().is_empty());
}

#[test]
fn test_cork_gates_the_close_sequence() {
	futures::executor::block_on(async {
		let (sink, handle) = mock::<u8>();
		let mut lazy = LazySink::from_sink(sink)
			.with_config(Config::for_items())
			.with_observer(Recorder::default());
		let mut cx = Context::from_waker(noop_waker_ref());

		lazy.cork();
		lazy.feed(1).await.unwrap();

		// The queued item cannot drain, so the close stalls before
		// its first notification.
		assert!(Pin::new(&mut lazy).poll_close(&mut cx).is_pending());
		assert!(!handle.is_closed());
		assert_eq!(lazy.observer().events(), [Event::Cork]);

		lazy.uncork();
		lazy.close().await.unwrap();

		assert_eq!(handle.items(), [1]);
		assert!(handle.is_closed());
		assert_eq!(
			lazy.observer().events(),
			[
				Event::Cork,
				Event::Uncork,
				Event::Preend,
				Event::Prefinish,
				Event::Flush,
				Event::Close,
			]
		);
	});
}