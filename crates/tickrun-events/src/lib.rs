#![forbid(unsafe_code)]

//! Event dispatch with coalescing delivery.
//!
//! Subscribers register a handler under a [`HandlerKey`] with an
//! [`EventQueueMode`] and receive an [`EventSink`] to hand to whatever
//! produces the event. Synchronous subscriptions run on fire; queued ones
//! run when the host calls [`EventDispatcher::flush`], after their mode's
//! coalescing rule has picked which fired events survive.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tickrun_events::{EventDispatcher, EventQueueMode, HandlerKey, SubscriberId};
//!
//! let events = EventDispatcher::new();
//! let last = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&last);
//! let key = HandlerKey::new(SubscriberId(1), "Counter::on_changed");
//! let sink = events.add(key, EventQueueMode::LatestOnly, move |value: u32| seen.set(value));
//!
//! sink.fire(1);
//! sink.fire(2);
//! events.flush();
//! assert_eq!(last.get(), 2);
//!
//! events.remove::<u32>(&key);
//! events.assert_empty();
//! ```

pub mod dispatcher;
pub mod error;
pub mod key;
pub mod mode;

pub use dispatcher::{DispatcherConfig, EventDispatcher, EventSink};
pub use error::EventError;
pub use key::{HandlerKey, SenderId, SubscriberId};
pub use mode::{EventQueueMode, FrameCounter, TickCounter};
