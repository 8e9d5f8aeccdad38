#![forbid(unsafe_code)]

//! Event dispatcher with per-subscription delivery policies.
//!
//! # Design
//!
//! Every logical subscription is one registration in a table keyed by
//! [`HandlerKey`]. Adding the same key again only bumps a usage count;
//! removing it drops the count, and the registration disappears once the
//! count reaches zero. Firing goes through an [`EventSink`] (or
//! [`EventDispatcher::trigger`]): synchronous registrations run the handler
//! on the spot, every other mode appends a queue entry that waits for
//! [`flush`](EventDispatcher::flush).
//!
//! A flush takes the entries that are due, applies each registration's
//! coalescing rule and delivers the survivors in fire order.
//!
//! # Invariants
//!
//! 1. A registration has exactly one mode and one argument type for its
//!    whole lifetime.
//! 2. Once a registration is removed, none of its queued entries is ever
//!    delivered, including entries taken into a flush that is in progress.
//! 3. `LatestOnly` and `FirstOnly` registrations receive at most one entry
//!    per flush.
//! 4. Next-frame entries are delivered only by a flush whose frame count is
//!    greater than the count at fire time.
//! 5. No internal borrow is held while a handler runs, so handlers may add,
//!    remove, fire and flush freely.
//!
//! # Failure Modes
//!
//! - **Handler panics**: the panic propagates out of `fire` or `flush`.
//!   Entries of the interrupted flush that were not delivered yet are lost.
//! - **Misuse** (mixing modes or argument types on one key, removing an
//!   unknown key, a next-frame mode without a frame counter): panics.

use std::any::{Any, TypeId, type_name};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::rc::{Rc, Weak};

use ahash::{AHashMap, AHashSet};
use tracing::{debug, trace, warn};

use crate::error::EventError;
use crate::key::HandlerKey;
use crate::mode::{EventQueueMode, FrameCounter};

type Callback = Rc<dyn Fn(Box<dyn Any>)>;

/// Dispatcher configuration.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Panic when an event is fired for a key with no registration,
    /// instead of logging a warning and dropping it.
    pub strict_unknown_fire: bool,
}

impl DispatcherConfig {
    #[must_use]
    pub fn with_strict_unknown_fire(mut self, strict: bool) -> Self {
        self.strict_unknown_fire = strict;
        self
    }
}

struct HandlerInfo {
    /// Registration order, used to order diagnostics.
    serial: u64,
    key: HandlerKey,
    mode: EventQueueMode,
    usage_count: Cell<u32>,
    one_off: bool,
    arg_type: TypeId,
    arg_type_name: &'static str,
    callback: Callback,
}

struct QueueEntry {
    info: Rc<HandlerInfo>,
    args: Box<dyn Any>,
    frame: u64,
}

#[derive(Default)]
struct DispatcherState {
    handlers: AHashMap<HandlerKey, Rc<HandlerInfo>>,
    queue: Vec<QueueEntry>,
    frame_counter: Option<Rc<dyn FrameCounter>>,
    config: DispatcherConfig,
    next_serial: u64,
}

impl DispatcherState {
    fn current_frame(&self) -> u64 {
        self.frame_counter
            .as_ref()
            .map_or(0, |counter| counter.frame_count())
    }

    fn is_current(&self, info: &Rc<HandlerInfo>) -> bool {
        self.handlers
            .get(&info.key)
            .is_some_and(|registered| Rc::ptr_eq(registered, info))
    }

    fn insert(
        &mut self,
        key: HandlerKey,
        mode: EventQueueMode,
        one_off: bool,
        arg_type: TypeId,
        arg_type_name: &'static str,
        callback: Callback,
    ) {
        assert!(
            !mode.is_next_frame() || self.frame_counter.is_some(),
            "{mode:?} used for '{key}' but the dispatcher has no frame counter"
        );
        let serial = self.next_serial;
        self.next_serial += 1;
        self.handlers.insert(
            key,
            Rc::new(HandlerInfo {
                serial,
                key,
                mode,
                usage_count: Cell::new(1),
                one_off,
                arg_type,
                arg_type_name,
                callback,
            }),
        );
    }
}

/// Typed publish/subscribe registry with coalescing delivery.
///
/// Cloning an `EventDispatcher` creates a new handle to the same registry.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    state: Rc<RefCell<DispatcherState>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        let dispatcher = Self::new();
        dispatcher.state.borrow_mut().config = config;
        dispatcher
    }

    /// Use `counter` as the frame source for next-frame modes.
    #[must_use]
    pub fn with_frame_counter(self, counter: impl FrameCounter + 'static) -> Self {
        self.state.borrow_mut().frame_counter = Some(Rc::new(counter));
        self
    }

    /// Subscribe `handler` under `key`.
    ///
    /// `A` is the argument type; use a tuple for several arguments and `()`
    /// for none. If `key` is already registered the existing registration
    /// is reused, its usage count is incremented and `handler` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `key` is registered with a different mode or argument type,
    /// or if `mode` is a next-frame mode and no frame counter is set.
    pub fn add<A: 'static>(
        &self,
        key: HandlerKey,
        mode: EventQueueMode,
        handler: impl Fn(A) + 'static,
    ) -> EventSink<A> {
        let mut state = self.state.borrow_mut();
        if let Some(existing) = state.handlers.get(&key) {
            assert_eq!(
                existing.mode, mode,
                "cannot use the same event handler '{key}' with different queue modes"
            );
            assert_eq!(
                existing.arg_type,
                TypeId::of::<A>(),
                "'{key}' is registered with arguments `{}`, not `{}`",
                existing.arg_type_name,
                type_name::<A>()
            );
            existing.usage_count.set(existing.usage_count.get() + 1);
            debug!(key = %key, usage = existing.usage_count.get(), "subscription reused");
        } else {
            let callback: Callback = Rc::new(move |args: Box<dyn Any>| match args.downcast::<A>() {
                Ok(args) => handler(*args),
                Err(_) => unreachable!("argument type is checked when the event is fired"),
            });
            state.insert(key, mode, false, TypeId::of::<A>(), type_name::<A>(), callback);
            debug!(key = %key, mode = ?mode, "subscription added");
        }
        drop(state);
        self.sink(key)
    }

    /// Drop one usage of the subscription under `key`.
    ///
    /// When the last usage goes, the registration is removed together with
    /// every entry still queued for it.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not registered or was registered with a different
    /// argument type.
    pub fn remove<A: 'static>(&self, key: &HandlerKey) -> EventSink<A> {
        let mut state = self.state.borrow_mut();
        let Some(info) = state.handlers.get(key).cloned() else {
            panic!("tried to remove unknown event handler '{key}'");
        };
        assert_eq!(
            info.arg_type,
            TypeId::of::<A>(),
            "'{key}' is registered with arguments `{}`, not `{}`",
            info.arg_type_name,
            type_name::<A>()
        );

        let usage = info.usage_count.get() - 1;
        info.usage_count.set(usage);
        if usage == 0 {
            state.handlers.remove(key);
            let before = state.queue.len();
            state.queue.retain(|entry| !Rc::ptr_eq(&entry.info, &info));
            debug!(
                key = %key,
                purged = before - state.queue.len(),
                "subscription removed"
            );
        } else {
            debug!(key = %key, usage, "subscription released");
        }
        drop(state);
        self.sink(*key)
    }

    /// Fire the subscription under `key` directly, as its sink would.
    pub fn trigger<A: 'static>(&self, key: &HandlerKey, args: A) {
        self.on_fired(key, Box::new(args), TypeId::of::<A>(), type_name::<A>());
    }

    /// Register `handler` to run once on the next flush.
    ///
    /// Does nothing if `key` is already registered.
    pub fn trigger_one_off_next_flush(&self, key: HandlerKey, handler: impl FnOnce() + 'static) {
        self.trigger_one_off(key, EventQueueMode::All, handler);
    }

    /// Register `handler` to run once on the first flush of a later frame.
    ///
    /// Does nothing if `key` is already registered.
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has no frame counter.
    pub fn trigger_one_off_next_frame(&self, key: HandlerKey, handler: impl FnOnce() + 'static) {
        self.trigger_one_off(key, EventQueueMode::AllNextFrame, handler);
    }

    fn trigger_one_off(&self, key: HandlerKey, mode: EventQueueMode, handler: impl FnOnce() + 'static) {
        {
            let mut state = self.state.borrow_mut();
            if state.handlers.contains_key(&key) {
                trace!(key = %key, "one-off already queued");
                return;
            }
            let slot = Cell::new(Some(handler));
            let callback: Callback = Rc::new(move |_args: Box<dyn Any>| {
                if let Some(handler) = slot.take() {
                    handler();
                }
            });
            state.insert(key, mode, true, TypeId::of::<()>(), type_name::<()>(), callback);
        }
        self.trigger(&key, ());
    }

    /// Deliver everything that is due.
    ///
    /// Entries of next-frame registrations fired in the current frame stay
    /// queued. The rest are coalesced per registration and handed to their
    /// handlers in fire order.
    ///
    /// # Panics
    ///
    /// Panics if a one-off registration has more than one entry to deliver.
    pub fn flush(&self) {
        let due = {
            let mut state = self.state.borrow_mut();
            if state.queue.is_empty() {
                return;
            }
            let frame = state.current_frame();
            let (due, deferred): (Vec<_>, Vec<_>) = mem::take(&mut state.queue)
                .into_iter()
                .partition(|entry| !entry.info.mode.is_next_frame() || entry.frame < frame);
            state.queue = deferred;
            trace!(
                due = due.len(),
                deferred = state.queue.len(),
                frame,
                "flushing events"
            );
            due
        };

        for entry in coalesce(due) {
            let deliver = {
                let mut state = self.state.borrow_mut();
                let current = state.is_current(&entry.info);
                if current && entry.info.one_off {
                    state.handlers.remove(&entry.info.key);
                }
                current
            };
            if deliver {
                (entry.info.callback)(entry.args);
            } else {
                trace!(key = %entry.info.key, "skipping event for removed subscription");
            }
        }
    }

    /// Number of live registrations.
    #[must_use]
    pub fn num_listeners(&self) -> usize {
        self.state.borrow().handlers.len()
    }

    /// Number of entries waiting for a flush.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.state.borrow().queue.len()
    }

    #[must_use]
    pub fn is_registered(&self, key: &HandlerKey) -> bool {
        self.state.borrow().handlers.contains_key(key)
    }

    /// Check that no subscriptions are left.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Leaked`] naming every remaining registration,
    /// oldest first.
    pub fn check_empty(&self) -> Result<(), EventError> {
        let state = self.state.borrow();
        if state.handlers.is_empty() {
            return Ok(());
        }
        let mut leaked: Vec<_> = state.handlers.values().collect();
        leaked.sort_by_key(|info| info.serial);
        Err(EventError::Leaked {
            count: leaked.len(),
            keys: leaked.iter().map(|info| info.key.to_string()).collect(),
        })
    }

    /// Teardown check.
    ///
    /// # Panics
    ///
    /// Panics with the [`EventError::Leaked`] message if any subscription is
    /// still registered.
    pub fn assert_empty(&self) {
        if let Err(err) = self.check_empty() {
            panic!("{err}");
        }
    }

    fn sink<A>(&self, key: HandlerKey) -> EventSink<A> {
        EventSink {
            dispatcher: Rc::downgrade(&self.state),
            key,
            _args: PhantomData,
        }
    }

    fn on_fired(&self, key: &HandlerKey, args: Box<dyn Any>, arg_type: TypeId, arg_type_name: &str) {
        let mut state = self.state.borrow_mut();
        let Some(info) = state.handlers.get(key).cloned() else {
            assert!(
                !state.config.strict_unknown_fire,
                "received event for unrecognized handler '{key}'"
            );
            warn!(key = %key, "event fired for unregistered handler, dropping it");
            return;
        };
        assert!(
            info.arg_type == arg_type,
            "'{key}' expects arguments `{}`, got `{arg_type_name}`",
            info.arg_type_name
        );

        if info.mode.is_queued() {
            let frame = state.current_frame();
            state.queue.push(QueueEntry { info, args, frame });
            trace!(key = %key, queued = state.queue.len(), "event queued");
        } else {
            drop(state);
            (info.callback)(args);
        }
    }
}

/// Drop entries according to each registration's coalescing rule,
/// keeping the survivors in fire order.
fn coalesce(entries: Vec<QueueEntry>) -> Vec<QueueEntry> {
    let mut keep = vec![true; entries.len()];
    let mut seen_first = AHashSet::new();
    let mut seen_last = AHashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.info.mode.coalescing() == EventQueueMode::FirstOnly
            && !seen_first.insert(entry.info.serial)
        {
            keep[index] = false;
        }
    }
    for (index, entry) in entries.iter().enumerate().rev() {
        if entry.info.mode.coalescing() == EventQueueMode::LatestOnly
            && !seen_last.insert(entry.info.serial)
        {
            keep[index] = false;
        }
    }

    let survivors: Vec<_> = entries
        .into_iter()
        .zip(keep)
        .filter_map(|(entry, keep)| keep.then_some(entry))
        .collect();

    let mut one_offs = AHashSet::new();
    for entry in survivors.iter().filter(|entry| entry.info.one_off) {
        assert!(
            one_offs.insert(entry.info.serial),
            "one-off event '{}' was queued more than once",
            entry.info.key
        );
    }
    survivors
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventDispatcher")
            .field("listeners", &state.handlers.len())
            .field("queued", &state.queue.len())
            .field("config", &state.config)
            .finish()
    }
}

/// The firing side of a subscription.
///
/// Hand a sink to whatever produces the event. It holds the dispatcher
/// weakly; firing after the dispatcher is gone does nothing.
pub struct EventSink<A> {
    dispatcher: Weak<RefCell<DispatcherState>>,
    key: HandlerKey,
    _args: PhantomData<fn(A)>,
}

impl<A: 'static> EventSink<A> {
    /// Fire the event with `args`.
    pub fn fire(&self, args: A) {
        match self.dispatcher.upgrade() {
            Some(state) => EventDispatcher { state }.trigger(&self.key, args),
            None => trace!(key = %self.key, "event fired after dispatcher was dropped"),
        }
    }

    #[must_use]
    pub fn key(&self) -> &HandlerKey {
        &self.key
    }
}

impl<A> Clone for EventSink<A> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Weak::clone(&self.dispatcher),
            key: self.key,
            _args: PhantomData,
        }
    }
}

impl<A> PartialEq for EventSink<A> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Weak::ptr_eq(&self.dispatcher, &other.dispatcher)
    }
}

impl<A> Eq for EventSink<A> {}

impl<A> fmt::Debug for EventSink<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("key", &self.key)
            .field("args", &type_name::<A>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{SenderId, SubscriberId};
    use crate::mode::TickCounter;
    use tracing_test::traced_test;

    fn key(handler: &'static str) -> HandlerKey {
        HandlerKey::new(SubscriberId(1), handler)
    }

    fn recorder<A: 'static>() -> (Rc<RefCell<Vec<A>>>, impl Fn(A) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |args| sink.borrow_mut().push(args))
    }

    #[test]
    fn synchronous_delivers_immediately() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<u32>();
        let sink = events.add(key("sync"), EventQueueMode::Synchronous, handler);
        sink.fire(5);
        assert_eq!(*log.borrow(), vec![5]);
        assert_eq!(events.queued_len(), 0);
    }

    #[test]
    fn queued_modes_wait_for_flush() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<u32>();
        let sink = events.add(key("all"), EventQueueMode::All, handler);
        sink.fire(1);
        sink.fire(2);
        assert!(log.borrow().is_empty());
        assert_eq!(events.queued_len(), 2);
        events.flush();
        assert_eq!(*log.borrow(), vec![1, 2]);
        assert_eq!(events.queued_len(), 0);
    }

    #[test]
    fn latest_and_first_only_keep_one() {
        let events = EventDispatcher::new();
        let (latest, latest_handler) = recorder::<&str>();
        let (first, first_handler) = recorder::<&str>();
        let l = events.add(key("latest"), EventQueueMode::LatestOnly, latest_handler);
        let f = events.add(key("first"), EventQueueMode::FirstOnly, first_handler);
        for word in ["a", "b", "c"] {
            l.fire(word);
            f.fire(word);
        }
        events.flush();
        assert_eq!(*latest.borrow(), vec!["c"]);
        assert_eq!(*first.borrow(), vec!["a"]);
    }

    #[test]
    fn repeated_add_counts_usages() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<()>();
        let first = events.add(key("shared"), EventQueueMode::All, handler);
        let second = events.add(key("shared"), EventQueueMode::All, |(): ()| {});
        assert_eq!(first, second);
        assert_eq!(events.num_listeners(), 1);

        second.fire(());
        events.remove::<()>(&key("shared"));
        assert!(events.is_registered(&key("shared")));
        events.flush();
        // The first handler stays in charge of the registration.
        assert_eq!(log.borrow().len(), 1);

        events.remove::<()>(&key("shared"));
        assert!(events.check_empty().is_ok());
    }

    #[test]
    #[should_panic(expected = "different queue modes")]
    fn mixing_modes_panics() {
        let events = EventDispatcher::new();
        events.add(key("mixed"), EventQueueMode::All, |_: u8| {});
        events.add(key("mixed"), EventQueueMode::LatestOnly, |_: u8| {});
    }

    #[test]
    #[should_panic(expected = "unknown event handler")]
    fn removing_unknown_key_panics() {
        EventDispatcher::new().remove::<()>(&key("ghost"));
    }

    #[test]
    #[should_panic(expected = "expects arguments")]
    fn firing_with_wrong_type_panics() {
        let events = EventDispatcher::new();
        events.add(key("typed"), EventQueueMode::All, |_: u8| {});
        events.trigger(&key("typed"), "text");
    }

    #[test]
    #[traced_test]
    fn unknown_fire_is_logged_when_lenient() {
        let events = EventDispatcher::new();
        events.trigger(&key("nobody"), 1u8);
        assert!(logs_contain("unregistered handler"));
    }

    #[test]
    #[should_panic(expected = "unrecognized handler")]
    fn unknown_fire_panics_when_strict() {
        let events =
            EventDispatcher::with_config(DispatcherConfig::default().with_strict_unknown_fire(true));
        events.trigger(&key("nobody"), 1u8);
    }

    #[test]
    fn sender_scoped_keys_are_separate_registrations() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<u64>();
        let from_one = events.add(
            key("moved").with_sender(SenderId(1)),
            EventQueueMode::Synchronous,
            handler,
        );
        let (other_log, other_handler) = recorder::<u64>();
        events.add(
            key("moved").with_sender(SenderId(2)),
            EventQueueMode::Synchronous,
            other_handler,
        );
        from_one.fire(10);
        assert_eq!(*log.borrow(), vec![10]);
        assert!(other_log.borrow().is_empty());
        assert_eq!(events.num_listeners(), 2);
    }

    #[test]
    fn handler_removed_during_flush_misses_later_entries() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<u8>();
        let victim = events.add(key("victim"), EventQueueMode::All, handler);

        let remover = events.clone();
        let killer = events.add(key("killer"), EventQueueMode::All, move |(): ()| {
            remover.remove::<u8>(&key("victim"));
        });

        victim.fire(1);
        killer.fire(());
        victim.fire(2);
        events.flush();
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn events_fired_during_flush_wait_for_next_flush() {
        let events = EventDispatcher::new();
        let (log, handler) = recorder::<u8>();
        let echo = events.add(key("echo"), EventQueueMode::All, handler);
        let refire = echo.clone();
        let chain = events.add(key("chain"), EventQueueMode::All, move |n: u8| refire.fire(n));

        chain.fire(3);
        events.flush();
        assert!(log.borrow().is_empty());
        assert_eq!(events.queued_len(), 1);
        events.flush();
        assert_eq!(*log.borrow(), vec![3]);
    }

    #[test]
    fn next_frame_modes_skip_current_frame() {
        let frames = TickCounter::new();
        let events = EventDispatcher::new().with_frame_counter(frames.clone());
        let (log, handler) = recorder::<u8>();
        let sink = events.add(key("later"), EventQueueMode::LatestOnlyNextFrame, handler);

        sink.fire(1);
        sink.fire(2);
        events.flush();
        assert!(log.borrow().is_empty());

        frames.advance();
        sink.fire(3);
        events.flush();
        // Entries from frame 0 are due; the one fired in frame 1 waits.
        assert_eq!(*log.borrow(), vec![2]);
        assert_eq!(events.queued_len(), 1);

        frames.advance();
        events.flush();
        assert_eq!(*log.borrow(), vec![2, 3]);
    }

    #[test]
    #[should_panic(expected = "no frame counter")]
    fn next_frame_mode_requires_frame_counter() {
        EventDispatcher::new().add(key("later"), EventQueueMode::AllNextFrame, |_: u8| {});
    }

    #[test]
    fn one_off_runs_once_and_unregisters() {
        let events = EventDispatcher::new();
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        events.trigger_one_off_next_flush(key("once"), move || counter.set(counter.get() + 1));
        // Already queued: the second closure is dropped unused.
        events.trigger_one_off_next_flush(key("once"), || panic!("must not run"));
        assert_eq!(events.num_listeners(), 1);

        events.flush();
        events.flush();
        assert_eq!(runs.get(), 1);
        assert_eq!(events.num_listeners(), 0);
    }

    #[test]
    fn one_off_next_frame_waits_a_frame() {
        let frames = TickCounter::new();
        let events = EventDispatcher::new().with_frame_counter(frames.clone());
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        events.trigger_one_off_next_frame(key("soon"), move || flag.set(true));

        events.flush();
        assert!(!ran.get());
        frames.advance();
        events.flush();
        assert!(ran.get());
        events.assert_empty();
    }

    #[test]
    #[should_panic(expected = "queued more than once")]
    fn one_off_fired_twice_is_a_bug() {
        let events = EventDispatcher::new();
        events.trigger_one_off_next_flush(key("once"), || {});
        events.trigger(&key("once"), ());
        events.flush();
    }

    #[test]
    fn check_empty_lists_leaks_in_registration_order() {
        let events = EventDispatcher::new();
        events.add(key("b_handler"), EventQueueMode::All, |_: ()| {});
        events.add(
            HandlerKey::new(SubscriberId(7), "a_handler"),
            EventQueueMode::Synchronous,
            |_: ()| {},
        );
        let err = events.check_empty().unwrap_err();
        assert_eq!(
            err,
            EventError::Leaked {
                count: 2,
                keys: vec![
                    "b_handler (subscriber 1)".to_string(),
                    "a_handler (subscriber 7)".to_string(),
                ],
            }
        );
        assert!(err.to_string().starts_with("Found 2 events still registered"));
    }

    #[test]
    fn sink_outliving_dispatcher_is_inert() {
        let events = EventDispatcher::new();
        let sink = events.add(key("orphan"), EventQueueMode::Synchronous, |_: u8| {
            panic!("dispatcher is gone")
        });
        drop(events);
        sink.fire(1);
    }
}
