#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tickrun_events::{EventDispatcher, EventQueueMode, HandlerKey, SubscriberId, TickCounter};

const MODES: [EventQueueMode; 7] = [
    EventQueueMode::Synchronous,
    EventQueueMode::All,
    EventQueueMode::LatestOnly,
    EventQueueMode::FirstOnly,
    EventQueueMode::AllNextFrame,
    EventQueueMode::LatestOnlyNextFrame,
    EventQueueMode::FirstOnlyNextFrame,
];

const NAMES: [&str; 7] = ["s0", "s1", "s2", "s3", "s4", "s5", "s6"];

#[derive(Arbitrary, Debug)]
enum Op {
    Add(u8),
    Remove(u8),
    Fire(u8, u16),
    Flush,
    NextFrame,
}

struct Slot {
    key: HandlerKey,
    usages: u32,
    /// Whether the registration is live; the handler checks it.
    alive: Rc<Cell<bool>>,
    delivered: Rc<Cell<u32>>,
}

fuzz_target!(|ops: Vec<Op>| {
    let frames = TickCounter::new();
    let events = EventDispatcher::new().with_frame_counter(frames.clone());
    let mut slots: Vec<Slot> = NAMES
        .iter()
        .map(|name| Slot {
            key: HandlerKey::new(SubscriberId(1), *name),
            usages: 0,
            alive: Rc::new(Cell::new(false)),
            delivered: Rc::new(Cell::new(0)),
        })
        .collect();

    for op in ops.into_iter().take(512) {
        match op {
            Op::Add(i) => {
                let i = usize::from(i) % MODES.len();
                let slot = &mut slots[i];
                let alive = Rc::clone(&slot.alive);
                let delivered = Rc::clone(&slot.delivered);
                events.add(slot.key, MODES[i], move |_: u16| {
                    assert!(alive.get(), "delivered to a removed subscription");
                    delivered.set(delivered.get() + 1);
                });
                slot.usages += 1;
                slot.alive.set(true);
            }
            Op::Remove(i) => {
                let slot = &mut slots[usize::from(i) % MODES.len()];
                if slot.usages > 0 {
                    events.remove::<u16>(&slot.key);
                    slot.usages -= 1;
                    slot.alive.set(slot.usages > 0);
                }
            }
            Op::Fire(i, value) => {
                let slot = &slots[usize::from(i) % MODES.len()];
                if slot.usages > 0 {
                    events.trigger(&slot.key, value);
                }
            }
            Op::Flush => {
                for slot in &slots {
                    slot.delivered.set(0);
                }
                events.flush();
                for (i, slot) in slots.iter().enumerate() {
                    let coalescing = MODES[i].coalescing();
                    if coalescing == EventQueueMode::LatestOnly
                        || coalescing == EventQueueMode::FirstOnly
                    {
                        assert!(slot.delivered.get() <= 1);
                    }
                }
            }
            Op::NextFrame => frames.advance(),
        }
    }

    let live = slots.iter().filter(|slot| slot.usages > 0).count();
    assert_eq!(events.num_listeners(), live);
});
