//! Host-level scenarios: a frame loop driving jobs and events together.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tickrun_events::{EventQueueMode, HandlerKey, SubscriberId};
use tickrun_harness::{Harness, HarnessError, init_test_logging};
use tickrun_jobs::{JobOptions, SchedulerEvent};
use tickrun_task::{Step, TaskError, TaskExt, from_fn, ready, sequence, wait_ticks};

#[derive(Debug, thiserror::Error)]
#[error("FooError: project file is corrupt")]
struct FooError;

#[test]
fn pause_once_then_42() {
    init_test_logging();
    let mut harness = Harness::new();
    let mut paused = false;
    let handle = harness.submit(
        from_fn(move |_| {
            if paused {
                return Ok(Step::done(42u64));
            }
            paused = true;
            Ok(Step::Pause)
        }),
        JobOptions::non_blocking(),
    );

    harness.tick().unwrap();
    assert!(!handle.is_finished());
    harness.tick().unwrap();
    assert!(handle.is_finished());
    assert_eq!(handle.take_value_as::<u64>().unwrap(), Some(42));
}

#[test]
fn unhandled_failure_surfaces_inner_cause() {
    init_test_logging();
    let mut harness = Harness::new();
    harness.submit(
        from_fn(|_| Err(TaskError::custom(FooError))),
        JobOptions::default(),
    );

    let err = harness.tick().unwrap_err();
    let HarnessError::Scheduler(scheduler_err) = &err else {
        panic!("expected a scheduler error, got {err:?}");
    };
    assert_eq!(scheduler_err.to_string(), "Error occurred during async operation");
    assert!(scheduler_err.task_error().downcast_ref::<FooError>().is_some());
    assert_eq!(err.user_message(), "FooError: project file is corrupt");
}

#[test]
fn blocking_notifications_bracket_a_load() {
    let mut harness = Harness::new();
    let transitions = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&transitions);
    harness.scheduler().on_event(move |event| match event {
        SchedulerEvent::BlockingLoadStarted => log.borrow_mut().push("started"),
        SchedulerEvent::BlockingLoadComplete => log.borrow_mut().push("complete"),
        SchedulerEvent::Exception { .. } => {}
    });

    harness.submit(wait_ticks(2), JobOptions::default().with_status_title("Loading"));
    harness.submit(wait_ticks(1), JobOptions::default());
    harness.submit(wait_ticks(5), JobOptions::non_blocking());
    assert_eq!(*transitions.borrow(), vec!["started"]);

    harness.tick().unwrap();
    assert_eq!(harness.scheduler().status_title().as_deref(), Some("Loading"));

    harness.run_until_idle().unwrap();
    assert_eq!(*transitions.borrow(), vec!["started", "complete"]);
    assert!(!harness.scheduler().is_blocking());
}

#[test]
fn zero_job_tick_is_silent() {
    let mut harness = Harness::new();
    let fired = Rc::new(Cell::new(0));
    let count = Rc::clone(&fired);
    harness.scheduler().on_event(move |_| count.set(count.get() + 1));
    for _ in 0..3 {
        harness.tick().unwrap();
    }
    assert_eq!(fired.get(), 0);
    assert_eq!(harness.run_until_idle().unwrap(), 0);
}

#[test]
fn install_flow_reports_progress_through_events() {
    // A job that runs a few stages and reports each one; the view only
    // cares about the latest stage per frame.
    let mut harness = Harness::new();
    let view_key = HandlerKey::new(SubscriberId(10), "InstallView::on_stage");
    let shown = Rc::new(RefCell::new(Vec::new()));
    let shown_log = Rc::clone(&shown);
    let stage_sink = harness.events().add(
        view_key,
        EventQueueMode::LatestOnly,
        move |stage: &'static str| shown_log.borrow_mut().push(stage),
    );

    let announce = |sink: tickrun_events::EventSink<&'static str>, stage: &'static str| {
        from_fn(move |_| {
            sink.fire(stage);
            Ok(Step::finished())
        })
        .boxed()
    };
    let flow = sequence([
        announce(stage_sink.clone(), "resolve"),
        announce(stage_sink.clone(), "download"),
        wait_ticks(1).boxed(),
        announce(stage_sink.clone(), "link"),
        ready("installed").boxed(),
    ])
    .named("InstallFlow");

    let handle = harness.submit(flow, JobOptions::default().with_status_title("Installing"));
    harness.run_until_idle().unwrap();

    assert_eq!(handle.take_value_as::<&str>().unwrap(), Some("installed"));
    // Each stage runs on its own tick (delegate, then complete), so every
    // stage reaches the view.
    assert_eq!(*shown.borrow(), vec!["resolve", "download", "link"]);

    harness.events().remove::<&'static str>(&view_key);
    harness.shutdown().unwrap();
}
