#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tickrun_jobs::{JobOptions, JobScheduler};
use tickrun_task::{BoxTask, Step, TaskError, TaskExt, from_fn, sequence, wait_ticks};

#[derive(Arbitrary, Debug)]
enum Shape {
    Wait(u8),
    Fail,
    Nest(Vec<Shape>),
}

fn build(shape: Shape, depth: u32) -> BoxTask {
    match shape {
        Shape::Wait(ticks) => wait_ticks(u64::from(ticks % 8)).boxed(),
        Shape::Fail => from_fn(|_| Err(TaskError::msg("fuzz failure"))).named("Fail").boxed(),
        Shape::Nest(children) if depth < 3 => sequence(
            children
                .into_iter()
                .take(4)
                .map(|child| build(child, depth + 1)),
        )
        .named("Nest")
        .boxed(),
        Shape::Nest(_) => from_fn(|_| Ok(Step::finished())).boxed(),
    }
}

#[derive(Arbitrary, Debug)]
struct JobSpec {
    shape: Shape,
    blocking: bool,
    handled: bool,
}

fuzz_target!(|jobs: Vec<JobSpec>| {
    let mut scheduler = JobScheduler::new();
    let mut handles = Vec::new();
    for job in jobs.into_iter().take(16) {
        let mut options = JobOptions::default().with_blocking(job.blocking);
        if job.handled {
            options = options.with_exception_handler(|_| {});
        }
        handles.push(scheduler.submit(build(job.shape, 0), options));
    }

    for _ in 0..4096 {
        if !scheduler.is_running() {
            break;
        }
        let _ = scheduler.tick();
    }

    assert!(!scheduler.is_running());
    assert!(!scheduler.is_blocking());
    assert!(handles.iter().all(|handle| handle.is_finished()));
});
