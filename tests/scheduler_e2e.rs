//! End-to-end scheduling scenarios.
//!
//! Every test drives a real [`Scheduler`] from the test thread: the test
//! spawns one root logical thread, the root spawns the rest, and the handlers
//! append to a shared trace. Because only one logical thread runs at a time
//! the trace order is the dispatch order.
//!
//! Run with: `cargo test --test scheduler_e2e`

mod common {
    pub fn init_test_logging() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .with_thread_names(true)
            .try_init();
    }
}

/// Phase tracking macro for structured test logging.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Assertion with logging for better test output.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            tracing::error!(
                assertion = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

use lockstep::{DispatchReason, Scheduler, SchedulerConfig, ThreadStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn init_test(name: &str) {
    common::init_test_logging();
    test_phase!(name);
}

#[derive(Clone, Default)]
struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

fn own_time_left(sched: &Scheduler) -> u32 {
    let me = sched.current().expect("called from a logical thread");
    sched.snapshot()[me.index()].time_left
}

#[test]
fn higher_priority_child_preempts_before_quantum_expires() {
    init_test("higher_priority_child_preempts_before_quantum_expires");
    let sched = Scheduler::new();
    sched.init(2, 1).expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                t.push("low:start");
                let child = t.clone();
                s.spawn(move |prio| child.push(format!("high:{prio}")), 5)
                    .expect("spawn high");
                t.push("low:resumed");
            },
            2,
        )
        .expect("spawn low");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["low:start", "high:5", "low:resumed"];
    assert_with_log!(events == expected, "preemption order", expected, events);
    assert_with_log!(
        report.stats.preemptions == 1,
        "one preemption",
        1u64,
        report.stats.preemptions
    );
    assert_with_log!(report.stats.panics == 0, "no panics", 0u64, report.stats.panics);
}

#[test]
fn equal_priorities_alternate_with_unit_quantum() {
    init_test("equal_priorities_alternate_with_unit_quantum");
    let sched = Scheduler::new();
    sched
        .init_with(SchedulerConfig::new(1, 0).record_dispatches(true))
        .expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                for name in ["A", "B"] {
                    let (s2, t2) = (s.clone(), t.clone());
                    s.spawn(
                        move |_| {
                            for _ in 0..2 {
                                t2.push(name);
                                s2.yield_now();
                            }
                        },
                        3,
                    )
                    .expect("spawn worker");
                }
            },
            4,
        )
        .expect("spawn root");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["A", "B", "A", "B"];
    assert_with_log!(events == expected, "strict round robin", expected, events);

    let rotations = report
        .dispatches
        .iter()
        .filter(|d| d.reason == DispatchReason::RoundRobin)
        .count();
    assert_with_log!(rotations >= 3, "rotations logged", ">= 3", rotations);
    assert_with_log!(
        report.stats.quantum_refills == 2,
        "root refilled while spawning lower peers",
        2u64,
        report.stats.quantum_refills
    );
}

#[test]
fn runner_keeps_cpu_when_only_lower_priorities_wait() {
    init_test("runner_keeps_cpu_when_only_lower_priorities_wait");
    let sched = Scheduler::new();
    sched.init(2, 0).expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                let low = t.clone();
                s.spawn(move |_| low.push("low"), 1).expect("spawn low");
                for i in 0..5 {
                    t.push(format!("high:{i}"));
                    s.yield_now();
                }
            },
            4,
        )
        .expect("spawn high");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["high:0", "high:1", "high:2", "high:3", "high:4", "low"];
    assert_with_log!(events == expected, "no switch to lower", expected, events);
    assert_with_log!(
        report.stats.quantum_refills == 3,
        "quantum refilled on each expiry",
        3u64,
        report.stats.quantum_refills
    );
    assert_with_log!(
        report.stats.rotations == 0,
        "no rotation",
        0u64,
        report.stats.rotations
    );
}

#[test]
fn yield_charges_one_tick_and_dispatch_refills() {
    init_test("yield_charges_one_tick_and_dispatch_refills");
    let sched = Scheduler::new();
    sched.init(3, 0).expect("init");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let (s, seen_a) = (sched.clone(), Arc::clone(&seen));
    sched
        .spawn(
            move |_| {
                seen_a.lock().push(own_time_left(&s));
                s.yield_now();
                seen_a.lock().push(own_time_left(&s));
                s.yield_now();
                seen_a.lock().push(own_time_left(&s));

                let (s2, seen_b) = (s.clone(), Arc::clone(&seen_a));
                s.spawn(move |_| seen_b.lock().push(own_time_left(&s2)), 2)
                    .expect("spawn peer");
                seen_a.lock().push(own_time_left(&s));
            },
            2,
        )
        .expect("spawn root");

    let _ = sched.drain_and_shutdown();
    let seen = seen.lock().clone();
    let expected = vec![3, 2, 1, 3, 3];
    assert_with_log!(seen == expected, "time left per point", expected, seen);
}

#[test]
fn wake_makes_blocked_thread_ready() {
    init_test("wake_makes_blocked_thread_ready");
    let sched = Scheduler::new();
    sched.init(3, 1).expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                let (s2, t2) = (s.clone(), t.clone());
                let me = s.current().expect("scheduled");
                s.spawn(
                    move |_| {
                        let woken = s2.wake_device(0).expect("wake");
                        let status = s2.snapshot()[me.index()].status;
                        t2.push(format!("waker:woke {woken}, sleeper {status}"));
                    },
                    1,
                )
                .expect("spawn waker");
                s.block_on_device(0).expect("block");
                t.push("sleeper:resumed");
            },
            1,
        )
        .expect("spawn sleeper");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["waker:woke 1, sleeper READY", "sleeper:resumed"];
    assert_with_log!(events == expected, "wake order", expected, events);
    assert_with_log!(report.stats.blocks == 1, "blocks", 1u64, report.stats.blocks);
    assert_with_log!(report.stats.wakeups == 1, "wakeups", 1u64, report.stats.wakeups);
}

#[test]
fn woken_higher_priority_preempts_waker() {
    init_test("woken_higher_priority_preempts_waker");
    let sched = Scheduler::new();
    sched.init(3, 1).expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                let (s2, t2) = (s.clone(), t.clone());
                s.spawn(
                    move |_| {
                        let woken = s2.wake_device(0).expect("wake");
                        t2.push(format!("waker:after {woken}"));
                    },
                    1,
                )
                .expect("spawn waker");
                s.block_on_device(0).expect("block");
                t.push("sleeper:resumed");
            },
            4,
        )
        .expect("spawn sleeper");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["sleeper:resumed", "waker:after 1"];
    assert_with_log!(events == expected, "woken thread first", expected, events);
    assert_with_log!(
        report.stats.preemptions == 1,
        "waker preempted",
        1u64,
        report.stats.preemptions
    );
}

#[test]
fn wake_releases_all_waiters_in_block_order() {
    init_test("wake_releases_all_waiters_in_block_order");
    let sched = Scheduler::new();
    sched.init(4, 2).expect("init");
    let trace = Trace::default();

    let (s, t) = (sched.clone(), trace.clone());
    sched
        .spawn(
            move |_| {
                for name in ["W1", "W2"] {
                    let (s2, t2) = (s.clone(), t.clone());
                    s.spawn(
                        move |_| {
                            s2.block_on_device(1).expect("block");
                            t2.push(name);
                        },
                        2,
                    )
                    .expect("spawn waiter");
                }
                let none = s.wake_device(0).expect("wake idle device");
                let woken = s.wake_device(1).expect("wake");
                t.push(format!("root:woke {none}/{woken}"));
            },
            1,
        )
        .expect("spawn root");

    let report = sched.drain_and_shutdown().expect("initialized");
    let events = trace.events();
    let expected = vec!["W1", "W2", "root:woke 0/2"];
    assert_with_log!(events == expected, "fifo among woken", expected, events);
    assert_with_log!(report.stats.wakeups == 2, "wakeups", 2u64, report.stats.wakeups);
}

#[test]
fn waking_own_device_cancels_pending_block() {
    init_test("waking_own_device_cancels_pending_block");
    let sched = Scheduler::new();
    sched.init(2, 1).expect("init");
    let statuses = Arc::new(Mutex::new(Vec::new()));

    let (s, seen) = (sched.clone(), Arc::clone(&statuses));
    sched
        .spawn(
            move |_| {
                let me = s.current().expect("scheduled");
                s.block_on_device(0).expect("block alone");
                seen.lock().push(s.snapshot()[me.index()].status);
                let woken = s.wake_device(0).expect("wake self");
                assert_eq!(woken, 1);
                seen.lock().push(s.snapshot()[me.index()].status);
            },
            2,
        )
        .expect("spawn");

    let report = sched.drain_and_shutdown().expect("initialized");
    let statuses = statuses.lock().clone();
    let expected = vec![ThreadStatus::Blocked, ThreadStatus::Running];
    assert_with_log!(statuses == expected, "block then cancel", expected, statuses);
    assert_with_log!(report.stats.panics == 0, "no panics", 0u64, report.stats.panics);
    assert_with_log!(
        report.stranded.is_empty(),
        "nothing stranded",
        0usize,
        report.stranded.len()
    );
}

#[test]
fn at_most_one_thread_runs_at_any_point() {
    init_test("at_most_one_thread_runs_at_any_point");
    let sched = Scheduler::new();
    sched.init(2, 0).expect("init");
    let violations = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let check = |s: &Scheduler, violations: &AtomicUsize| {
        let running = s
            .snapshot()
            .iter()
            .filter(|t| t.status == ThreadStatus::Running)
            .count();
        if running != 1 || s.running() != s.current() {
            violations.fetch_add(1, Ordering::SeqCst);
        }
    };

    let (s, v, f) = (sched.clone(), Arc::clone(&violations), Arc::clone(&finished));
    sched
        .spawn(
            move |_| {
                for priority in [1, 2, 2, 3] {
                    let (s2, v2, f2) = (s.clone(), Arc::clone(&v), Arc::clone(&f));
                    s.spawn(
                        move |_| {
                            for _ in 0..3 {
                                check(&s2, &v2);
                                s2.yield_now();
                            }
                            f2.fetch_add(1, Ordering::SeqCst);
                        },
                        priority,
                    )
                    .expect("spawn worker");
                    check(&s, &v);
                }
                f.fetch_add(1, Ordering::SeqCst);
            },
            5,
        )
        .expect("spawn root");

    let report = sched.drain_and_shutdown().expect("initialized");
    let violations = violations.load(Ordering::SeqCst);
    assert_with_log!(violations == 0, "single runner", 0usize, violations);
    let finished = finished.load(Ordering::SeqCst);
    assert_with_log!(finished == 5, "drain waited for every handler", 5usize, finished);
    assert_with_log!(
        report.joined.len() == 5,
        "every backing thread joined",
        5usize,
        report.joined.len()
    );
}

#[test]
fn dispatch_order_is_deterministic() {
    init_test("dispatch_order_is_deterministic");

    let run = || {
        let sched = Scheduler::new();
        sched
            .init_with(SchedulerConfig::new(2, 1).record_dispatches(true))
            .expect("init");
        let s = sched.clone();
        sched
            .spawn(
                move |_| {
                    for priority in [3, 1, 3, 2] {
                        let s2 = s.clone();
                        s.spawn(
                            move |_| {
                                s2.yield_now();
                                s2.yield_now();
                            },
                            priority,
                        )
                        .expect("spawn");
                    }
                    s.yield_now();
                },
                2,
            )
            .expect("spawn root");
        sched.drain_and_shutdown().expect("initialized")
    };

    let first = run();
    let second = run();
    assert_with_log!(
        first.dispatches == second.dispatches,
        "same dispatch log",
        first.dispatch_order(),
        second.dispatch_order()
    );
    let steps: Vec<_> = first.dispatches.iter().map(|d| d.step).collect();
    let mut sorted = steps.clone();
    sorted.sort_unstable();
    assert_with_log!(steps == sorted, "steps are monotonic", sorted, steps);
    assert_with_log!(
        first.dispatches.first().map(|d| d.reason) == Some(DispatchReason::Initial),
        "first dispatch is initial",
        Some(DispatchReason::Initial),
        first.dispatches.first().map(|d| d.reason)
    );
}
