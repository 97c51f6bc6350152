use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use slotprof::backtrace::{CallStack, Frame};
use slotprof::config::{ProfilerConfig, Tunables};
use slotprof::domain::{FrameId, ProfilerError, ProfilerKind};
use slotprof::profiling::{ManualTrigger, Profiler, ThreadTrigger};

fn manual_profiler(tunables: Arc<Tunables>) -> (Profiler, ManualTrigger, CallStack) {
    let trigger = ManualTrigger::new();
    let stack = CallStack::new();
    let profiler = Profiler::with_tunables(trigger.clone(), Arc::new(stack.clone()), tunables);
    (profiler, trigger, stack)
}

#[test]
fn test_lifecycle_errors_leave_state_unchanged() {
    let (mut profiler, trigger, stack) = manual_profiler(Arc::new(Tunables::default()));
    let _main = stack.enter(Frame::named(FrameId(1), "main"));

    let err = profiler.sample_mut().stop().unwrap_err();
    assert!(matches!(err, ProfilerError::NotRunning(ProfilerKind::Sample)));
    assert!(profiler.sample().log().is_none());

    profiler.sample_mut().start(3).unwrap();
    trigger.fire();
    let before = profiler.sample().log().unwrap().records;

    let err = profiler.sample_mut().start(9).unwrap_err();
    assert!(matches!(err, ProfilerError::AlreadyRunning(ProfilerKind::Sample)));
    assert!(profiler.sample().is_running());
    assert_eq!(profiler.sample().interval_ms(), Some(3));
    assert_eq!(trigger.interval(), Some(Duration::from_millis(3)));
    assert_eq!(profiler.sample().log().unwrap().records, before);
}

#[test]
fn test_tunables_only_affect_new_logs() {
    let tunables = Arc::new(Tunables::new(4, 1));
    let (mut profiler, _trigger, stack) = manual_profiler(Arc::clone(&tunables));
    profiler.memory_mut().start().unwrap();

    tunables.set_slot_heap_size(100);
    for id in 1..=3 {
        let _frame = stack.enter(Frame::named(FrameId(id), "f"));
        profiler.memory_mut().on_allocation(&stack, 1);
    }
    // Still capacity 1: two evictions
    let snapshot = profiler.memory().log().unwrap();
    assert_eq!(snapshot.others().map(|r| r.count), Some(2));
    assert_eq!(snapshot.stacks().count(), 1);

    // Reset while running keeps the Log and its capacity
    profiler.memory_mut().reset();
    for id in 1..=3 {
        let _frame = stack.enter(Frame::named(FrameId(id), "f"));
        profiler.memory_mut().on_allocation(&stack, 1);
    }
    assert_eq!(profiler.memory().log().unwrap().stacks().count(), 1);

    // Reset while stopped drops it; the next start picks up the new size
    profiler.memory_mut().stop().unwrap();
    profiler.memory_mut().reset();
    profiler.memory_mut().start().unwrap();
    for id in 1..=3 {
        let _frame = stack.enter(Frame::named(FrameId(id), "f"));
        profiler.memory_mut().on_allocation(&stack, 1);
    }
    let snapshot = profiler.memory().log().unwrap();
    assert_eq!(snapshot.stacks().count(), 3);
    assert!(snapshot.others().is_none());
}

#[test]
fn test_invalid_filter_value_keeps_active_filter() {
    let (mut profiler, _trigger, _stack) = manual_profiler(Arc::new(Tunables::default()));
    profiler.set_filter_value(&json!("io::*")).unwrap();

    for value in [json!(42), json!(["a"]), json!(false)] {
        let err = profiler.set_filter_value(&value).unwrap_err();
        assert!(matches!(err, ProfilerError::InvalidFilterType(_)));
    }
    assert!(profiler.filter_pattern().is_some_and(|p| p.matches("io::read")));
}

#[test]
fn test_config_file_values_drive_a_profiler() {
    let config = ProfilerConfig::from_json(
        r#"{"max_stack_depth": 2, "slot_heap_size": 3, "sample_interval_ms": 4, "filter": "hot*"}"#,
    )
    .unwrap();
    let tunables = Arc::new(Tunables::default());
    config.apply_tunables(&tunables).unwrap();

    let (mut profiler, trigger, stack) = manual_profiler(tunables);
    profiler.set_filter_value(&config.filter).unwrap();
    profiler.sample_mut().start(config.sample_interval_ms.unwrap()).unwrap();

    let _root = stack.enter(Frame::named(FrameId(1), "root"));
    let _mid = stack.enter(Frame::named(FrameId(2), "mid"));
    let _hot = stack.enter(Frame::named(FrameId(3), "hot_loop"));
    trigger.fire();

    let snapshot = profiler.sample().log().unwrap();
    let (ids, record) = snapshot.stacks().next().unwrap();
    assert_eq!(ids, &[FrameId(3), FrameId(2)]);
    assert_eq!(record.elapsed, 4);
}

#[test]
fn test_thread_trigger_samples_in_background() {
    let stack = CallStack::new();
    let mut profiler = Profiler::new(ThreadTrigger::new(), Arc::new(stack.clone()));
    let _main = stack.enter(Frame::named(FrameId(1), "main"));

    profiler.sample_mut().start(1).unwrap();
    std::thread::sleep(Duration::from_millis(200));

    // Snapshots while running are taken under the mask
    let running = profiler.sample().log().unwrap();
    profiler.sample_mut().stop().unwrap();
    let stopped = profiler.sample().log().unwrap();

    assert!(stopped.total_count() > 0);
    assert!(stopped.total_count() >= running.total_count());
    assert_eq!(stopped.total_elapsed(), stopped.total_count());

    // No tick lands after stop returns
    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(profiler.sample().log().unwrap().total_count(), stopped.total_count());
}

#[test]
fn test_reset_while_running_with_thread_trigger() {
    let stack = CallStack::new();
    let mut profiler = Profiler::new(ThreadTrigger::new(), Arc::new(stack.clone()));
    let _main = stack.enter(Frame::named(FrameId(1), "main"));

    profiler.sample_mut().start(1).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    let before = profiler.sample().log().unwrap().total_count();

    profiler.sample_mut().reset();
    let reset_at = Instant::now();
    assert!(profiler.sample().is_running());
    std::thread::sleep(Duration::from_millis(5));
    profiler.sample_mut().stop().unwrap();
    let since_reset = u64::try_from(reset_at.elapsed().as_millis()).unwrap();

    // Only ticks after the reset remain: one per elapsed millisecond plus one pending
    let after = profiler.sample().log().unwrap().total_count();
    assert!(before > 0);
    assert!(after <= since_reset + 2, "{after} samples in {since_reset}ms since reset");
}
