use std::sync::Arc;

use slotprof::backtrace::{Backtrace, CallStack, Frame};
use slotprof::config::Tunables;
use slotprof::domain::{FrameId, ProfilerKind};
use slotprof::profiling::{ManualTrigger, Profiler};
use slotprof::symbolization::SymbolTable;
use slotprof::{Log, StackKey, StackRecord};

fn frames(ids: &[u64]) -> StackKey {
    StackKey::Frames(ids.iter().copied().map(FrameId).collect())
}

#[test]
fn test_full_store_evicts_first_minimum_into_others() {
    // capacity 2, depth 1: A and B fill the store, C evicts A
    let tunables = Arc::new(Tunables::new(1, 2));
    let stack = CallStack::new();
    let mut profiler =
        Profiler::with_tunables(ManualTrigger::new(), Arc::new(stack.clone()), tunables);
    profiler.memory_mut().start().unwrap();

    for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
        let _frame = stack.enter(Frame::named(FrameId(id), name));
        assert!(profiler.memory_mut().on_allocation(&stack, 1));
    }

    let snapshot = profiler.memory().log().unwrap();
    assert_eq!(snapshot.kind, ProfilerKind::Memory);
    assert_eq!(
        snapshot.records,
        vec![
            StackRecord { key: StackKey::Others, count: 1, elapsed: 0 },
            StackRecord { key: frames(&[3]), count: 1, elapsed: 0 },
            StackRecord { key: frames(&[2]), count: 1, elapsed: 0 },
        ]
    );
}

#[test]
fn test_count_is_conserved_under_eviction() {
    let mut log = Log::new(ProfilerKind::Sample, 4, 2).unwrap();
    let mut recorded = 0;
    for i in 0..200u64 {
        let stack = vec![Frame::named(FrameId(i % 13), "f"), Frame::named(FrameId(i % 3), "g")];
        let count = 1 + i % 5;
        assert!(log.record_sample(&stack, None, count, 10));
        recorded += count;
        assert!(log.len() <= log.capacity());
    }

    assert_eq!(log.total().count, recorded);
    assert_eq!(log.snapshot().total_count(), recorded);
    assert!(log.others().count > 0);
}

#[test]
fn test_scratch_buffer_reuse_does_not_alias_slots() {
    let mut log = Log::new(ProfilerKind::Memory, 8, 3).unwrap();
    let mut scratch = Backtrace::from_ids(3, &[FrameId(1), FrameId(2)]);
    log.record_backtrace(&scratch, 10, 0);

    scratch = Backtrace::from_ids(3, &[FrameId(9)]);
    log.record_backtrace(&scratch, 5, 0);

    let snapshot = log.snapshot();
    assert_eq!(snapshot.records[0].key, frames(&[1, 2]));
    assert_eq!(snapshot.records[1].key, frames(&[9]));
}

#[test]
fn test_sampling_with_filter_and_symbols() {
    let mut symbols = SymbolTable::new();
    let stack = CallStack::new();
    let trigger = ManualTrigger::new();
    let mut profiler = Profiler::new(trigger.clone(), Arc::new(stack.clone()));
    profiler.set_filter_pattern(Some("*query*"));
    profiler.sample_mut().start(5).unwrap();

    let _main = stack.enter(symbols.frame("main"));
    trigger.fire();
    {
        let _query = stack.enter(symbols.frame("run_query"));
        trigger.fire();
        trigger.fire();
    }
    trigger.fire();
    profiler.sample_mut().stop().unwrap();

    let snapshot = profiler.sample().log().unwrap();
    assert_eq!(snapshot.records.len(), 1);
    let (ids, record) = snapshot.stacks().next().unwrap();
    assert_eq!(symbols.format_stack(ids), "run_query <- main");
    assert_eq!(record.count, 2);
    assert_eq!(record.elapsed, 10);
}

#[test]
fn test_reset_while_stopped_behaves_like_new_controller() {
    let tunables = Arc::new(Tunables::new(2, 8));
    let stack = CallStack::new();
    let trigger = ManualTrigger::new();
    let mut profiler =
        Profiler::with_tunables(trigger.clone(), Arc::new(stack.clone()), Arc::clone(&tunables));
    let _main = stack.enter(Frame::named(FrameId(1), "main"));

    profiler.sample_mut().start(1).unwrap();
    trigger.fire();
    profiler.sample_mut().stop().unwrap();
    profiler.sample_mut().reset();

    profiler.sample_mut().start(1).unwrap();
    let snapshot = profiler.sample().log().unwrap();
    assert!(snapshot.records.is_empty());
    assert!(snapshot.others().is_none());
}
