use super::*;
use crate::frame::{FrameData, FrameFormat};
use crossbeam::channel;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

fn create_test_frame(id: u64) -> FrameData {
    FrameData::new(id, SystemTime::now(), vec![0u8; 96], 8, 8, FrameFormat::Yuv420)
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Analyzer that records frame ids and waits for a permit per frame
fn gated_analyzer() -> (
    impl Analyzer,
    channel::Sender<()>,
    channel::Receiver<u64>,
    Arc<Mutex<Vec<u64>>>,
) {
    let (permit_tx, permit_rx) = channel::unbounded::<()>();
    let (started_tx, started_rx) = channel::unbounded::<u64>();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_by_worker = Arc::clone(&seen);

    let analyzer = move |frame: &FrameData| {
        let _ = started_tx.send(frame.id);
        let _ = permit_rx.recv();
        seen_by_worker.lock().push(frame.id);
    };
    (analyzer, permit_tx, started_rx, seen)
}

#[test]
fn test_frame_counter_sees_every_frame() {
    let counter = FrameCounter::new();
    let mut executor =
        AnalyzerExecutor::spawn(BackpressureStrategy::BlockProducer, counter.clone()).unwrap();
    let sink = executor.sink();
    assert_eq!(sink.strategy(), BackpressureStrategy::BlockProducer);

    for id in 0..5 {
        assert_eq!(sink.submit(create_test_frame(id)), SubmitOutcome::Queued);
    }

    assert!(wait_until(|| counter.count() == 5));
    let stats = executor.stats();
    assert_eq!(stats.submitted(), 5);
    assert_eq!(stats.dropped(), 0);

    executor.shutdown();
    assert_eq!(stats.analyzed(), 5);
}

#[test]
fn test_keep_only_latest_replaces_queued_frame() {
    let (analyzer, permits, started, seen) = gated_analyzer();
    let mut executor =
        AnalyzerExecutor::spawn(BackpressureStrategy::KeepOnlyLatest, analyzer).unwrap();
    let sink = executor.sink();

    assert_eq!(sink.submit(create_test_frame(0)), SubmitOutcome::Queued);
    assert_eq!(started.recv_timeout(Duration::from_secs(5)).unwrap(), 0);

    // Worker is busy with frame 0; one slot is free
    assert_eq!(sink.submit(create_test_frame(1)), SubmitOutcome::Queued);
    assert_eq!(sink.submit(create_test_frame(2)), SubmitOutcome::Dropped);
    assert_eq!(sink.submit(create_test_frame(3)), SubmitOutcome::Dropped);

    permits.send(()).unwrap();
    permits.send(()).unwrap();
    assert!(wait_until(|| seen.lock().len() == 2));

    assert_eq!(*seen.lock(), vec![0, 3]);
    let stats = executor.stats();
    assert_eq!(stats.submitted(), 4);
    assert_eq!(stats.dropped(), 2);

    executor.shutdown();
}

#[test]
fn test_block_producer_waits_for_analyzer() {
    let (analyzer, permits, started, seen) = gated_analyzer();
    let mut executor =
        AnalyzerExecutor::spawn(BackpressureStrategy::BlockProducer, analyzer).unwrap();
    let sink = executor.sink();

    assert_eq!(sink.submit(create_test_frame(0)), SubmitOutcome::Queued);
    started.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(sink.submit(create_test_frame(1)), SubmitOutcome::Queued);

    let (done_tx, done_rx) = channel::bounded(1);
    let producer_sink = sink.clone();
    let producer = std::thread::spawn(move || {
        let outcome = producer_sink.submit(create_test_frame(2));
        let _ = done_tx.send(outcome);
    });

    // Queue is full and the analyzer is parked
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    for _ in 0..3 {
        permits.send(()).unwrap();
    }
    assert_eq!(
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        SubmitOutcome::Queued
    );
    producer.join().unwrap();

    assert!(wait_until(|| seen.lock().len() == 3));
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
    assert_eq!(executor.stats().dropped(), 0);

    executor.shutdown();
}

#[test]
fn test_shutdown_wakes_blocked_producer() {
    let (analyzer, permits, started, _seen) = gated_analyzer();
    let mut executor =
        AnalyzerExecutor::spawn(BackpressureStrategy::BlockProducer, analyzer).unwrap();
    let sink = executor.sink();

    sink.submit(create_test_frame(0));
    started.recv_timeout(Duration::from_secs(5)).unwrap();
    sink.submit(create_test_frame(1));

    let (done_tx, done_rx) = channel::bounded(1);
    let producer_sink = sink.clone();
    let producer = std::thread::spawn(move || {
        let _ = done_tx.send(producer_sink.submit(create_test_frame(2)));
    });
    assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());

    // Let the worker drain whatever it still picks up while joining
    let releaser = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        for _ in 0..5 {
            let _ = permits.send(());
        }
    });

    executor.shutdown();
    assert_eq!(
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        SubmitOutcome::Closed
    );
    producer.join().unwrap();
    releaser.join().unwrap();
}

#[test]
fn test_submit_after_shutdown_is_closed() {
    let mut executor =
        AnalyzerExecutor::spawn(BackpressureStrategy::KeepOnlyLatest, FrameCounter::new())
            .unwrap();
    let sink = executor.sink();
    assert!(executor.is_running());

    executor.shutdown();
    executor.shutdown();

    assert!(!executor.is_running());
    assert_eq!(sink.submit(create_test_frame(0)), SubmitOutcome::Closed);
    assert_eq!(executor.stats().submitted(), 0);
}

#[test]
fn test_closure_analyzer() {
    let total = Arc::new(Mutex::new(0usize));
    let total_by_worker = Arc::clone(&total);
    let mut executor = AnalyzerExecutor::spawn(
        BackpressureStrategy::BlockProducer,
        move |frame: &FrameData| *total_by_worker.lock() += frame.data.len(),
    )
    .unwrap();

    let sink = executor.sink();
    sink.submit(create_test_frame(0));
    sink.submit(create_test_frame(1));

    assert!(wait_until(|| *total.lock() == 192));
    executor.shutdown();
}
