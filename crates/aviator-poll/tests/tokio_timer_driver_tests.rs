//! Integration tests for the tokio-backed timer driver on a paused clock.

use std::time::Duration;

use aviator_poll::{
    PollIntervals, PollTask, PollingScheduler, TimerDriver, TimerFired, TimerKind,
    TokioTimerDriver,
};
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout};

#[tokio::test(start_paused = true)]
async fn tokio_timer_driver_tests_repeating_timer_ticks_every_period() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TokioTimerDriver::new(tx);
    let start = Instant::now();

    let handle = driver.arm_repeating(TimerKind::Liveness, Duration::from_millis(100));

    for round in 1..=3u32 {
        let fired = rx.recv().await.expect("repeating timer should keep firing");
        assert_eq!(
            fired,
            TimerFired {
                handle,
                kind: TimerKind::Liveness
            }
        );
        let due = Duration::from_millis(100) * round;
        let elapsed = start.elapsed();
        assert!(elapsed >= due && elapsed < due + Duration::from_millis(50));
    }
}

#[tokio::test(start_paused = true)]
async fn tokio_timer_driver_tests_one_shot_fires_once() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TokioTimerDriver::new(tx);

    let handle = driver.arm_once(TimerKind::PushReconnect, Duration::from_millis(3_000));

    let fired = rx.recv().await.expect("one-shot timer should fire");
    assert_eq!(fired.handle, handle);
    assert_eq!(fired.kind, TimerKind::PushReconnect);
    assert!(timeout(Duration::from_secs(10), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn tokio_timer_driver_tests_cancel_stops_ticks() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TokioTimerDriver::new(tx);
    let handle = driver.arm_repeating(TimerKind::OfflineProbe, Duration::from_millis(100));
    rx.recv().await.expect("probe should fire before cancel");

    driver.cancel(handle);
    driver.cancel(handle);

    assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn tokio_timer_driver_tests_restart_leaves_old_handle_stale() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TokioTimerDriver::new(tx);
    let intervals = PollIntervals::from_millis(100, 250).expect("intervals should be valid");
    let mut scheduler = PollingScheduler::new(intervals);

    scheduler.start(&mut driver);
    let first = rx.recv().await.expect("status timer should fire");
    assert_eq!(first.kind, TimerKind::ProcessStatus);
    assert_eq!(scheduler.task_for(first.handle), Some(PollTask::ProcessStatus));

    scheduler.stop(&mut driver);
    scheduler.start(&mut driver);
    assert_eq!(scheduler.task_for(first.handle), None);

    let next = rx.recv().await.expect("restarted status timer should fire");
    assert_ne!(next.handle, first.handle);
    assert_eq!(scheduler.task_for(next.handle), Some(PollTask::ProcessStatus));
}

#[tokio::test(start_paused = true)]
async fn tokio_timer_driver_tests_drop_aborts_every_timer() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut driver = TokioTimerDriver::new(tx);
    driver.arm_repeating(TimerKind::ProcessStatus, Duration::from_millis(100));
    driver.arm_once(TimerKind::PushReconnect, Duration::from_millis(200));

    drop(driver);

    assert_eq!(rx.recv().await, None);
}
