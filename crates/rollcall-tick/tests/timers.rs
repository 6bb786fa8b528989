//! Integration tests for the keepalive, backoff, and shared tick service.
//!
//! Timer tests run with `start_paused = true` so the Tokio clock
//! auto-advances and every assertion on elapsed time is exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rollcall_tick::{
    Backoff, BackoffConfig, Keepalive, ReconnectPolicy, TickConfig, TickService,
};
use tokio::time::{self, Instant};

// =========================================================================
// Helpers
// =========================================================================

fn backoff_no_jitter(max_attempts: Option<u32>) -> ReconnectPolicy {
    ReconnectPolicy::Backoff(BackoffConfig {
        initial: Duration::from_millis(500),
        max: Duration::from_secs(4),
        multiplier: 2.0,
        max_attempts,
        jitter: 0.0,
    })
}

fn unaligned_service() -> TickService {
    TickService::new(TickConfig {
        period: Duration::from_secs(1),
        align_to_wall_clock: false,
    })
}

fn counting(service: &TickService) -> (Arc<AtomicU64>, rollcall_tick::TickSubscription) {
    let count = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&count);
    let subscription = service.subscribe(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    (count, subscription)
}

// =========================================================================
// Keepalive
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_keepalive_reset_postpones_deadline() {
    let start = Instant::now();
    let mut keepalive = Keepalive::new(Duration::from_secs(45));

    time::sleep(Duration::from_secs(30)).await;
    keepalive.reset();
    keepalive.wait().await;

    assert_eq!(start.elapsed(), Duration::from_secs(75));
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_rearms_after_firing() {
    let start = Instant::now();
    let mut keepalive = Keepalive::new(Duration::from_secs(45));

    keepalive.wait().await;
    keepalive.wait().await;

    assert_eq!(start.elapsed(), Duration::from_secs(90));
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_disabled_never_fires() {
    let mut keepalive = Keepalive::disabled();

    let result = time::timeout(Duration::from_secs(3600), keepalive.wait()).await;

    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_keepalive_cancelled_wait_keeps_deadline() {
    let start = Instant::now();
    let mut keepalive = Keepalive::new(Duration::from_secs(10));

    let early = time::timeout(Duration::from_secs(4), keepalive.wait()).await;
    assert!(early.is_err());
    keepalive.wait().await;

    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

// =========================================================================
// Backoff
// =========================================================================

#[test]
fn test_backoff_immediate_always_zero() {
    let mut backoff = Backoff::new(ReconnectPolicy::Immediate);
    for _ in 0..100 {
        assert_eq!(backoff.next_delay(), Some(Duration::ZERO));
    }
    assert_eq!(backoff.attempts(), 100);
}

#[test]
fn test_backoff_doubles_up_to_max() {
    let mut backoff = Backoff::new(backoff_no_jitter(None));
    let delays: Vec<u128> = (0..6)
        .map(|_| backoff.next_delay().unwrap().as_millis())
        .collect();
    assert_eq!(delays, vec![500, 1000, 2000, 4000, 4000, 4000]);
}

#[test]
fn test_backoff_gives_up_after_max_attempts() {
    let mut backoff = Backoff::new(backoff_no_jitter(Some(2)));
    assert!(backoff.next_delay().is_some());
    assert!(backoff.next_delay().is_some());
    assert_eq!(backoff.next_delay(), None);
    assert_eq!(backoff.attempts(), 2);
}

#[test]
fn test_backoff_reset_restarts_sequence() {
    let mut backoff = Backoff::new(backoff_no_jitter(Some(2)));
    backoff.next_delay();
    backoff.next_delay();

    backoff.reset();

    assert_eq!(backoff.attempts(), 0);
    assert_eq!(backoff.next_delay(), Some(Duration::from_millis(500)));
}

#[test]
fn test_backoff_delay_past_u64_millis_returned_whole() {
    let huge = Duration::from_secs(1 << 62);
    let mut backoff = Backoff::new(ReconnectPolicy::Backoff(BackoffConfig {
        initial: huge,
        max: huge,
        multiplier: 1.0,
        max_attempts: None,
        jitter: 0.0,
    }));
    assert_eq!(backoff.next_delay(), Some(huge));
    assert_eq!(backoff.next_delay(), Some(huge));
}

#[test]
fn test_backoff_jitter_stays_within_fraction() {
    let mut backoff = Backoff::new(ReconnectPolicy::Backoff(BackoffConfig {
        jitter: 0.5,
        max_attempts: None,
        ..BackoffConfig::default()
    }));
    let delay = backoff.next_delay().unwrap();
    assert!(delay >= Duration::from_millis(500));
    assert!(delay < Duration::from_millis(750));
}

#[test]
fn test_default_policy_is_immediate() {
    assert_eq!(ReconnectPolicy::default(), ReconnectPolicy::Immediate);
}

// =========================================================================
// TickService
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_tick_service_not_running_before_subscribe() {
    let service = unaligned_service();
    assert!(!service.is_running());
    assert_eq!(service.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_tick_service_fires_once_per_period() {
    let service = unaligned_service();
    let (count, _subscription) = counting(&service);

    time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(count.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_tick_service_subscribers_share_one_source() {
    let service = unaligned_service();
    let (first, _a) = counting(&service);
    let (second, _b) = counting(&service.clone());

    time::sleep(Duration::from_millis(2_500)).await;

    assert!(service.is_running());
    assert_eq!(service.subscriber_count(), 2);
    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(second.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_tick_service_last_unsubscribe_stops_source() {
    let service = unaligned_service();
    let (count, subscription) = counting(&service);
    time::sleep(Duration::from_millis(1_500)).await;

    drop(subscription);
    time::sleep(Duration::from_secs(5)).await;

    assert!(!service.is_running());
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tick_service_resubscribe_restarts_numbering() {
    let service = unaligned_service();
    let (_, subscription) = counting(&service);
    time::sleep(Duration::from_millis(2_500)).await;
    drop(subscription);

    let seen = Arc::new(AtomicU64::new(0));
    let sink = Arc::clone(&seen);
    let _subscription = service.subscribe(move |info| {
        sink.store(info.tick, Ordering::SeqCst);
    });
    time::sleep(Duration::from_millis(1_500)).await;

    assert!(service.is_running());
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_tick_service_one_of_two_unsubscribes_keeps_source() {
    let service = unaligned_service();
    let (_, first) = counting(&service);
    let (second_count, _second) = counting(&service);

    drop(first);
    time::sleep(Duration::from_millis(1_500)).await;

    assert!(service.is_running());
    assert_eq!(service.subscriber_count(), 1);
    assert_eq!(second_count.load(Ordering::SeqCst), 1);
}
