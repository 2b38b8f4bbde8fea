//! Backoff timing tests for the retry budget, using the paused tokio clock
//! so the expected delay sequence is asserted exactly.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use scribe_core::Error;
use scribe_upstream::{retry_with_backoff, RetryPolicy};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(500),
        max_delay: Duration::from_millis(8_000),
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_rate_limits_then_success_backs_off_exponentially() {
    let calls = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result = retry_with_backoff(&policy(3), "chat_complete", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(Error::UpstreamRateLimited("429".to_string()))
            } else {
                Ok("third time lucky")
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(result, "third time lucky");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Delays: 500ms after the first failure, 1000ms after the second.
    assert_eq!(start.elapsed(), Duration::from_millis(1_500));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_is_capped_at_the_ceiling() {
    let policy = RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(500),
        max_delay: Duration::from_millis(1_000),
    };
    let start = tokio::time::Instant::now();

    let err = retry_with_backoff(&policy, "chat_complete", || async {
        Err::<(), _>(Error::UpstreamUnavailable("down".to_string()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::UpstreamTimeout(_)));
    // Delays: 500, 1000, then capped at 1000 twice.
    assert_eq!(start.elapsed(), Duration::from_millis(3_500));
}

#[tokio::test(start_paused = true)]
async fn test_permanent_failure_sleeps_not_at_all() {
    let start = tokio::time::Instant::now();

    let err = retry_with_backoff(&policy(3), "chat_complete", || async {
        Err::<(), _>(Error::Upstream("400 bad request".to_string()))
    })
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(start.elapsed(), Duration::ZERO);
}
