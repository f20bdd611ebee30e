use handcraft_retry::error::RetryError;
use handcraft_retry::policy::RetryConfig;
use handcraft_retry::retry::with_retry;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_retry_succeeds_on_first_attempt() {
    let config = RetryConfig::default();
    let result: Result<&str, RetryError<String>> =
        with_retry(&config, || async { Ok("success") }).await;
    assert_eq!(result.unwrap(), "success");
}

#[tokio::test]
async fn test_retry_succeeds_on_last_attempt() {
    let counter = Arc::new(AtomicU32::new(0));
    let config = RetryConfig::fixed(20, Duration::from_millis(1));

    let counter_clone = counter.clone();
    let result: Result<&str, RetryError<String>> = with_retry(&config, move || {
        let c = counter_clone.clone();
        async move {
            let attempt = c.fetch_add(1, Ordering::SeqCst);
            if attempt < 19 {
                Err("registry unreachable".to_string())
            } else {
                Ok("resolved")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "resolved");
    assert_eq!(counter.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_retry_exhausted() {
    let counter = Arc::new(AtomicU32::new(0));
    let config = RetryConfig::fixed(3, Duration::from_millis(1));

    let counter_clone = counter.clone();
    let result: Result<&str, RetryError<String>> = with_retry(&config, move || {
        counter_clone.fetch_add(1, Ordering::SeqCst);
        async { Err("always fails".to_string()) }
    })
    .await;

    match result {
        Err(RetryError::ExhaustedRetries {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error, "always fails");
        }
        Ok(_) => panic!("ExhaustedRetries エラーが期待される"),
    }
    // 上限を超えて呼び出されないこと
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_attempts_runs_once() {
    let counter = Arc::new(AtomicU32::new(0));
    let config = RetryConfig::fixed(0, Duration::from_millis(1));

    let counter_clone = counter.clone();
    let result: Result<(), RetryError<String>> = with_retry(&config, move || {
        counter_clone.fetch_add(1, Ordering::SeqCst);
        async { Err("fails".to_string()) }
    })
    .await;

    assert_eq!(result.unwrap_err().into_last_error(), "fails");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_sleep_after_final_attempt() {
    let config = RetryConfig::fixed(2, Duration::from_millis(200));
    let started = Instant::now();
    let _: Result<(), RetryError<String>> =
        with_retry(&config, || async { Err("fails".to_string()) }).await;
    // 試行間の 1 回分だけ待機する
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(400));
}

#[test]
fn test_fixed_delay_is_constant() {
    let config = RetryConfig::fixed(20, Duration::from_secs(1));
    for attempt in 0..20 {
        assert_eq!(config.compute_delay(attempt), Duration::from_secs(1));
    }
}

#[test]
fn test_compute_delay_exponential() {
    let config =
        RetryConfig::exponential(5, Duration::from_millis(100), Duration::from_secs(30))
            .with_jitter(false);

    assert_eq!(config.compute_delay(0).as_millis(), 100);
    assert_eq!(config.compute_delay(1).as_millis(), 200);
    assert_eq!(config.compute_delay(2).as_millis(), 400);
}

#[test]
fn test_compute_delay_capped_by_max_delay() {
    let config =
        RetryConfig::exponential(10, Duration::from_millis(100), Duration::from_millis(500))
            .with_jitter(false);

    assert_eq!(config.compute_delay(5), Duration::from_millis(500));
    // 巨大な試行回数でもオーバーフローしない
    assert_eq!(config.compute_delay(u32::MAX), Duration::from_millis(500));
}

#[test]
fn test_compute_delay_jitter_within_ten_percent() {
    let config = RetryConfig::fixed(3, Duration::from_millis(1000)).with_jitter(true);

    for _ in 0..50 {
        let d = config.compute_delay(0).as_millis();
        assert!((900..=1100).contains(&d), "delay out of range: {d}");
    }
}
