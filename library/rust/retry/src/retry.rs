use crate::error::RetryError;
use crate::policy::RetryConfig;
use std::future::Future;

/// `operation` を最大 `config.max_attempts` 回実行する。
///
/// 試行間では `compute_delay` だけ待機し、最終試行の後は待機しない。
/// `max_attempts` が 0 の場合も 1 回は実行する。
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    error = %e,
                    "retry attempt failed"
                );
                if attempt + 1 >= max_attempts {
                    return Err(RetryError::ExhaustedRetries {
                        attempts: max_attempts,
                        last_error: e,
                    });
                }
                tokio::time::sleep(config.compute_delay(attempt)).await;
                attempt += 1;
            }
        }
    }
}
