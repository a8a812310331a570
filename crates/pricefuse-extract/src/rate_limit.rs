//! Retry utilities for collaborator calls (LLM, partner APIs).
//!
//! Transient failures (429, 5xx, transport errors) are retried with
//! exponential backoff; everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ExtractError;

/// Upper bound on a single backoff sleep.
pub(crate) const MAX_BACKOFF_SECS: u64 = 10;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable: [`ExtractError::RateLimited`], [`ExtractError::Http`] and
/// [`ExtractError::UnexpectedStatus`] with a 5xx status. Malformed payloads,
/// 4xx statuses and local errors are not retried.
fn is_retriable(err: &ExtractError) -> bool {
    match err {
        ExtractError::RateLimited { .. } | ExtractError::Http(_) => true,
        ExtractError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// The sleep before retry `n` (1-based) is
/// `min(backoff_base_secs * 2^(n-1), MAX_BACKOFF_SECS)` seconds, or the
/// server's `Retry-After` when that is longer. With `max_retries = 2` the
/// operation runs at most 3 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ExtractError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ExtractError>>,
{
    let mut last_err;
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                last_err = err;
            }
        }

        let mut delay_secs = backoff_base_secs
            .saturating_mul(1u64 << attempt.min(62))
            .min(MAX_BACKOFF_SECS);
        if let ExtractError::RateLimited {
            retry_after_secs, ..
        } = &last_err
        {
            delay_secs = delay_secs.max((*retry_after_secs).min(MAX_BACKOFF_SECS));
        }
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %last_err,
            "transient collaborator error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// Runs `retry_with_backoff` over a scripted sequence of results and
    /// returns the final result together with the number of calls made.
    async fn run_script(
        max_retries: u32,
        script: Vec<Result<u32, ExtractError>>,
    ) -> (Result<u32, ExtractError>, u32) {
        let calls = AtomicU32::new(0);
        let script = std::sync::Mutex::new(script.into_iter());
        let result = retry_with_backoff(max_retries, 0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            let next = script.lock().unwrap().next().unwrap_or(Ok(0));
            async move { next }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    fn status(code: u16) -> ExtractError {
        ExtractError::UnexpectedStatus {
            status: code,
            url: "https://api.example.com/v1/chat".to_owned(),
        }
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let (result, calls) = run_script(3, vec![Ok(7)]).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn rate_limits_are_retried_until_success() {
        let limited = || ExtractError::RateLimited {
            domain: "api.example.com".to_owned(),
            retry_after_secs: 0,
        };
        let (result, calls) = run_script(3, vec![Err(limited()), Err(limited()), Ok(99)]).await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn server_errors_are_retried_up_to_the_limit() {
        let (result, calls) = run_script(2, vec![Err(status(503)), Err(status(502)), Err(status(500))]).await;
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(ExtractError::UnexpectedStatus { status: 500, .. })));
    }

    #[tokio::test]
    async fn client_errors_fail_fast() {
        let (result, calls) = run_script(3, vec![Err(status(401))]).await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ExtractError::UnexpectedStatus { status: 401, .. })));
    }

    #[tokio::test]
    async fn malformed_payloads_fail_fast() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let (result, calls) = run_script(
            3,
            vec![Err(ExtractError::Deserialize {
                context: "chat completion".to_owned(),
                source,
            })],
        )
        .await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(ExtractError::Deserialize { .. })));
    }
}
