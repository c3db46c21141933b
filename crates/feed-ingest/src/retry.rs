use ingest_core::IngestError;
use std::future::Future;
use std::time::Duration;

/// Run `op` up to `max_attempts` times, sleeping `base_delay * attempt`
/// between attempts (linear backoff scaled by attempt index). Only
/// transient errors are retried; exhausting the budget surfaces the last
/// error to the caller, which decides whether the unit is skipped.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, IngestError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, IngestError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = base_delay * attempt;
                tracing::warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:.1}s",
                    label,
                    attempt,
                    max_attempts,
                    err,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::warn!("{}: giving up after attempt {}: {}", label, attempt, err);
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", 3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, IngestError>(42) }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry("test", 3, Duration::from_millis(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(IngestError::Upstream("connection reset".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausting_attempts_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", 3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(IngestError::Upstream("timed out".into())) }
        })
        .await;

        assert!(matches!(result, Err(IngestError::Upstream(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("test", 3, Duration::from_millis(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(IngestError::Malformed("bad record".into())) }
        })
        .await;

        assert!(matches!(result, Err(IngestError::Malformed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
