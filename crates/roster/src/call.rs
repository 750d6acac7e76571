//! Per-call time limits for external lookups.

use roster_data::{DataError, Result};
use std::future::Future;
use std::time::Duration;

/// Run `call`, turning an overrun of `limit` into [`DataError::Timeout`].
pub(crate) async fn with_timeout<T, F>(limit: Duration, operation: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| {
            Err(DataError::Timeout {
                operation: operation.to_string(),
                elapsed_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_limit() {
        let value = with_timeout(Duration::from_secs(5), "adding", async { Ok(1 + 1) })
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_overrun_becomes_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        };
        let err = with_timeout(Duration::from_millis(10), "sleeping", slow)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DataError::Timeout { ref operation, elapsed_ms: 10 } if operation == "sleeping"
        ));
    }
}
