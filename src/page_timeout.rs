//! Timeout utilities for page operations
//!
//! Every navigation and selector query carries its own deadline; there is no
//! batch-wide timeout.

use std::future::Future;
use std::time::Duration;

use crate::page_driver::DriverError;

/// Wrap an async page operation with an explicit timeout
///
/// Distinguishes the deadline being hit (`DriverError::Timeout`) from the
/// operation failing on its own.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Deadline for the whole operation
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(DriverError::Timeout {
            operation: operation_name.to_string(),
            timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_deadline_reports_operation_name() {
        let result: Result<(), _> = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            },
            Duration::from_millis(10),
            "Page navigation",
        )
        .await;

        match result {
            Err(DriverError::Timeout { operation, .. }) => assert_eq!(operation, "Page navigation"),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn inner_error_passes_through() {
        let result: Result<(), _> = with_page_timeout(
            async { Err(DriverError::Navigation("net::ERR_CONNECTION_REFUSED".into())) },
            Duration::from_secs(1),
            "Selector query",
        )
        .await;

        assert!(matches!(result, Err(DriverError::Navigation(_))));
    }
}
