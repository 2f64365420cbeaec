//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::error::AgentLabError;

/// Fail with [`AgentLabError::Timeout`] if `future` does not finish within `duration`.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AgentLabError>>,
) -> Result<T, AgentLabError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AgentLabError::Timeout(duration.as_millis() as u64)),
    }
}
