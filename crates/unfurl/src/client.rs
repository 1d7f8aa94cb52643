//! Retrying HTTP GET utility.
//!
//! Transport-level failures are retried a bounded number of times with
//! a fixed delay; when the budget is exhausted all attempt errors are
//! aggregated into one [`UnfurlError::RetriesExhausted`]. Non-success
//! statuses are not retried here - callers decide what a status means.

use crate::error::UnfurlError;
use std::time::Duration;
use tracing::debug;

/// Number of attempts before giving up
pub const RETRY_ATTEMPTS: usize = 3;

/// Fixed delay between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Issue a GET request, retrying transport failures.
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, UnfurlError> {
    let mut errors = Vec::new();

    for attempt in 1..=RETRY_ATTEMPTS {
        if attempt > 1 {
            tokio::time::sleep(RETRY_DELAY).await;
        }

        match client.get(url).send().await {
            Ok(response) => return Ok(response),
            Err(err) => {
                debug!(url, attempt, error = %err, "GET attempt failed");
                errors.push(err.to_string());
            }
        }
    }

    Err(UnfurlError::RetriesExhausted {
        attempts: RETRY_ATTEMPTS,
        errors,
    })
}
