// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::GatewayError;
use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{error, warn};

pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_INITIAL_DELAY_MS: u64 = 500;

pub enum RetryError<E> {
    Failure(E),
    Retry(E),
}

/// Retries an async operation with exponential backoff
///
/// # Arguments
/// * `operation` - Async function to retry
/// * `max_attempts` - Maximum number of attempts including the first one
/// * `initial_delay_ms` - Initial delay between retries in milliseconds
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation: F,
    max_attempts: u32,
    initial_delay_ms: u64,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RetryError<E>>>,
    E: std::fmt::Display,
{
    let mut current_attempt = 1;
    let mut delay_ms = initial_delay_ms;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(RetryError::Retry(e)) => {
                if current_attempt >= max_attempts {
                    error!(
                        "Operation failed after {} attempts. Last error: {}",
                        max_attempts, e
                    );
                    return Err(e);
                }

                warn!(
                    "Attempt {}/{} failed, retrying in {}ms: {}",
                    current_attempt, max_attempts, delay_ms, e
                );

                sleep(Duration::from_millis(delay_ms)).await;
                current_attempt += 1;
                delay_ms *= 2;
            }
            Err(RetryError::Failure(e)) => return Err(e),
        }
    }
}

/// Run a contract read, retrying only transient gateway failures
pub async fn call_with_retry<F, Fut, T>(operation_name: &str, read_fn: F) -> Result<T, GatewayError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    retry_with_backoff(
        || {
            let fut = read_fn();
            async move {
                fut.await.map_err(|e| {
                    if e.is_transient() {
                        warn!("{}: transient error: {}", operation_name, e);
                        RetryError::Retry(e)
                    } else {
                        RetryError::Failure(e)
                    }
                })
            }
        },
        RETRY_MAX_ATTEMPTS,
        RETRY_INITIAL_DELAY_MS,
    )
    .await
}
