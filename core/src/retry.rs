// orderflow/src/retry.rs

//! Bounded retry with exponential backoff, used by compensation.

use std::future::Future;
use std::time::Duration;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first. Treated as at least 1.
  pub max_attempts: u32,
  pub initial_backoff: Duration,
  pub max_backoff: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 5,
      initial_backoff: Duration::from_millis(50),
      max_backoff: Duration::from_secs(2),
    }
  }
}

impl RetryPolicy {
  /// Delay before retry number `retry` (1-based): `initial * 2^(retry-1)`, capped.
  pub fn backoff_for(&self, retry: u32) -> Duration {
    let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
    self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
  }
}

/// Calls `op` until it succeeds or `policy.max_attempts` is exhausted,
/// sleeping between attempts. Returns the last error on exhaustion.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, E>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: std::fmt::Display,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => {
        if attempt > 1 {
          event!(Level::INFO, %operation, attempt, "Succeeded after retry.");
        }
        return Ok(value);
      }
      Err(e) if attempt < max_attempts => {
        let delay = policy.backoff_for(attempt);
        event!(Level::WARN, %operation, attempt, ?delay, error = %e, "Attempt failed, backing off.");
        tokio::time::sleep(delay).await;
        attempt += 1;
      }
      Err(e) => {
        event!(Level::ERROR, %operation, attempts = attempt, error = %e, "Retries exhausted.");
        return Err(e);
      }
    }
  }
}
