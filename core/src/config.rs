// orderflow/src/config.rs

use crate::retry::RetryPolicy;
use std::time::Duration;

/// Tuning for an [`OrderPlacer`](crate::OrderPlacer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConfig {
  /// Upper bound on every single store call. A timed-out call fails its step.
  pub store_timeout: Duration,
  /// Retry schedule for releasing reservations and deleting a half-written order.
  pub compensation: RetryPolicy,
}

impl Default for PlacementConfig {
  fn default() -> Self {
    Self {
      store_timeout: Duration::from_secs(2),
      compensation: RetryPolicy::default(),
    }
  }
}

impl PlacementConfig {
  pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
    self.store_timeout = store_timeout;
    self
  }

  pub fn with_compensation(mut self, compensation: RetryPolicy) -> Self {
    self.compensation = compensation;
    self
  }
}
