// orderflow/src/placement/leak.rs

//! Operator channel for writes that compensation could not undo.

use crate::model::{OrderId, UserId};
use crate::placement::outcome::Reservation;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

/// Everything an operator needs to repair stock or remove an orphaned order by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakReport {
  pub user_id: UserId,
  pub failed_step: String,
  pub cause: String,
  /// Decrements that were applied and could not be released.
  pub leaked: Vec<Reservation>,
  /// Decrements whose outcome is unknown (the call timed out). Not released.
  pub indeterminate: Vec<Reservation>,
  /// Order header that could not be deleted.
  pub orphaned_order: Option<OrderId>,
  /// The header insert timed out; a row for `user_id` with no line items may exist.
  pub header_indeterminate: bool,
  pub reported_at: DateTime<Utc>,
}

impl LeakReport {
  /// True when the report carries a confirmed inconsistency, not just
  /// writes of unknown outcome.
  pub fn is_confirmed_leak(&self) -> bool {
    !self.leaked.is_empty() || self.orphaned_order.is_some()
  }
}

#[async_trait]
pub trait LeakReporter: Send + Sync {
  /// Must not fail: implementations that forward somewhere fallible log
  /// their own delivery errors.
  async fn report(&self, report: &LeakReport);
}

/// Logs every report at `error` level under the `orderflow::operator` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLeakReporter;

#[async_trait]
impl LeakReporter for TracingLeakReporter {
  async fn report(&self, report: &LeakReport) {
    error!(
      target: "orderflow::operator",
      user_id = %report.user_id,
      failed_step = %report.failed_step,
      leaked = ?report.leaked,
      indeterminate = ?report.indeterminate,
      orphaned_order = ?report.orphaned_order,
      header_indeterminate = report.header_indeterminate,
      cause = %report.cause,
      "Order placement left inventory or orders inconsistent; manual repair required."
    );
  }
}
