// storefront/src/services/operator_alerts.rs

//! Operator channel backed by the `reservation_leaks` table.

use async_trait::async_trait;
use orderflow::{LeakReport, LeakReporter, TracingLeakReporter};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{error, instrument};

/// Logs every report, then records it for follow-up. A failed insert is
/// logged with the full report so nothing is lost.
#[derive(Clone)]
pub struct PgLeakReporter {
  pool: PgPool,
}

impl PgLeakReporter {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl LeakReporter for PgLeakReporter {
  #[instrument(name = "operator::report_leak", skip_all, fields(user_id = %report.user_id, step = %report.failed_step))]
  async fn report(&self, report: &LeakReport) {
    TracingLeakReporter.report(report).await;

    let inserted = sqlx::query(
      "INSERT INTO reservation_leaks (user_id, failed_step, cause, confirmed, orphaned_order, report, reported_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(report.user_id.0)
    .bind(&report.failed_step)
    .bind(&report.cause)
    .bind(report.is_confirmed_leak())
    .bind(report.orphaned_order.map(|order_id| order_id.0))
    .bind(Json(report))
    .bind(report.reported_at)
    .execute(&self.pool)
    .await;

    if let Err(e) = inserted {
      error!(
        target: "orderflow::operator",
        error = %e,
        report = ?report,
        "Failed to persist leak report."
      );
    }
  }
}
