// storefront/src/state.rs
use crate::config::AppConfig;
use orderflow::{OrderPlacer, OrderStore};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub placer: OrderPlacer,
  /// Read side of the order routes; the same store the placer writes to.
  pub orders: Arc<dyn OrderStore>,
  pub config: Arc<AppConfig>,
}
