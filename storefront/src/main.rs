// storefront/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::db::{PgInventoryStore, PgOrderStore};
use crate::services::operator_alerts::PgLeakReporter;
use crate::state::AppState;
use crate::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use orderflow::{InventoryStore, OrderPlacer, OrderStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let db_pool = match PgPoolOptions::new()
    .max_connections(app_config.db_max_connections)
    .acquire_timeout(app_config.placement.store_timeout)
    .connect(&app_config.database_url)
    .await
  {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string()));
    }
  };

  if app_config.run_migrations {
    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
      tracing::error!(error = %e, "Failed to apply database migrations.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
    tracing::info!("Database migrations applied.");
  }

  let inventory: Arc<dyn InventoryStore> = Arc::new(PgInventoryStore::new(db_pool.clone()));
  let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(db_pool.clone()));
  let placer = OrderPlacer::new(inventory, orders.clone())
    .with_config(app_config.placement.clone())
    .with_leak_reporter(Arc::new(PgLeakReporter::new(db_pool.clone())));

  let app_state = AppState {
    db_pool,
    placer,
    orders,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!(
    store_timeout = ?app_config.placement.store_timeout,
    compensation_attempts = app_config.placement.compensation.max_attempts,
    "Attempting to bind server to {}...",
    server_address
  );

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
