// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;
use crate::web::handlers::order_handlers;

/// Reports `degraded` (still 200) when the database does not answer.
async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  let store_timeout_ms = app_state.config.placement.store_timeout.as_millis() as u64;
  match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => HttpResponse::Ok().json(json!({ "status": "ok", "storeTimeoutMs": store_timeout_ms })),
    Err(e) => {
      warn!(error = %e, "Health check could not reach the database.");
      HttpResponse::Ok().json(json!({
        "status": "degraded",
        "database": "unreachable",
        "storeTimeoutMs": store_timeout_ms
      }))
    }
  }
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/user/{user_id}", web::get().to(order_handlers::list_user_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}", web::put().to(order_handlers::update_order_handler))
          .route("/{order_id}", web::delete().to(order_handlers::delete_order_handler)),
      ),
  );
}
