// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use orderflow::{FailureClass, PlacementError, PlacementFailure, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Store Error: {0}")]
  Store(#[from] StoreError),

  #[error("{0}")]
  Placement(#[from] PlacementFailure),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

fn placement_status(failure: &PlacementFailure) -> StatusCode {
  match failure.reason.class() {
    FailureClass::Invalid => StatusCode::BAD_REQUEST,
    FailureClass::OutOfStock => StatusCode::CONFLICT,
    FailureClass::Retryable => StatusCode::SERVICE_UNAVAILABLE,
    FailureClass::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn placement_response(failure: &PlacementFailure) -> HttpResponse {
  let status = placement_status(failure);
  let mut builder = HttpResponse::build(status);
  match &failure.reason {
    PlacementError::OutOfStock { lines } => {
      tracing::info!(insufficient = lines.len(), "Order rejected: insufficient stock.");
      builder.json(json!({
        "error": "Insufficient stock for one or more products.",
        "insufficientLines": lines,
      }))
    }
    reason if reason.is_business_outcome() => {
      tracing::info!(reason = %reason, "Order request rejected.");
      builder.json(json!({"error": reason.to_string()}))
    }
    reason if reason.is_retryable() => {
      tracing::warn!(reason = %reason, "Order placement failed; nothing was kept.");
      builder
        .insert_header(("Retry-After", "1"))
        .json(json!({"error": "Order could not be placed right now. Please retry.", "retryable": true}))
    }
    reason => {
      // Full detail stays in the logs and the operator channel.
      tracing::error!(
        reason = %reason,
        partially_applied = failure.partially_applied,
        "Order placement failed with an internal fault."
      );
      builder.json(json!({"error": "Order could not be completed. Support has been notified."}))
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Store(StoreError::Timeout { .. }) | AppError::Store(StoreError::Unavailable(_)) => {
        StatusCode::SERVICE_UNAVAILABLE
      }
      AppError::Placement(failure) => placement_status(failure),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Store(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    match self {
      AppError::Placement(failure) => placement_response(failure),
      AppError::Validation(m) | AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => {
        tracing::info!(application_error = %self, "Responding with client error");
        HttpResponse::build(status).json(json!({"error": m}))
      }
      AppError::Config(m) => {
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::build(status).json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Sqlx(_) | AppError::Store(_) => {
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::build(status).json(json!({"error": "Database operation failed"}))
      }
      AppError::Internal(_) => {
        tracing::error!(application_error = %self, "Responding with error");
        HttpResponse::build(status).json(json!({"error": "An internal error occurred"}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use orderflow::{InsufficientLine, OrderId, ProductId, Reservation};
  use std::time::Duration;

  fn status_of(reason: PlacementError, partially_applied: bool) -> StatusCode {
    AppError::from(PlacementFailure {
      reason,
      partially_applied,
    })
    .error_response()
    .status()
  }

  #[test]
  fn validation_failures_are_bad_requests() {
    assert_eq!(
      status_of(PlacementError::MissingField { field: "userPaymentId" }, false),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(status_of(PlacementError::EmptyCart, false), StatusCode::BAD_REQUEST);
    assert_eq!(
      status_of(
        PlacementError::DuplicateProduct {
          product_id: ProductId(3)
        },
        false
      ),
      StatusCode::BAD_REQUEST
    );
  }

  #[test]
  fn out_of_stock_is_a_conflict() {
    let reason = PlacementError::OutOfStock {
      lines: vec![InsufficientLine {
        product_id: ProductId(1),
        requested: 3,
        available: 2,
      }],
    };
    assert_eq!(status_of(reason, false), StatusCode::CONFLICT);
  }

  #[test]
  fn transient_failures_are_retryable() {
    let unavailable = PlacementError::StoreUnavailable {
      operation: "conditional_decrement",
      source: StoreError::Timeout {
        operation: "conditional_decrement",
        after: Duration::from_secs(2),
      },
    };
    let response = AppError::from(PlacementFailure::clean(unavailable)).error_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key("Retry-After"));

    assert_eq!(
      status_of(
        PlacementError::ReservationFailed {
          product_id: ProductId(1),
          requested: 1
        },
        false
      ),
      StatusCode::SERVICE_UNAVAILABLE
    );
  }

  #[test]
  fn leaks_are_internal_errors() {
    let reason = PlacementError::ReservationLeak {
      leaked: vec![Reservation {
        product_id: ProductId(1),
        quantity: 2,
      }],
      indeterminate: Vec::new(),
      orphaned_order: Some(OrderId(9)),
      header_indeterminate: false,
      cause: "increment refused".to_string(),
    };
    assert_eq!(status_of(reason, true), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn plain_errors_keep_their_status() {
    assert_eq!(AppError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
      AppError::Store(StoreError::Unavailable("pool closed".into())).status_code(),
      StatusCode::SERVICE_UNAVAILABLE
    );
  }
}
