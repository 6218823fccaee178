// storefront/src/web/auth.rs

use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use orderflow::UserId;
use tracing::warn;

use crate::errors::AppError;

/// Identity of the caller. Placeholder: trusts an `X-User-ID` header holding
/// a positive integer. A real deployment resolves this from a session or token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_id: UserId,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let parsed = req
      .headers()
      .get("X-User-ID")
      .and_then(|value| value.to_str().ok())
      .and_then(|raw| raw.trim().parse::<i64>().ok())
      .filter(|id| *id > 0);

    match parsed {
      Some(id) => ready(Ok(AuthenticatedUser { user_id: UserId(id) })),
      None => {
        warn!("AuthenticatedUser extractor: Missing or invalid X-User-ID header.");
        ready(Err(AppError::Auth(
          "User authentication required. Missing or invalid X-User-ID header.".to_string(),
        )))
      }
    }
  }
}
