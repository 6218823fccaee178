// orderflow/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the flow engine itself rather than by step handlers.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Error in handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;

/// Failure of a single Inventory Store or Order Store call.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store call '{operation}' timed out after {after:?}")]
  Timeout { operation: &'static str, after: Duration },

  #[error("store unavailable: {0}")]
  Unavailable(String),

  #[error("store backend error: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },
}

impl StoreError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, StoreError::Timeout { .. })
  }
}

impl From<AnyhowError> for StoreError {
  fn from(err: AnyhowError) -> Self {
    StoreError::Backend { source: err }
  }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
