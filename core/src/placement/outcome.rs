// orderflow/src/placement/outcome.rs

//! Requests, results and the failure taxonomy of order placement.

use crate::error::{FlowError, StoreError};
use crate::model::{AddressId, CartLine, LineItemId, OrderId, PaymentId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything `place_order` needs. `user_id` is trusted (already authenticated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
  pub user_id: UserId,
  /// Caller-computed total; not recomputed here.
  pub total_price_cents: i64,
  pub user_payment_id: Option<PaymentId>,
  pub shipping_address_id: Option<AddressId>,
  pub billing_address_id: Option<AddressId>,
  pub cart_lines: Vec<CartLine>,
}

/// A line the inventory could not cover. `available` is 0 for unknown products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientLine {
  pub product_id: ProductId,
  pub requested: u32,
  pub available: u32,
}

/// Stock taken from the inventory on behalf of one checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
  pub product_id: ProductId,
  pub quantity: u32,
}

impl From<CartLine> for Reservation {
  fn from(line: CartLine) -> Self {
    Self {
      product_id: line.product_id,
      quantity: line.quantity,
    }
  }
}

#[derive(Debug, Error)]
pub enum PlacementError {
  #[error("Missing required field: {field}")]
  MissingField { field: &'static str },

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Invalid quantity {quantity} for product {product_id}")]
  InvalidQuantity { product_id: ProductId, quantity: u32 },

  #[error("Product {product_id} appears more than once in the cart")]
  DuplicateProduct { product_id: ProductId },

  #[error("Insufficient stock for {} product(s)", .lines.len())]
  OutOfStock { lines: Vec<InsufficientLine> },

  #[error("Store unavailable during '{operation}': {source}")]
  StoreUnavailable {
    operation: &'static str,
    #[source]
    source: StoreError,
  },

  #[error("Stock for product {product_id} changed before {requested} unit(s) could be reserved")]
  ReservationFailed { product_id: ProductId, requested: u32 },

  #[error(
    "Reservation leak: {} reservation(s) not released, {} of unknown outcome, orphaned order {:?}: {cause}",
    .leaked.len(),
    .indeterminate.len(),
    .orphaned_order
  )]
  ReservationLeak {
    /// Applied decrements that could not be released.
    leaked: Vec<Reservation>,
    /// Decrements that timed out and may have landed.
    indeterminate: Vec<Reservation>,
    orphaned_order: Option<OrderId>,
    /// The header insert timed out and may have committed a row nobody can address.
    header_indeterminate: bool,
    cause: String,
  },

  #[error("Placement flow error: {0}")]
  Flow(#[from] FlowError),
}

/// How a failure should be treated by whoever called `place_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
  /// The request itself was unusable (missing field, empty cart, ...).
  Invalid,
  /// Expected business outcome: not enough stock.
  OutOfStock,
  /// Transient; every write was undone and the caller may try again.
  Retryable,
  /// Data-integrity violation or internal fault needing an operator.
  Fatal,
}

impl PlacementError {
  pub(crate) fn store(operation: &'static str, source: StoreError) -> Self {
    PlacementError::StoreUnavailable { operation, source }
  }

  pub fn class(&self) -> FailureClass {
    match self {
      PlacementError::MissingField { .. }
      | PlacementError::EmptyCart
      | PlacementError::InvalidQuantity { .. }
      | PlacementError::DuplicateProduct { .. } => FailureClass::Invalid,
      PlacementError::OutOfStock { .. } => FailureClass::OutOfStock,
      PlacementError::StoreUnavailable { .. } | PlacementError::ReservationFailed { .. } => FailureClass::Retryable,
      PlacementError::ReservationLeak { .. } | PlacementError::Flow(_) => FailureClass::Fatal,
    }
  }

  /// True for outcomes that are valid business states rather than faults.
  pub fn is_business_outcome(&self) -> bool {
    matches!(self.class(), FailureClass::Invalid | FailureClass::OutOfStock)
  }

  pub fn is_retryable(&self) -> bool {
    self.class() == FailureClass::Retryable
  }
}

/// A successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
  pub order_id: OrderId,
  /// In cart submission order.
  pub line_item_ids: Vec<LineItemId>,
}

#[derive(Debug, Error)]
#[error("Order placement failed: {reason}")]
pub struct PlacementFailure {
  #[source]
  pub reason: PlacementError,
  /// True when some write could not be undone or may have landed unseen
  /// (a `ReservationLeak`).
  pub partially_applied: bool,
}

impl PlacementFailure {
  /// A failure that left no trace in either store.
  pub fn clean(reason: PlacementError) -> Self {
    Self {
      reason,
      partially_applied: false,
    }
  }
}

pub type PlacementResult = Result<PlacedOrder, PlacementFailure>;
