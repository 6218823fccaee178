// orderflow/src/validator.rs

//! Read-only stock check for a cart.

use crate::model::{CartLine, ProductId};
use crate::placement::outcome::{InsufficientLine, PlacementError};
use crate::store::{with_timeout, InventoryStore};
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, instrument, Level};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
  /// True iff every line can be covered by current stock.
  pub ok: bool,
  /// In cart order.
  pub insufficient_lines: Vec<InsufficientLine>,
  /// `available - requested` per sufficient product. Only meaningful when `ok`.
  pub post_decrement_quantities: BTreeMap<ProductId, u32>,
}

impl ValidationResult {
  /// Pairs each cart line with the quantity read for it (`None` = unknown product).
  pub fn assess(cart_lines: &[CartLine], available: &[Option<u32>]) -> Self {
    let mut insufficient_lines = Vec::new();
    let mut post_decrement_quantities = BTreeMap::new();

    for (line, available) in cart_lines.iter().zip(available) {
      match *available {
        Some(available) if available >= line.quantity => {
          post_decrement_quantities.insert(line.product_id, available - line.quantity);
        }
        other => insufficient_lines.push(InsufficientLine {
          product_id: line.product_id,
          requested: line.quantity,
          available: other.unwrap_or(0),
        }),
      }
    }

    Self {
      ok: insufficient_lines.is_empty(),
      insufficient_lines,
      post_decrement_quantities,
    }
  }
}

/// Decides whether a cart fits current stock. Never writes.
///
/// The answer is advisory: stock can move between validation and reservation,
/// which is why reservation re-checks with a conditional decrement.
#[derive(Clone)]
pub struct InventoryValidator {
  inventory: Arc<dyn InventoryStore>,
  store_timeout: Duration,
}

impl InventoryValidator {
  pub fn new(inventory: Arc<dyn InventoryStore>, store_timeout: Duration) -> Self {
    Self {
      inventory,
      store_timeout,
    }
  }

  /// Reads every referenced product concurrently, each read bounded by the
  /// store timeout. Any failed or timed-out read is `StoreUnavailable`.
  #[instrument(name = "InventoryValidator::validate", skip_all, fields(lines = cart_lines.len()))]
  pub async fn validate(&self, cart_lines: &[CartLine]) -> Result<ValidationResult, PlacementError> {
    let reads = cart_lines.iter().map(|line| {
      with_timeout(
        "get_quantity",
        self.store_timeout,
        self.inventory.get_quantity(line.product_id),
      )
    });
    let available = try_join_all(reads)
      .await
      .map_err(|source| PlacementError::store("get_quantity", source))?;

    let result = ValidationResult::assess(cart_lines, &available);
    for line in &result.insufficient_lines {
      event!(
        Level::INFO,
        product_id = %line.product_id,
        requested = line.requested,
        available = line.available,
        "Insufficient stock."
      );
    }
    Ok(result)
  }
}
