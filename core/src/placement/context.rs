// orderflow/src/placement/context.rs

//! Per-invocation state shared by the placement flow's steps.

use crate::config::PlacementConfig;
use crate::model::{CartLine, LineItemId, NewOrder, OrderId, ProductId};
use crate::placement::outcome::{PlacementError, Reservation};
use crate::store::{InventoryStore, OrderStore};
use crate::validator::{InventoryValidator, ValidationResult};
use std::sync::Arc;

/// Injected collaborators. Cloned into every placement context.
#[derive(Clone)]
pub(crate) struct PlacementDeps {
  pub inventory: Arc<dyn InventoryStore>,
  pub orders: Arc<dyn OrderStore>,
  pub config: PlacementConfig,
}

impl PlacementDeps {
  pub fn validator(&self) -> InventoryValidator {
    InventoryValidator::new(self.inventory.clone(), self.config.store_timeout)
  }
}

pub(crate) struct PlacementCtx {
  pub deps: PlacementDeps,
  pub header: NewOrder,
  pub cart_lines: Vec<CartLine>,

  pub validation: Option<ValidationResult>,
  /// Set when the flow halts on a business outcome.
  pub rejection: Option<PlacementError>,

  /// Applied decrements not yet released. Compensation drains it; whatever
  /// remains afterwards has leaked.
  pub reserved: Vec<Reservation>,
  /// Decrements that timed out, so may or may not have landed.
  pub indeterminate: Vec<Reservation>,

  pub order_id: Option<OrderId>,
  /// The header insert timed out, so a row may exist without a known id.
  pub header_indeterminate: bool,
  pub order_removed: bool,
  pub line_item_ids: Vec<LineItemId>,
}

impl PlacementCtx {
  pub fn new(deps: PlacementDeps, header: NewOrder, cart_lines: Vec<CartLine>) -> Self {
    Self {
      deps,
      header,
      cart_lines,
      validation: None,
      rejection: None,
      reserved: Vec::new(),
      indeterminate: Vec::new(),
      order_id: None,
      header_indeterminate: false,
      order_removed: false,
      line_item_ids: Vec::new(),
    }
  }

  pub fn mark_released(&mut self, product_id: ProductId) {
    if let Some(idx) = self.reserved.iter().position(|r| r.product_id == product_id) {
      self.reserved.remove(idx);
    }
  }

  /// True when compensation left nothing behind and nothing may have landed unseen.
  pub fn fully_unwound(&self) -> bool {
    self.reserved.is_empty()
      && self.indeterminate.is_empty()
      && self.live_order().is_none()
      && !self.header_indeterminate
  }

  /// The order header, if it was created and not compensated away.
  pub fn live_order(&self) -> Option<OrderId> {
    self.order_id.filter(|_| !self.order_removed)
  }
}
