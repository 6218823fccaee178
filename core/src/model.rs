// orderflow/src/model.rs

//! Identifiers and records shared by the stores, the validator and the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }

    impl From<i64> for $name {
      fn from(raw: i64) -> Self {
        $name(raw)
      }
    }
  };
}

id_type!(
  /// Catalog product key.
  ProductId
);
id_type!(UserId);
id_type!(
  /// Assigned by the Order Store at insert time; immutable afterwards.
  OrderId
);
id_type!(LineItemId);
id_type!(
  /// Opaque reference to a stored payment method. Settlement happens elsewhere.
  PaymentId
);
id_type!(AddressId);

/// One product/quantity pair submitted for checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: ProductId,
  pub quantity: u32,
}

impl CartLine {
  pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
    Self {
      product_id: product_id.into(),
      quantity,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
  pub product_id: ProductId,
  pub available_quantity: u32,
}

/// Header fields the orchestrator writes; the store fills in id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  pub user_id: UserId,
  pub total_price_cents: i64,
  pub user_payment_id: PaymentId,
  pub shipping_address_id: AddressId,
  pub billing_address_id: AddressId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub order_id: OrderId,
  pub user_id: UserId,
  pub total_price_cents: i64,
  pub user_payment_id: PaymentId,
  pub shipping_address_id: AddressId,
  pub billing_address_id: AddressId,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn from_new(order_id: OrderId, header: &NewOrder, at: DateTime<Utc>) -> Self {
    Self {
      order_id,
      user_id: header.user_id,
      total_price_cents: header.total_price_cents,
      user_payment_id: header.user_payment_id,
      shipping_address_id: header.shipping_address_id,
      billing_address_id: header.billing_address_id,
      created_at: at,
      updated_at: at,
    }
  }
}

/// Header fields that may change after placement. `None` leaves a field as it is.
/// Line items and the owning user are fixed once the order exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
  pub total_price_cents: Option<i64>,
  pub user_payment_id: Option<PaymentId>,
  pub shipping_address_id: Option<AddressId>,
  pub billing_address_id: Option<AddressId>,
}

impl OrderUpdate {
  pub fn is_empty(&self) -> bool {
    self.total_price_cents.is_none()
      && self.user_payment_id.is_none()
      && self.shipping_address_id.is_none()
      && self.billing_address_id.is_none()
  }

  pub fn apply(&self, order: &mut Order, at: DateTime<Utc>) {
    if let Some(total) = self.total_price_cents {
      order.total_price_cents = total;
    }
    if let Some(payment) = self.user_payment_id {
      order.user_payment_id = payment;
    }
    if let Some(shipping) = self.shipping_address_id {
      order.shipping_address_id = shipping;
    }
    if let Some(billing) = self.billing_address_id {
      order.billing_address_id = billing;
    }
    order.updated_at = at;
  }
}

/// `order_id` is a back-reference; the item lives and dies with its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
  pub order_item_id: LineItemId,
  pub order_id: OrderId,
  pub product_id: ProductId,
  pub quantity: u32,
}
