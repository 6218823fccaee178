// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use orderflow::{AddressId, Order, OrderId, PaymentId, UserId};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub order_id: i64,
  pub user_id: i64,
  pub total_price_cents: i64,
  pub user_payment_id: i64,
  pub shipping_address_id: i64,
  pub billing_address_id: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
  fn from(row: OrderRow) -> Self {
    Order {
      order_id: OrderId(row.order_id),
      user_id: UserId(row.user_id),
      total_price_cents: row.total_price_cents,
      user_payment_id: PaymentId(row.user_payment_id),
      shipping_address_id: AddressId(row.shipping_address_id),
      billing_address_id: AddressId(row.billing_address_id),
      created_at: row.created_at,
      updated_at: row.updated_at,
    }
  }
}

#[derive(Debug, Clone, FromRow)]
pub struct OrderItemRow {
  pub order_item_id: i64,
  pub order_id: i64,
  pub product_id: i64,
  pub quantity: i32,
}
