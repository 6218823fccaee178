// orderflow/src/store/mod.rs

//! Narrow contracts for the two stores the placement core depends on.
//!
//! Implementations own their connections and lifecycle; the core only ever
//! sees `Arc<dyn InventoryStore>` / `Arc<dyn OrderStore>`.

pub mod memory;

use crate::error::{StoreError, StoreResult};
use crate::model::{LineItemId, NewOrder, Order, OrderId, OrderLineItem, OrderUpdate, ProductId, UserId};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub use memory::{InMemoryInventory, InMemoryOrders};

#[async_trait]
pub trait InventoryStore: Send + Sync {
  /// Current available quantity, or `None` when the product is unknown.
  async fn get_quantity(&self, product_id: ProductId) -> StoreResult<Option<u32>>;

  /// Atomically subtracts `amount` iff `available >= amount` at the instant
  /// of the write. Returns `false` (record untouched) otherwise, including
  /// when the product no longer exists.
  async fn conditional_decrement(&self, product_id: ProductId, amount: u32) -> StoreResult<bool>;

  /// Adds `amount` back. Used to release reservations during compensation.
  async fn increment(&self, product_id: ProductId, amount: u32) -> StoreResult<()>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  async fn insert_order(&self, header: &NewOrder) -> StoreResult<OrderId>;

  async fn insert_line_item(&self, order_id: OrderId, product_id: ProductId, quantity: u32) -> StoreResult<LineItemId>;

  /// Removes an order and all of its line items. Returns `false` if it did not exist.
  async fn delete_order(&self, order_id: OrderId) -> StoreResult<bool>;

  async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>>;

  async fn line_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderLineItem>>;

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>>;

  /// Every order, newest first.
  async fn list_orders(&self) -> StoreResult<Vec<Order>>;

  /// Applies the set fields of `update` and bumps `updated_at`.
  /// Returns `None` if the order does not exist.
  async fn update_order(&self, order_id: OrderId, update: &OrderUpdate) -> StoreResult<Option<Order>>;
}

/// Bounds a store call. A call that outlives `limit` becomes `StoreError::Timeout`.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> StoreResult<T>
where
  F: Future<Output = StoreResult<T>>,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(result) => result,
    Err(_) => Err(StoreError::Timeout {
      operation,
      after: limit,
    }),
  }
}
