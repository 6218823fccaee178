// storefront/src/db/orders.rs

use crate::db::{quantity_from_db, quantity_to_db, store_error};
use crate::models::{OrderItemRow, OrderRow};
use async_trait::async_trait;
use orderflow::{
  LineItemId, NewOrder, Order, OrderId, OrderLineItem, OrderStore, OrderUpdate, ProductId, StoreResult, UserId,
};
use sqlx::PgPool;
use tracing::instrument;

const ORDER_COLUMNS: &str = "order_id, user_id, total_price_cents, user_payment_id, shipping_address_id, \
                             billing_address_id, created_at, updated_at";

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "db::insert_order", skip_all, fields(user_id = %header.user_id))]
  async fn insert_order(&self, header: &NewOrder) -> StoreResult<OrderId> {
    let order_id: i64 = sqlx::query_scalar(
      "INSERT INTO orders (user_id, total_price_cents, user_payment_id, shipping_address_id, billing_address_id) \
       VALUES ($1, $2, $3, $4, $5) RETURNING order_id",
    )
    .bind(header.user_id.0)
    .bind(header.total_price_cents)
    .bind(header.user_payment_id.0)
    .bind(header.shipping_address_id.0)
    .bind(header.billing_address_id.0)
    .fetch_one(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(OrderId(order_id))
  }

  #[instrument(name = "db::insert_line_item", skip(self), fields(order_id = %order_id, product_id = %product_id))]
  async fn insert_line_item(&self, order_id: OrderId, product_id: ProductId, quantity: u32) -> StoreResult<LineItemId> {
    let order_item_id: i64 = sqlx::query_scalar(
      "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3) RETURNING order_item_id",
    )
    .bind(order_id.0)
    .bind(product_id.0)
    .bind(quantity_to_db(quantity)?)
    .fetch_one(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(LineItemId(order_item_id))
  }

  /// `order_items` rows go with it (`ON DELETE CASCADE`).
  #[instrument(name = "db::delete_order", skip(self), fields(order_id = %order_id))]
  async fn delete_order(&self, order_id: OrderId) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
      .bind(order_id.0)
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(result.rows_affected() > 0)
  }

  #[instrument(name = "db::find_order", skip(self), fields(order_id = %order_id))]
  async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
      .bind(order_id.0)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    Ok(row.map(Order::from))
  }

  #[instrument(name = "db::line_items", skip(self), fields(order_id = %order_id))]
  async fn line_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderLineItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
      "SELECT order_item_id, order_id, product_id, quantity FROM order_items WHERE order_id = $1 ORDER BY order_item_id",
    )
    .bind(order_id.0)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;
    rows
      .into_iter()
      .map(|row| {
        Ok(OrderLineItem {
          order_item_id: LineItemId(row.order_item_id),
          order_id: OrderId(row.order_id),
          product_id: ProductId(row.product_id),
          quantity: quantity_from_db(row.quantity)?,
        })
      })
      .collect()
  }

  #[instrument(name = "db::orders_for_user", skip(self), fields(user_id = %user_id))]
  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, order_id DESC"
    ))
    .bind(user_id.0)
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(rows.into_iter().map(Order::from).collect())
  }

  #[instrument(name = "db::list_orders", skip(self))]
  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    let rows: Vec<OrderRow> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, order_id DESC"
    ))
    .fetch_all(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(rows.into_iter().map(Order::from).collect())
  }

  #[instrument(name = "db::update_order", skip(self, update), fields(order_id = %order_id))]
  async fn update_order(&self, order_id: OrderId, update: &OrderUpdate) -> StoreResult<Option<Order>> {
    let row: Option<OrderRow> = sqlx::query_as(&format!(
      "UPDATE orders SET \
         total_price_cents = COALESCE($2, total_price_cents), \
         user_payment_id = COALESCE($3, user_payment_id), \
         shipping_address_id = COALESCE($4, shipping_address_id), \
         billing_address_id = COALESCE($5, billing_address_id), \
         updated_at = NOW() \
       WHERE order_id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id.0)
    .bind(update.total_price_cents)
    .bind(update.user_payment_id.map(|id| id.0))
    .bind(update.shipping_address_id.map(|id| id.0))
    .bind(update.billing_address_id.map(|id| id.0))
    .fetch_optional(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(row.map(Order::from))
  }
}
