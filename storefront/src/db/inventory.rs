// storefront/src/db/inventory.rs

use crate::db::{quantity_from_db, quantity_to_db, store_error};
use async_trait::async_trait;
use orderflow::{InventoryStore, ProductId, StoreResult};
use sqlx::PgPool;
use tracing::instrument;

#[derive(Clone)]
pub struct PgInventoryStore {
  pool: PgPool,
}

impl PgInventoryStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
  #[instrument(name = "db::get_quantity", skip(self), fields(product_id = %product_id))]
  async fn get_quantity(&self, product_id: ProductId) -> StoreResult<Option<u32>> {
    let quantity: Option<i32> = sqlx::query_scalar("SELECT quantity FROM products WHERE product_id = $1")
      .bind(product_id.0)
      .fetch_optional(&self.pool)
      .await
      .map_err(store_error)?;
    quantity.map(quantity_from_db).transpose()
  }

  /// One statement: the `quantity >= $1` guard is evaluated under the row
  /// lock taken by the UPDATE, so two checkouts cannot both pass it.
  #[instrument(name = "db::conditional_decrement", skip(self), fields(product_id = %product_id))]
  async fn conditional_decrement(&self, product_id: ProductId, amount: u32) -> StoreResult<bool> {
    let result = sqlx::query(
      "UPDATE products SET quantity = quantity - $1, updated_at = NOW() WHERE product_id = $2 AND quantity >= $1",
    )
    .bind(quantity_to_db(amount)?)
    .bind(product_id.0)
    .execute(&self.pool)
    .await
    .map_err(store_error)?;
    Ok(result.rows_affected() == 1)
  }

  #[instrument(name = "db::increment", skip(self), fields(product_id = %product_id))]
  async fn increment(&self, product_id: ProductId, amount: u32) -> StoreResult<()> {
    let result = sqlx::query("UPDATE products SET quantity = quantity + $1, updated_at = NOW() WHERE product_id = $2")
      .bind(quantity_to_db(amount)?)
      .bind(product_id.0)
      .execute(&self.pool)
      .await
      .map_err(store_error)?;
    if result.rows_affected() == 0 {
      // The product vanished after it was decremented; nothing to give stock back to.
      return Err(anyhow::anyhow!("product {} no longer exists", product_id).into());
    }
    Ok(())
  }
}
