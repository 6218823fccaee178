// storefront/src/db/mod.rs

//! Postgres implementations of the placement store contracts.

pub mod inventory;
pub mod orders;

pub use inventory::PgInventoryStore;
pub use orders::PgOrderStore;

use orderflow::StoreError;

/// Pool exhaustion and closed pools are transient; everything else is a backend fault.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
  match err {
    sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".to_string()),
    sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
    sqlx::Error::Io(io) => StoreError::Unavailable(format!("database I/O: {io}")),
    other => StoreError::from(anyhow::Error::new(other)),
  }
}

/// Quantities are `u32` in the domain and `INTEGER` in the schema.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, StoreError> {
  i32::try_from(quantity).map_err(|_| StoreError::from(anyhow::anyhow!("quantity {quantity} exceeds column range")))
}

pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, StoreError> {
  u32::try_from(quantity).map_err(|_| StoreError::from(anyhow::anyhow!("negative quantity {quantity} in database")))
}
