// storefront/src/models/mod.rs

//! Row types for the order tables.

pub mod order;

pub use order::{OrderItemRow, OrderRow};
