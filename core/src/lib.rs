// src/lib.rs

//! orderflow: inventory-aware order placement.
//!
//! Placing an order touches two stores: stock is decremented in the
//! inventory store, then an order header and its line items are written to
//! the order store. This crate makes that sequence behave as one unit:
//!  - A read-only [`InventoryValidator`] checks a cart against live stock.
//!  - [`OrderPlacer`] validates, reserves with atomic conditional decrements,
//!    writes the order, and compensates (releases stock, deletes the header)
//!    when any later write fails.
//!  - Every store call is bounded by a timeout; compensation retries with
//!    exponential backoff. Anything it cannot undo, or any write that timed
//!    out and may have landed, is raised as a `ReservationLeak` and handed
//!    to a [`LeakReporter`].
//!
//! The placement sequence runs on a small step engine, [`Flow`], whose steps
//! can register compensators that run in reverse order on failure.

pub mod config;
pub mod core;
pub mod error;
pub mod flow;
pub mod model;
pub mod placement;
pub mod retry;
pub mod store;
pub mod validator;

// --- Re-exports for the Public API ---

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{FlowOutcome, StepControl};
pub use crate::core::step::StepDef;
pub use crate::flow::{CompensationError, Flow, FlowFailure};

pub use crate::error::{FlowError, FlowResult, StoreError, StoreResult};

pub use crate::model::{
  AddressId, CartLine, InventoryRecord, LineItemId, NewOrder, Order, OrderId, OrderLineItem, OrderUpdate, PaymentId,
  ProductId, UserId,
};

pub use crate::store::{InMemoryInventory, InMemoryOrders, InventoryStore, OrderStore};

pub use crate::config::PlacementConfig;
pub use crate::retry::RetryPolicy;
pub use crate::validator::{InventoryValidator, ValidationResult};

pub use crate::placement::{
  FailureClass, InsufficientLine, LeakReport, LeakReporter, OrderPlacer, PlacedOrder, PlacementError, PlacementFailure,
  PlacementRequest, PlacementResult, Reservation, TracingLeakReporter,
};
