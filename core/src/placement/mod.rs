// orderflow/src/placement/mod.rs

//! Order placement: validate → reserve → create header → create line items,
//! with compensation when any write after validation fails.

pub(crate) mod context;
pub mod leak;
pub mod orchestrator;
pub mod outcome;
pub mod steps;

pub use leak::{LeakReport, LeakReporter, TracingLeakReporter};
pub use orchestrator::OrderPlacer;
pub use outcome::{
  FailureClass, InsufficientLine, PlacedOrder, PlacementError, PlacementFailure, PlacementRequest, PlacementResult,
  Reservation,
};
