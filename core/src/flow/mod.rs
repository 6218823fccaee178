// orderflow/src/flow/mod.rs

//! The `Flow<TData, Err>` step engine: named steps, forward handlers, and
//! per-step compensators that undo completed work when a later step fails.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Flow;
pub use execution::{CompensationError, FlowFailure};
