// orderflow/src/core/handler.rs

//! Boxed handler types stored by a [`Flow`](crate::Flow).

use crate::core::context_data::ContextData;
use crate::core::control::StepControl;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Forward handler for a step.
///
/// Receives a clone of the shared `ContextData<TData>`. Handlers must drop any
/// lock guard before awaiting, and return `StepControl::Continue` to proceed
/// or `StepControl::Halt` to stop the flow without error.
pub type Handler<TData, Err> = Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<StepControl, Err>> + Send + Sync>;

/// Compensating handler for a step.
///
/// Runs when a later (or the same) step fails. It must undo exactly the
/// effects its step recorded in the context, and be safe to call when the
/// step only got part of the way through.
pub type Compensator<TData, Err> = Box<dyn Fn(ContextData<TData>) -> BoxFuture<Result<(), Err>> + Send + Sync>;
