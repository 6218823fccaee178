// orderflow/src/flow/hooks.rs

//! Registration of forward handlers and compensators on flow steps.

use crate::core::context_data::ContextData;
use crate::core::control::StepControl;
use crate::core::handler::{Compensator, Handler};
use crate::error::FlowError;
use crate::flow::definition::Flow;
use std::future::Future;
use tracing::{event, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Registers a forward handler for `step_name`. Several handlers on one
  /// step run in registration order.
  ///
  /// The handler's own error type only has to convert into the flow's `Err`.
  pub fn on_step<F, UserErr>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Sets the compensator for `step_name`, replacing any previous one.
  ///
  /// A compensator runs for every step the flow *entered* before a failure,
  /// including the failing step itself, so it must cope with partial progress.
  pub fn compensate_step<F, UserErr>(&mut self, step_name: &str, compensator_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<(), UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let compensator: Compensator<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = compensator_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    if self.compensators.insert(step_name.to_string(), compensator).is_some() {
      event!(Level::WARN, flow = %self.name, %step_name, "Compensator replaced.");
    }
  }
}
