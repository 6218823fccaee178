// orderflow/src/flow/execution.rs

//! `Flow::run()`: forward execution of steps, and reverse-order compensation
//! when a step fails.

use crate::core::context_data::ContextData;
use crate::core::control::{FlowOutcome, StepControl};
use crate::core::step::StepDef;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use thiserror::Error;
use tracing::{event, info_span, Instrument, Level};

/// A compensator that itself failed.
#[derive(Debug)]
pub struct CompensationError<Err> {
  pub step: String,
  pub error: Err,
}

/// A flow run that failed in `step`.
///
/// By the time this is returned every compensator has been given its chance
/// to run; `compensation_errors` lists the ones that did not succeed.
#[derive(Debug, Error)]
#[error("flow step '{step}' failed: {error}")]
pub struct FlowFailure<Err>
where
  Err: std::error::Error + 'static,
{
  pub step: String,
  #[source]
  pub error: Err,
  pub compensation_errors: Vec<CompensationError<Err>>,
}

impl<Err> FlowFailure<Err>
where
  Err: std::error::Error + 'static,
{
  pub fn fully_compensated(&self) -> bool {
    self.compensation_errors.is_empty()
  }
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the flow against `ctx_data`.
  ///
  /// - `Ok(Completed)`: every step ran.
  /// - `Ok(Halted)`: a handler returned `StepControl::Halt`; no compensation runs.
  /// - `Err(FlowFailure)`: a handler failed (or a required step had no
  ///   handler). Compensators of all entered steps ran in reverse order
  ///   before returning; the run never stops half-way through rollback.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, FlowFailure<Err>> {
    event!(Level::DEBUG, flow = %self.name, num_steps = self.steps.len(), "Flow execution starting.");
    let mut entered: Vec<&StepDef> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!(
        "flow_step",
        flow = %self.name,
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      let handlers = match self.on.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          continue;
        }
        _ => {
          step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
          let error = Err::from(FlowError::HandlerMissing {
            step_name: step_def.name.clone(),
          });
          return Err(self.fail(ctx_data, &entered, step_def, error).await);
        }
      };

      entered.push(step_def);

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let result = handler_fn(ctx_data.clone())
          .instrument(info_span!(parent: &step_span, "on_handler", handler_index = handler_idx))
          .await;
        match result {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Halt) => {
            step_span.in_scope(|| event!(Level::INFO, "Flow halted by handler."));
            return Ok(FlowOutcome::Halted {
              step: step_def.name.clone(),
            });
          }
          Err(e) => {
            step_span.in_scope(|| event!(Level::WARN, error = %e, "Step handler failed."));
            return Err(self.fail(ctx_data, &entered, step_def, e).await);
          }
        }
      }
      step_span.in_scope(|| event!(Level::DEBUG, "Step finished."));
    }

    event!(Level::DEBUG, flow = %self.name, "Flow execution completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn fail(
    &self,
    ctx_data: ContextData<TData>,
    entered: &[&StepDef],
    failed_step: &StepDef,
    error: Err,
  ) -> FlowFailure<Err> {
    let compensation_errors = self.compensate(ctx_data, entered).await;
    FlowFailure {
      step: failed_step.name.clone(),
      error,
      compensation_errors,
    }
  }

  /// Runs compensators of `entered` steps, last entered first. Keeps going
  /// past a failing compensator so every other step still gets undone.
  async fn compensate(&self, ctx_data: ContextData<TData>, entered: &[&StepDef]) -> Vec<CompensationError<Err>> {
    let mut errors = Vec::new();
    for step_def in entered.iter().rev() {
      let Some(compensator) = self.compensators.get(&step_def.name) else {
        continue;
      };
      let span = info_span!("compensate_step", flow = %self.name, step_name = %step_def.name);
      match compensator(ctx_data.clone()).instrument(span.clone()).await {
        Ok(()) => span.in_scope(|| event!(Level::INFO, "Step compensated.")),
        Err(error) => {
          span.in_scope(|| event!(Level::ERROR, error = %error, "Compensation failed."));
          errors.push(CompensationError {
            step: step_def.name.clone(),
            error,
          });
        }
      }
    }
    errors
  }
}
