// orderflow/src/core/control.rs

//! Signals for controlling flow execution and the outcome of a completed run.

/// Returned by a step handler to decide whether the flow proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Proceed to the next handler / step.
  Continue,
  /// Stop the flow here without error. Used for expected business outcomes
  /// (e.g. insufficient stock) that leave nothing to undo; no compensation runs.
  Halt,
}

/// Outcome of a flow run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step ran to completion.
  Completed,
  /// A handler returned [`StepControl::Halt`] in the named step.
  Halted { step: String },
}

impl FlowOutcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, FlowOutcome::Completed)
  }
}
