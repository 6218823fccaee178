// orderflow/src/flow/definition.rs

//! The `Flow<TData, Err>` struct and its structural operations.

use crate::core::handler::{Compensator, Handler};
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// An ordered sequence of named steps over a shared context `TData`.
///
/// `Err` is the error type returned by handlers. It must be `From<FlowError>`
/// so that engine-level problems (a required step with no handler) surface
/// through the same channel as handler failures.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) compensators: HashMap<String, Compensator<TData, Err>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a flow from `(step_name, optional)` pairs, executed in the given order.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional)| StepDef::new(*step_name, *optional))
      .collect();

    Self {
      name: name.into(),
      steps,
      on: HashMap::new(),
      compensators: HashMap::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|s| s.name.as_str())
  }

  pub fn has_compensator(&self, step_name: &str) -> bool {
    self.compensators.contains_key(step_name)
  }

  /// Panics if the step is unknown: a misspelled step name is a wiring bug,
  /// not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Flow '{}' setup error: {}",
        self.name,
        FlowError::StepNotFound {
          step_name: step_name.to_string()
        }
      );
    }
  }
}
