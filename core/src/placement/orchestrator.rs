// orderflow/src/placement/orchestrator.rs

//! `OrderPlacer`: the caller-facing entry point for order placement.

use crate::config::PlacementConfig;
use crate::core::context_data::ContextData;
use crate::core::control::FlowOutcome;
use crate::error::FlowError;
use crate::flow::{Flow, FlowFailure};
use crate::model::{NewOrder, ProductId};
use crate::placement::context::{PlacementCtx, PlacementDeps};
use crate::placement::leak::{LeakReport, LeakReporter, TracingLeakReporter};
use crate::placement::outcome::{PlacedOrder, PlacementError, PlacementFailure, PlacementRequest, PlacementResult};
use crate::placement::steps::{build_placement_flow, PLACEMENT_TASK};
use crate::store::{InventoryStore, OrderStore};
use crate::validator::InventoryValidator;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Instrument, Span};

/// Validates a cart against live inventory, reserves the stock, writes the
/// order header and its line items, and returns one outcome.
///
/// Steps 2–4 (reserve, header, line items) behave as one unit: if any of them
/// fails, applied reservations are released and a created header is deleted
/// before `place_order` returns. If that rollback cannot complete, or a write
/// timed out and may have landed, the failure is a
/// [`PlacementError::ReservationLeak`] and the leak is handed to the
/// configured [`LeakReporter`].
///
/// Cheap to clone; every clone shares the same stores and flow.
#[derive(Clone)]
pub struct OrderPlacer {
  deps: PlacementDeps,
  flow: Arc<Flow<PlacementCtx, PlacementError>>,
  leak_reporter: Arc<dyn LeakReporter>,
}

impl OrderPlacer {
  pub fn new(inventory: Arc<dyn InventoryStore>, orders: Arc<dyn OrderStore>) -> Self {
    Self {
      deps: PlacementDeps {
        inventory,
        orders,
        config: PlacementConfig::default(),
      },
      flow: Arc::new(build_placement_flow()),
      leak_reporter: Arc::new(TracingLeakReporter),
    }
  }

  pub fn with_config(mut self, config: PlacementConfig) -> Self {
    self.deps.config = config;
    self
  }

  pub fn with_leak_reporter(mut self, leak_reporter: Arc<dyn LeakReporter>) -> Self {
    self.leak_reporter = leak_reporter;
    self
  }

  pub fn config(&self) -> &PlacementConfig {
    &self.deps.config
  }

  /// A validator over the same inventory and timeout this placer uses.
  pub fn validator(&self) -> InventoryValidator {
    self.deps.validator()
  }

  /// Places one order.
  ///
  /// Request-level problems (`MissingField`, `EmptyCart`, `InvalidQuantity`,
  /// `DuplicateProduct`) are reported before any store is touched.
  ///
  /// Once the flow starts it runs on its own task: dropping the returned
  /// future does not abandon a half-applied checkout, the flow and its
  /// compensation still run to completion.
  #[instrument(
    name = "OrderPlacer::place_order",
    skip_all,
    fields(user_id = %request.user_id, lines = request.cart_lines.len())
  )]
  pub async fn place_order(&self, request: PlacementRequest) -> PlacementResult {
    let header = match check_request(&request) {
      Ok(header) => header,
      Err(reason) => {
        info!(%reason, "Order request rejected before validation.");
        return Err(PlacementFailure::clean(reason));
      }
    };

    let placer = self.clone();
    let ctx_data = ContextData::new(PlacementCtx::new(self.deps.clone(), header, request.cart_lines));
    let task_ctx = ctx_data.clone();
    let task = tokio::spawn(async move { placer.execute(task_ctx).await }.instrument(Span::current()));

    match task.await {
      Ok(result) => result,
      Err(join_err) => {
        // No compensation ran: everything the task recorded is still applied.
        let cause = format!("placement task failed: {join_err}");
        error!(error = %join_err, "Placement task did not complete.");
        let report = {
          let guard = ctx_data.read();
          LeakReport {
            user_id: guard.header.user_id,
            failed_step: PLACEMENT_TASK.to_string(),
            cause: cause.clone(),
            leaked: guard.reserved.clone(),
            indeterminate: guard.indeterminate.clone(),
            orphaned_order: guard.live_order(),
            header_indeterminate: guard.header_indeterminate,
            reported_at: Utc::now(),
          }
        };
        self.leak_reporter.report(&report).await;
        Err(PlacementFailure {
          reason: PlacementError::Flow(FlowError::Internal(cause)),
          partially_applied: true,
        })
      }
    }
  }

  async fn execute(&self, ctx_data: ContextData<PlacementCtx>) -> PlacementResult {
    match self.flow.run(ctx_data.clone()).await {
      Ok(FlowOutcome::Completed) => {
        let guard = ctx_data.read();
        match guard.order_id {
          Some(order_id) => {
            info!(%order_id, items = guard.line_item_ids.len(), "Order placed.");
            Ok(PlacedOrder {
              order_id,
              line_item_ids: guard.line_item_ids.clone(),
            })
          }
          None => Err(PlacementFailure {
            reason: PlacementError::Flow(FlowError::Internal("flow completed without an order id".to_string())),
            partially_applied: !guard.reserved.is_empty(),
          }),
        }
      }
      Ok(FlowOutcome::Halted { step }) => {
        let rejection = ctx_data.write().rejection.take();
        let reason = rejection.unwrap_or_else(|| {
          PlacementError::Flow(FlowError::Internal(format!("flow halted in '{step}' without a reason")))
        });
        info!(%reason, "Order not placed.");
        Err(PlacementFailure::clean(reason))
      }
      Err(failure) => self.settle_failure(ctx_data, failure).await,
    }
  }

  /// Turns a failed flow into the caller's result. Compensation has already
  /// run; what is still recorded in the context is what it could not undo.
  async fn settle_failure(
    &self,
    ctx_data: ContextData<PlacementCtx>,
    failure: FlowFailure<PlacementError>,
  ) -> PlacementResult {
    let (user_id, unwound, leaked, indeterminate, orphaned_order, header_indeterminate) = {
      let guard = ctx_data.read();
      (
        guard.header.user_id,
        guard.fully_unwound(),
        guard.reserved.clone(),
        guard.indeterminate.clone(),
        guard.live_order(),
        guard.header_indeterminate,
      )
    };

    if failure.fully_compensated() && unwound {
      warn!(step = %failure.step, reason = %failure.error, "Order placement failed; all writes compensated.");
      return Err(PlacementFailure::clean(failure.error));
    }

    // A timed-out write may have landed, so it is escalated like one that
    // could not be undone: retrying would apply it a second time.
    let mut cause = failure.error.to_string();
    for comp in &failure.compensation_errors {
      cause.push_str(&format!("; compensating '{}' failed: {}", comp.step, comp.error));
    }
    if header_indeterminate {
      cause.push_str("; order header insert timed out and may have committed");
    }
    let report = LeakReport {
      user_id,
      failed_step: failure.step.clone(),
      cause: cause.clone(),
      leaked: leaked.clone(),
      indeterminate: indeterminate.clone(),
      orphaned_order,
      header_indeterminate,
      reported_at: Utc::now(),
    };
    self.leak_reporter.report(&report).await;

    error!(step = %failure.step, %cause, "Order placement could not be rolled back.");
    Err(PlacementFailure {
      reason: PlacementError::ReservationLeak {
        leaked,
        indeterminate,
        orphaned_order,
        header_indeterminate,
        cause,
      },
      partially_applied: true,
    })
  }
}

/// Checks that need no store access. Field order matches the HTTP contract:
/// payment, shipping address, billing address.
fn check_request(request: &PlacementRequest) -> Result<NewOrder, PlacementError> {
  let user_payment_id = request
    .user_payment_id
    .ok_or(PlacementError::MissingField { field: "userPaymentId" })?;
  let shipping_address_id = request
    .shipping_address_id
    .ok_or(PlacementError::MissingField { field: "shippingAddressId" })?;
  let billing_address_id = request
    .billing_address_id
    .ok_or(PlacementError::MissingField { field: "billingAddressId" })?;

  if request.cart_lines.is_empty() {
    return Err(PlacementError::EmptyCart);
  }

  let mut seen: HashSet<ProductId> = HashSet::with_capacity(request.cart_lines.len());
  for line in &request.cart_lines {
    if line.quantity == 0 {
      return Err(PlacementError::InvalidQuantity {
        product_id: line.product_id,
        quantity: line.quantity,
      });
    }
    if !seen.insert(line.product_id) {
      return Err(PlacementError::DuplicateProduct {
        product_id: line.product_id,
      });
    }
  }

  Ok(NewOrder {
    user_id: request.user_id,
    total_price_cents: request.total_price_cents,
    user_payment_id,
    shipping_address_id,
    billing_address_id,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{AddressId, CartLine, PaymentId, UserId};

  fn request() -> PlacementRequest {
    PlacementRequest {
      user_id: UserId(1),
      total_price_cents: 500,
      user_payment_id: Some(PaymentId(10)),
      shipping_address_id: Some(AddressId(20)),
      billing_address_id: Some(AddressId(21)),
      cart_lines: vec![CartLine::new(1, 1)],
    }
  }

  #[test]
  fn missing_fields_are_reported_in_contract_order() {
    let mut req = request();
    req.billing_address_id = None;
    req.user_payment_id = None;
    match check_request(&req) {
      Err(PlacementError::MissingField { field }) => assert_eq!(field, "userPaymentId"),
      other => panic!("expected MissingField, got {other:?}"),
    }
  }

  #[test]
  fn zero_quantity_and_duplicates_are_rejected() {
    let mut req = request();
    req.cart_lines = vec![CartLine::new(1, 0)];
    assert!(matches!(check_request(&req), Err(PlacementError::InvalidQuantity { .. })));

    req.cart_lines = vec![CartLine::new(1, 1), CartLine::new(1, 2)];
    assert!(matches!(
      check_request(&req),
      Err(PlacementError::DuplicateProduct { product_id }) if product_id == ProductId(1)
    ));
  }

  #[test]
  fn well_formed_request_becomes_a_header() {
    let header = check_request(&request()).unwrap();
    assert_eq!(header.user_payment_id, PaymentId(10));
    assert_eq!(header.total_price_cents, 500);
  }
}
