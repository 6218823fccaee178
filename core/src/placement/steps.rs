// orderflow/src/placement/steps.rs

//! The four placement steps and their compensators.

use crate::core::context_data::ContextData;
use crate::core::control::StepControl;
use crate::error::FlowError;
use crate::flow::Flow;
use crate::placement::context::PlacementCtx;
use crate::placement::outcome::{PlacementError, Reservation};
use crate::retry::retry_with_backoff;
use crate::store::with_timeout;
use tracing::{event, Level};

pub const VALIDATE_INVENTORY: &str = "validate_inventory";
pub const RESERVE_STOCK: &str = "reserve_stock";
pub const CREATE_ORDER_HEADER: &str = "create_order_header";
pub const CREATE_LINE_ITEMS: &str = "create_line_items";
/// Not a flow step: the `failed_step` of a report raised when the placement task itself dies.
pub const PLACEMENT_TASK: &str = "placement_task";

pub(crate) fn build_placement_flow() -> Flow<PlacementCtx, PlacementError> {
  let mut flow = Flow::<PlacementCtx, PlacementError>::new(
    "order_placement",
    &[
      (VALIDATE_INVENTORY, false),
      (RESERVE_STOCK, false),
      (CREATE_ORDER_HEADER, false),
      (CREATE_LINE_ITEMS, false),
    ],
  );

  flow.on_step(VALIDATE_INVENTORY, validate_inventory);
  flow.on_step(RESERVE_STOCK, reserve_stock);
  flow.compensate_step(RESERVE_STOCK, release_reservations);
  flow.on_step(CREATE_ORDER_HEADER, create_order_header);
  flow.compensate_step(CREATE_ORDER_HEADER, remove_order_header);
  // Line items die with their header, so that step needs no compensator.
  flow.on_step(CREATE_LINE_ITEMS, create_line_items);

  flow
}

async fn validate_inventory(ctx: ContextData<PlacementCtx>) -> Result<StepControl, PlacementError> {
  let (validator, cart_lines) = {
    let guard = ctx.read();
    (guard.deps.validator(), guard.cart_lines.clone())
  };

  let result = validator.validate(&cart_lines).await?;

  let mut guard = ctx.write();
  if result.ok {
    guard.validation = Some(result);
    return Ok(StepControl::Continue);
  }
  guard.rejection = Some(PlacementError::OutOfStock {
    lines: result.insufficient_lines.clone(),
  });
  guard.validation = Some(result);
  Ok(StepControl::Halt)
}

/// Conditional decrement per line, in cart order. Each success is recorded
/// before the next call so compensation knows exactly what to give back.
async fn reserve_stock(ctx: ContextData<PlacementCtx>) -> Result<StepControl, PlacementError> {
  let (deps, cart_lines) = {
    let guard = ctx.read();
    (guard.deps.clone(), guard.cart_lines.clone())
  };

  for line in cart_lines {
    let decremented = with_timeout(
      "conditional_decrement",
      deps.config.store_timeout,
      deps.inventory.conditional_decrement(line.product_id, line.quantity),
    )
    .await;

    match decremented {
      Ok(true) => ctx.update(|c| c.reserved.push(Reservation::from(line))),
      Ok(false) => {
        event!(
          Level::WARN,
          product_id = %line.product_id,
          requested = line.quantity,
          "Stock moved between validation and reservation."
        );
        return Err(PlacementError::ReservationFailed {
          product_id: line.product_id,
          requested: line.quantity,
        });
      }
      Err(source) => {
        if source.is_timeout() {
          ctx.update(|c| c.indeterminate.push(Reservation::from(line)));
        }
        return Err(PlacementError::store("conditional_decrement", source));
      }
    }
  }
  Ok(StepControl::Continue)
}

/// Gives back every applied reservation, newest first, retrying each with
/// backoff. Keeps going past failures; the unreleased ones stay in `reserved`.
async fn release_reservations(ctx: ContextData<PlacementCtx>) -> Result<(), PlacementError> {
  let (deps, reserved) = {
    let guard = ctx.read();
    (guard.deps.clone(), guard.reserved.clone())
  };
  let inventory = deps.inventory.as_ref();
  let timeout = deps.config.store_timeout;
  let mut last_failure = None;

  for reservation in reserved.iter().rev() {
    let released = retry_with_backoff(&deps.config.compensation, "increment", move || {
      with_timeout(
        "increment",
        timeout,
        inventory.increment(reservation.product_id, reservation.quantity),
      )
    })
    .await;

    match released {
      Ok(()) => {
        event!(Level::DEBUG, product_id = %reservation.product_id, quantity = reservation.quantity, "Reservation released.");
        ctx.update(|c| c.mark_released(reservation.product_id));
      }
      Err(source) => {
        event!(Level::ERROR, product_id = %reservation.product_id, quantity = reservation.quantity, error = %source, "Reservation could not be released.");
        last_failure = Some(source);
      }
    }
  }

  match last_failure {
    Some(source) => Err(PlacementError::store("increment", source)),
    None => Ok(()),
  }
}

async fn create_order_header(ctx: ContextData<PlacementCtx>) -> Result<StepControl, PlacementError> {
  let (deps, header) = {
    let guard = ctx.read();
    (guard.deps.clone(), guard.header.clone())
  };

  let order_id = with_timeout(
    "insert_order",
    deps.config.store_timeout,
    deps.orders.insert_order(&header),
  )
  .await
  .map_err(|source| {
    if source.is_timeout() {
      ctx.update(|c| c.header_indeterminate = true);
    }
    PlacementError::store("insert_order", source)
  })?;

  event!(Level::DEBUG, %order_id, "Order header created.");
  ctx.update(|c| c.order_id = Some(order_id));
  Ok(StepControl::Continue)
}

async fn remove_order_header(ctx: ContextData<PlacementCtx>) -> Result<(), PlacementError> {
  let (deps, order_id) = {
    let guard = ctx.read();
    (guard.deps.clone(), guard.order_id)
  };
  let Some(order_id) = order_id else {
    return Ok(());
  };
  let orders = deps.orders.as_ref();
  let timeout = deps.config.store_timeout;

  retry_with_backoff(&deps.config.compensation, "delete_order", move || {
    with_timeout("delete_order", timeout, orders.delete_order(order_id))
  })
  .await
  .map_err(|source| PlacementError::store("delete_order", source))?;

  event!(Level::DEBUG, %order_id, "Order header removed.");
  ctx.update(|c| c.order_removed = true);
  Ok(())
}

async fn create_line_items(ctx: ContextData<PlacementCtx>) -> Result<StepControl, PlacementError> {
  let (deps, order_id, cart_lines) = {
    let guard = ctx.read();
    (guard.deps.clone(), guard.order_id, guard.cart_lines.clone())
  };
  let order_id = order_id.ok_or_else(|| {
    PlacementError::Flow(FlowError::Internal(
      "line items requested before the order header exists".to_string(),
    ))
  })?;

  for line in cart_lines {
    let line_item_id = with_timeout(
      "insert_line_item",
      deps.config.store_timeout,
      deps.orders.insert_line_item(order_id, line.product_id, line.quantity),
    )
    .await
    .map_err(|source| PlacementError::store("insert_line_item", source))?;
    ctx.update(|c| c.line_item_ids.push(line_item_id));
  }
  Ok(StepControl::Continue)
}
