// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::auth::AuthenticatedUser;
use orderflow::{
  AddressId, CartLine, Order, OrderId, OrderLineItem, OrderUpdate, PaymentId, PlacementRequest, ProductId, UserId,
};

// --- Request / Response DTOs ---

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderLinePayload {
  pub product_id: i64,
  pub quantity: u32,
}

/// Identifiers are optional here so that a missing one is reported by name
/// (`MissingField`) rather than as a generic JSON error.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
  /// Minor units (cents). Taken as given; not recomputed.
  #[serde(rename = "totalPrice")]
  pub total_price_cents: i64,
  pub user_payment_id: Option<i64>,
  pub shipping_address_id: Option<i64>,
  pub billing_address_id: Option<i64>,
  #[serde(default)]
  pub products: Vec<OrderLinePayload>,
}

impl PlaceOrderPayload {
  fn into_request(self, user_id: UserId) -> PlacementRequest {
    PlacementRequest {
      user_id,
      total_price_cents: self.total_price_cents,
      user_payment_id: self.user_payment_id.map(PaymentId),
      shipping_address_id: self.shipping_address_id.map(AddressId),
      billing_address_id: self.billing_address_id.map(AddressId),
      cart_lines: self
        .products
        .into_iter()
        .map(|line| CartLine::new(ProductId(line.product_id), line.quantity))
        .collect(),
    }
  }
}

/// Header fields only; line items cannot be edited after placement.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateOrderPayload {
  #[serde(rename = "totalPrice")]
  pub total_price_cents: Option<i64>,
  pub user_payment_id: Option<i64>,
  pub shipping_address_id: Option<i64>,
  pub billing_address_id: Option<i64>,
}

impl From<UpdateOrderPayload> for OrderUpdate {
  fn from(payload: UpdateOrderPayload) -> Self {
    OrderUpdate {
      total_price_cents: payload.total_price_cents,
      user_payment_id: payload.user_payment_id.map(PaymentId),
      shipping_address_id: payload.shipping_address_id.map(AddressId),
      billing_address_id: payload.billing_address_id.map(AddressId),
    }
  }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderLineItem>,
}

fn positive_id(raw: i64, what: &str) -> Result<i64, AppError> {
  if raw <= 0 {
    return Err(AppError::Validation(format!(
      "Invalid {} ID. ID must be a positive number.",
      what
    )));
  }
  Ok(raw)
}

/// Loads an order the caller owns. Another user's order is reported exactly
/// like a missing one.
async fn owned_order(app_state: &AppState, order_id: OrderId, user_id: UserId) -> Result<Order, AppError> {
  match app_state.orders.find_order(order_id).await? {
    Some(order) if order.user_id == user_id => Ok(order),
    _ => {
      warn!(%order_id, "Order not found for user.");
      Err(AppError::NotFound(format!("Order with ID {} not found.", order_id)))
    }
  }
}

// --- Handler Implementations ---

#[instrument(
    name = "handler::place_order",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user_id, lines = req_payload.products.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<PlaceOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let request = req_payload.into_inner().into_request(auth_user.user_id);
  let placed = app_state.placer.place_order(request).await?;

  info!(order_id = %placed.order_id, "Order placed for user {}.", auth_user.user_id);
  Ok(HttpResponse::Created().json(json!({
      "message": "Order placed successfully.",
      "data": placed
  })))
}

#[instrument(name = "handler::get_order", skip(app_state, path, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = OrderId(positive_id(path.into_inner(), "order")?);
  let order = owned_order(&app_state, order_id, auth_user.user_id).await?;
  let items = app_state.orders.line_items(order_id).await?;

  Ok(HttpResponse::Ok().json(json!({
      "message": "Order retrieved successfully.",
      "data": OrderDetails { order, items }
  })))
}

/// Every order in the store. Any authenticated caller may list them.
#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders().await?;
  if orders.is_empty() {
    return Err(AppError::NotFound("No orders found in the database.".to_string()));
  }

  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(json!({
      "message": "Orders retrieved successfully.",
      "data": orders
  })))
}

#[instrument(
    name = "handler::update_order",
    skip(app_state, path, req_payload, auth_user),
    fields(user_id = %auth_user.user_id)
)]
pub async fn update_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  req_payload: web::Json<UpdateOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = OrderId(positive_id(path.into_inner(), "order")?);
  let update = OrderUpdate::from(req_payload.into_inner());
  if update.is_empty() {
    return Err(AppError::Validation("At least one field is required to update.".to_string()));
  }

  owned_order(&app_state, order_id, auth_user.user_id).await?;
  let order = app_state
    .orders
    .update_order(order_id, &update)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;

  info!(%order_id, "Order updated.");
  Ok(HttpResponse::Ok().json(json!({
      "message": "Order updated successfully.",
      "data": order
  })))
}

/// Removes the header and its line items. Stock is not given back.
#[instrument(name = "handler::delete_order", skip(app_state, path, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = OrderId(positive_id(path.into_inner(), "order")?);
  owned_order(&app_state, order_id, auth_user.user_id).await?;

  if !app_state.orders.delete_order(order_id).await? {
    return Err(AppError::NotFound(format!("Order with ID {} not found.", order_id)));
  }

  info!(%order_id, "Order deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Order deleted successfully." })))
}

#[instrument(name = "handler::list_user_orders", skip(app_state, path, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_user_orders_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user_id = UserId(positive_id(path.into_inner(), "user")?);
  if user_id != auth_user.user_id {
    return Err(AppError::Forbidden("Orders of another user cannot be listed.".to_string()));
  }

  let orders = app_state.orders.orders_for_user(user_id).await?;
  if orders.is_empty() {
    return Err(AppError::NotFound(format!("No orders found for user {}.", user_id)));
  }

  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(json!({
      "message": "Orders retrieved successfully.",
      "data": orders
  })))
}
