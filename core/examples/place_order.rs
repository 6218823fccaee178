// orderflow/examples/place_order.rs

use orderflow::{
  AddressId, CartLine, InMemoryInventory, InMemoryOrders, OrderPlacer, PaymentId, PlacementRequest, ProductId, UserId,
};
use std::sync::Arc;
use tracing::{info, warn};

fn request(user_id: i64, cart_lines: Vec<CartLine>) -> PlacementRequest {
  PlacementRequest {
    user_id: UserId(user_id),
    total_price_cents: 2_998,
    user_payment_id: Some(PaymentId(1)),
    shipping_address_id: Some(AddressId(1)),
    billing_address_id: Some(AddressId(1)),
    cart_lines,
  }
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Order Placement Example ---");

  let inventory = Arc::new(InMemoryInventory::with_stock([(ProductId(1), 5), (ProductId(2), 1)]));
  let orders = Arc::new(InMemoryOrders::new());
  let placer = OrderPlacer::new(inventory.clone(), orders.clone());

  // 1. Enough stock: the order is written and stock goes down.
  match placer.place_order(request(1, vec![CartLine::new(1, 3), CartLine::new(2, 1)])).await {
    Ok(placed) => info!(order_id = %placed.order_id, items = placed.line_item_ids.len(), "Placed."),
    Err(failure) => warn!(reason = %failure.reason, "Not placed."),
  }

  // 2. Product 2 is now sold out: rejected before anything is written.
  match placer.place_order(request(2, vec![CartLine::new(1, 1), CartLine::new(2, 1)])).await {
    Ok(placed) => info!(order_id = %placed.order_id, "Placed."),
    Err(failure) => warn!(
      reason = %failure.reason,
      partially_applied = failure.partially_applied,
      "Not placed."
    ),
  }

  for record in inventory.records() {
    info!(product_id = %record.product_id, available = record.available_quantity, "Stock level.");
  }
  info!(orders = orders.order_count(), "--- Example Finished ---");
}
