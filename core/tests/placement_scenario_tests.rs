// tests/placement_scenario_tests.rs
mod common;

use common::*;
use orderflow::{InsufficientLine, PlacementError, ProductId};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn places_order_and_decrements_stock() {
  setup_tracing();
  let h = Harness::new(&[(1, 5)]);

  let placed = h.placer.place_order(request(7, &[(1, 3)])).await.unwrap();

  assert_eq!(h.quantity(1), Some(2));
  assert_eq!(h.orders.inner.order_count(), 1);
  let items = h.line_items_for(placed.order_id);
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].product_id, ProductId(1));
  assert_eq!(items[0].quantity, 3);
  assert_eq!(placed.line_item_ids, vec![items[0].order_item_id]);
  assert!(h.leaks.reports().is_empty());
}

#[tokio::test]
#[serial]
async fn order_header_carries_request_fields() {
  setup_tracing();
  let h = Harness::new(&[(1, 5), (2, 5)]);
  let mut req = request(7, &[(1, 1), (2, 2)]);
  req.total_price_cents = 4_321;

  let placed = h.placer.place_order(req).await.unwrap();

  let order = h.orders.inner.orders().into_iter().next().unwrap();
  assert_eq!(order.order_id, placed.order_id);
  assert_eq!(order.user_id.0, 7);
  assert_eq!(order.total_price_cents, 4_321);
  assert_eq!(order.user_payment_id.0, 11);
  assert_eq!(order.shipping_address_id.0, 21);
  assert_eq!(order.billing_address_id.0, 22);
  let products: Vec<_> = h.line_items_for(placed.order_id).iter().map(|i| i.product_id.0).collect();
  assert_eq!(products, vec![1, 2]);
}

#[tokio::test]
#[serial]
async fn insufficient_stock_is_out_of_stock_without_writes() {
  setup_tracing();
  let h = Harness::new(&[(1, 2)]);

  let failure = h.placer.place_order(request(7, &[(1, 3)])).await.unwrap_err();

  match &failure.reason {
    PlacementError::OutOfStock { lines } => assert_eq!(
      lines,
      &vec![InsufficientLine {
        product_id: ProductId(1),
        requested: 3,
        available: 2,
      }]
    ),
    other => panic!("Expected OutOfStock, got {:?}", other),
  }
  assert!(!failure.partially_applied);
  assert!(failure.reason.is_business_outcome());
  assert_eq!(h.quantity(1), Some(2));
  assert_eq!(h.orders.total_calls(), 0);
}

#[tokio::test]
#[serial]
async fn one_short_line_blocks_the_whole_cart() {
  setup_tracing();
  let h = Harness::new(&[(1, 5), (2, 0)]);

  let failure = h.placer.place_order(request(7, &[(1, 1), (2, 1)])).await.unwrap_err();

  match &failure.reason {
    PlacementError::OutOfStock { lines } => {
      assert_eq!(lines.len(), 1);
      assert_eq!(lines[0].product_id, ProductId(2));
    }
    other => panic!("Expected OutOfStock, got {:?}", other),
  }
  assert_eq!(h.quantity(1), Some(5));
  assert_eq!(h.inventory.decrements.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
#[serial]
async fn empty_cart_touches_no_store() {
  setup_tracing();
  let h = Harness::new(&[(1, 5)]);

  let failure = h.placer.place_order(request(7, &[])).await.unwrap_err();

  assert!(matches!(failure.reason, PlacementError::EmptyCart));
  assert!(!failure.partially_applied);
  assert_eq!(h.inventory.total_calls(), 0);
  assert_eq!(h.orders.total_calls(), 0);
}

#[tokio::test]
#[serial]
async fn missing_fields_are_reported_first_missing_first() {
  setup_tracing();
  let h = Harness::new(&[(1, 5)]);

  let mut req = request(7, &[(1, 1)]);
  req.shipping_address_id = None;
  req.billing_address_id = None;
  let failure = h.placer.place_order(req).await.unwrap_err();
  assert!(matches!(
    failure.reason,
    PlacementError::MissingField { field: "shippingAddressId" }
  ));

  // Missing fields win over an empty cart.
  let mut req = request(7, &[]);
  req.user_payment_id = None;
  let failure = h.placer.place_order(req).await.unwrap_err();
  assert!(matches!(failure.reason, PlacementError::MissingField { field: "userPaymentId" }));

  assert_eq!(h.inventory.total_calls(), 0);
  assert_eq!(h.quantity(1), Some(5));
}

#[tokio::test]
#[serial]
async fn zero_quantity_and_duplicate_lines_are_rejected_up_front() {
  setup_tracing();
  let h = Harness::new(&[(1, 5), (2, 5)]);

  let failure = h.placer.place_order(request(7, &[(1, 1), (2, 0)])).await.unwrap_err();
  assert!(matches!(
    failure.reason,
    PlacementError::InvalidQuantity { product_id: ProductId(2), quantity: 0 }
  ));

  let failure = h.placer.place_order(request(7, &[(1, 1), (2, 1), (1, 2)])).await.unwrap_err();
  assert!(matches!(
    failure.reason,
    PlacementError::DuplicateProduct { product_id: ProductId(1) }
  ));
  assert!(failure.reason.is_business_outcome());

  assert_eq!(h.inventory.total_calls(), 0);
}

#[tokio::test]
#[serial]
async fn line_item_quantities_match_what_was_decremented() {
  setup_tracing();
  let h = Harness::new(&[(1, 10), (2, 10), (3, 10)]);

  let carts: [&[(i64, u32)]; 3] = [&[(1, 2), (2, 3)], &[(3, 4)], &[(1, 1), (2, 1), (3, 1)]];
  for (user, lines) in carts.iter().enumerate() {
    h.placer.place_order(request(user as i64 + 1, lines)).await.unwrap();
  }

  for product in [1, 2, 3] {
    let ordered: u32 = h
      .orders
      .inner
      .all_line_items()
      .iter()
      .filter(|i| i.product_id == ProductId(product))
      .map(|i| i.quantity)
      .sum();
    assert_eq!(10 - h.quantity(product).unwrap(), ordered, "product {product}");
  }
}
