// orderflow/src/store/memory.rs

//! Process-local store implementations, used for demos, benches and tests.

use crate::error::StoreResult;
use crate::model::{
  InventoryRecord, LineItemId, NewOrder, Order, OrderId, OrderLineItem, OrderUpdate, ProductId, UserId,
};
use crate::store::{InventoryStore, OrderStore};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Inventory held in a single mutex; each operation is one critical section,
/// which is what makes `conditional_decrement` atomic.
#[derive(Debug, Default)]
pub struct InMemoryInventory {
  stock: Mutex<HashMap<ProductId, u32>>,
}

impl InMemoryInventory {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_stock(stock: impl IntoIterator<Item = (ProductId, u32)>) -> Self {
    Self {
      stock: Mutex::new(stock.into_iter().collect()),
    }
  }

  pub fn set_quantity(&self, product_id: ProductId, quantity: u32) {
    self.stock.lock().insert(product_id, quantity);
  }

  /// Simulates a product being dropped from the catalog.
  pub fn remove_product(&self, product_id: ProductId) -> bool {
    self.stock.lock().remove(&product_id).is_some()
  }

  pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
    self.stock.lock().get(&product_id).copied()
  }

  /// All records, ordered by product id.
  pub fn records(&self) -> Vec<InventoryRecord> {
    let mut records: Vec<_> = self
      .stock
      .lock()
      .iter()
      .map(|(product_id, available_quantity)| InventoryRecord {
        product_id: *product_id,
        available_quantity: *available_quantity,
      })
      .collect();
    records.sort_by_key(|r| r.product_id);
    records
  }
}

#[async_trait]
impl InventoryStore for InMemoryInventory {
  async fn get_quantity(&self, product_id: ProductId) -> StoreResult<Option<u32>> {
    Ok(self.quantity(product_id))
  }

  async fn conditional_decrement(&self, product_id: ProductId, amount: u32) -> StoreResult<bool> {
    let mut stock = self.stock.lock();
    match stock.get_mut(&product_id) {
      Some(available) if *available >= amount => {
        *available -= amount;
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn increment(&self, product_id: ProductId, amount: u32) -> StoreResult<()> {
    let mut stock = self.stock.lock();
    let available = stock.entry(product_id).or_insert(0);
    *available = available.saturating_add(amount);
    Ok(())
  }
}

#[derive(Debug, Default)]
struct OrderBook {
  last_order_id: i64,
  last_item_id: i64,
  orders: BTreeMap<OrderId, Order>,
  items: Vec<OrderLineItem>,
}

#[derive(Debug, Default)]
pub struct InMemoryOrders {
  book: Mutex<OrderBook>,
}

impl InMemoryOrders {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn orders(&self) -> Vec<Order> {
    self.book.lock().orders.values().cloned().collect()
  }

  pub fn all_line_items(&self) -> Vec<OrderLineItem> {
    self.book.lock().items.clone()
  }

  pub fn order_count(&self) -> usize {
    self.book.lock().orders.len()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
  async fn insert_order(&self, header: &NewOrder) -> StoreResult<OrderId> {
    let mut book = self.book.lock();
    book.last_order_id += 1;
    let order_id = OrderId(book.last_order_id);
    book.orders.insert(order_id, Order::from_new(order_id, header, Utc::now()));
    Ok(order_id)
  }

  async fn insert_line_item(&self, order_id: OrderId, product_id: ProductId, quantity: u32) -> StoreResult<LineItemId> {
    let mut book = self.book.lock();
    if !book.orders.contains_key(&order_id) {
      return Err(anyhow::anyhow!("order {} does not exist", order_id).into());
    }
    book.last_item_id += 1;
    let order_item_id = LineItemId(book.last_item_id);
    book.items.push(OrderLineItem {
      order_item_id,
      order_id,
      product_id,
      quantity,
    });
    Ok(order_item_id)
  }

  async fn delete_order(&self, order_id: OrderId) -> StoreResult<bool> {
    let mut book = self.book.lock();
    let existed = book.orders.remove(&order_id).is_some();
    book.items.retain(|item| item.order_id != order_id);
    Ok(existed)
  }

  async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
    Ok(self.book.lock().orders.get(&order_id).cloned())
  }

  async fn line_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderLineItem>> {
    Ok(
      self
        .book
        .lock()
        .items
        .iter()
        .filter(|item| item.order_id == order_id)
        .copied()
        .collect(),
    )
  }

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
    Ok(
      self
        .book
        .lock()
        .orders
        .values()
        .filter(|order| order.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    Ok(self.book.lock().orders.values().rev().cloned().collect())
  }

  async fn update_order(&self, order_id: OrderId, update: &OrderUpdate) -> StoreResult<Option<Order>> {
    let mut book = self.book.lock();
    Ok(book.orders.get_mut(&order_id).map(|order| {
      update.apply(order, Utc::now());
      order.clone()
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{AddressId, PaymentId};

  #[tokio::test]
  async fn conditional_decrement_never_goes_below_zero() {
    let inventory = InMemoryInventory::with_stock([(ProductId(1), 3)]);
    assert!(inventory.conditional_decrement(ProductId(1), 2).await.unwrap());
    assert!(!inventory.conditional_decrement(ProductId(1), 2).await.unwrap());
    assert_eq!(inventory.quantity(ProductId(1)), Some(1));
    assert!(!inventory.conditional_decrement(ProductId(9), 1).await.unwrap());
  }

  #[tokio::test]
  async fn deleting_an_order_removes_its_line_items() {
    let orders = InMemoryOrders::new();
    let header = NewOrder {
      user_id: UserId(7),
      total_price_cents: 1299,
      user_payment_id: PaymentId(1),
      shipping_address_id: AddressId(2),
      billing_address_id: AddressId(3),
    };
    let first = orders.insert_order(&header).await.unwrap();
    let second = orders.insert_order(&header).await.unwrap();
    orders.insert_line_item(first, ProductId(1), 2).await.unwrap();
    orders.insert_line_item(second, ProductId(1), 1).await.unwrap();

    assert!(orders.delete_order(first).await.unwrap());
    assert!(orders.line_items(first).await.unwrap().is_empty());
    assert_eq!(orders.line_items(second).await.unwrap().len(), 1);
    assert!(!orders.delete_order(first).await.unwrap());
    assert!(orders.insert_line_item(first, ProductId(1), 1).await.is_err());
  }

  #[tokio::test]
  async fn updates_touch_only_the_fields_that_are_set() {
    let orders = InMemoryOrders::new();
    let header = NewOrder {
      user_id: UserId(7),
      total_price_cents: 1299,
      user_payment_id: PaymentId(1),
      shipping_address_id: AddressId(2),
      billing_address_id: AddressId(3),
    };
    let order_id = orders.insert_order(&header).await.unwrap();
    let update = OrderUpdate {
      shipping_address_id: Some(AddressId(9)),
      ..OrderUpdate::default()
    };

    let updated = orders.update_order(order_id, &update).await.unwrap().unwrap();
    assert_eq!(updated.shipping_address_id, AddressId(9));
    assert_eq!(updated.billing_address_id, AddressId(3));
    assert_eq!(updated.total_price_cents, 1299);
    assert!(updated.updated_at >= updated.created_at);
    assert!(orders.update_order(OrderId(99), &update).await.unwrap().is_none());

    let second = orders.insert_order(&header).await.unwrap();
    let listed: Vec<_> = orders.list_orders().await.unwrap().iter().map(|o| o.order_id).collect();
    assert_eq!(listed, vec![second, order_id]);
  }
}
