// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper.

use async_trait::async_trait;
use orderflow::{
  AddressId, CartLine, InMemoryInventory, InMemoryOrders, InventoryStore, LeakReport, LeakReporter, LineItemId,
  NewOrder, Order, OrderId, OrderLineItem, OrderPlacer, OrderStore, OrderUpdate, PaymentId, PlacementConfig,
  PlacementRequest, ProductId, RetryPolicy, StoreResult, UserId,
};
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use std::time::Duration;
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---

/// Short timeouts and near-instant backoff so failure paths finish quickly.
pub fn fast_config() -> PlacementConfig {
  PlacementConfig::default()
    .with_store_timeout(Duration::from_millis(100))
    .with_compensation(RetryPolicy {
      max_attempts: 3,
      initial_backoff: Duration::from_millis(1),
      max_backoff: Duration::from_millis(5),
    })
}

pub fn cart(lines: &[(i64, u32)]) -> Vec<CartLine> {
  lines.iter().map(|(product_id, quantity)| CartLine::new(*product_id, *quantity)).collect()
}

pub fn request(user_id: i64, lines: &[(i64, u32)]) -> PlacementRequest {
  PlacementRequest {
    user_id: UserId(user_id),
    total_price_cents: 1_000 * lines.len() as i64,
    user_payment_id: Some(PaymentId(11)),
    shipping_address_id: Some(AddressId(21)),
    billing_address_id: Some(AddressId(22)),
    cart_lines: cart(lines),
  }
}

pub fn stock(levels: &[(i64, u32)]) -> Arc<InMemoryInventory> {
  Arc::new(InMemoryInventory::with_stock(
    levels.iter().map(|(product_id, quantity)| (ProductId(*product_id), *quantity)),
  ))
}

pub fn header(user_id: i64) -> NewOrder {
  NewOrder {
    user_id: UserId(user_id),
    total_price_cents: 2_500,
    user_payment_id: PaymentId(11),
    shipping_address_id: AddressId(21),
    billing_address_id: AddressId(22),
  }
}

/// Everything a placement test needs to inspect afterwards.
pub struct Harness {
  pub inventory: Arc<FlakyInventory>,
  pub orders: Arc<FlakyOrders>,
  pub leaks: Arc<RecordingLeakReporter>,
  pub placer: OrderPlacer,
}

impl Harness {
  pub fn new(levels: &[(i64, u32)]) -> Self {
    let inventory = Arc::new(FlakyInventory::new(stock(levels)));
    let orders = Arc::new(FlakyOrders::new(Arc::new(InMemoryOrders::new())));
    let leaks = Arc::new(RecordingLeakReporter::default());
    let placer = OrderPlacer::new(inventory.clone(), orders.clone())
      .with_config(fast_config())
      .with_leak_reporter(leaks.clone());
    Self {
      inventory,
      orders,
      leaks,
      placer,
    }
  }

  pub fn quantity(&self, product_id: i64) -> Option<u32> {
    self.inventory.inner.quantity(ProductId(product_id))
  }

  pub fn line_items_for(&self, order_id: OrderId) -> Vec<OrderLineItem> {
    self
      .orders
      .inner
      .all_line_items()
      .into_iter()
      .filter(|item| item.order_id == order_id)
      .collect()
  }
}

// --- Fault-injecting stores ---

#[derive(Debug, Default)]
pub struct InventoryFaults {
  /// Every `get_quantity` fails.
  pub fail_reads: bool,
  /// `conditional_decrement` on this product fails without touching stock.
  pub fail_decrement_for: Option<ProductId>,
  /// `conditional_decrement` on this product lands, then stalls for the duration.
  pub stall_after_decrement: Option<(ProductId, Duration)>,
  /// Product removed from the catalog right before its decrement.
  pub delete_before_decrement: Option<ProductId>,
  /// The next N `increment` calls fail.
  pub increment_failures: usize,
  /// Every `increment` fails.
  pub increments_broken: bool,
}

/// Wraps [`InMemoryInventory`], counting calls and injecting failures.
pub struct FlakyInventory {
  pub inner: Arc<InMemoryInventory>,
  pub faults: Mutex<InventoryFaults>,
  pub reads: AtomicUsize,
  pub decrements: AtomicUsize,
  pub increments: AtomicUsize,
}

impl FlakyInventory {
  pub fn new(inner: Arc<InMemoryInventory>) -> Self {
    Self {
      inner,
      faults: Mutex::new(InventoryFaults::default()),
      reads: AtomicUsize::new(0),
      decrements: AtomicUsize::new(0),
      increments: AtomicUsize::new(0),
    }
  }

  pub fn total_calls(&self) -> usize {
    self.reads.load(Ordering::SeqCst) + self.decrements.load(Ordering::SeqCst) + self.increments.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl InventoryStore for FlakyInventory {
  async fn get_quantity(&self, product_id: ProductId) -> StoreResult<Option<u32>> {
    self.reads.fetch_add(1, Ordering::SeqCst);
    if self.faults.lock().fail_reads {
      return Err(anyhow::anyhow!("inventory read refused").into());
    }
    self.inner.get_quantity(product_id).await
  }

  async fn conditional_decrement(&self, product_id: ProductId, amount: u32) -> StoreResult<bool> {
    self.decrements.fetch_add(1, Ordering::SeqCst);
    let (fail, stall, delete) = {
      let faults = self.faults.lock();
      (
        faults.fail_decrement_for == Some(product_id),
        faults.stall_after_decrement.filter(|(p, _)| *p == product_id).map(|(_, d)| d),
        faults.delete_before_decrement == Some(product_id),
      )
    };
    if fail {
      return Err(anyhow::anyhow!("inventory write refused for product {}", product_id).into());
    }
    if delete {
      self.inner.remove_product(product_id);
    }
    let applied = self.inner.conditional_decrement(product_id, amount).await?;
    if let Some(stall) = stall {
      tokio::time::sleep(stall).await;
    }
    Ok(applied)
  }

  async fn increment(&self, product_id: ProductId, amount: u32) -> StoreResult<()> {
    self.increments.fetch_add(1, Ordering::SeqCst);
    let refuse = {
      let mut faults = self.faults.lock();
      if faults.increments_broken {
        true
      } else if faults.increment_failures > 0 {
        faults.increment_failures -= 1;
        true
      } else {
        false
      }
    };
    if refuse {
      return Err(anyhow::anyhow!("inventory increment refused").into());
    }
    self.inner.increment(product_id, amount).await
  }
}

#[derive(Debug, Default)]
pub struct OrderFaults {
  pub fail_header: bool,
  /// `insert_order` commits the header, then stalls for the duration.
  pub stall_after_header: Option<Duration>,
  /// `insert_order` panics instead of returning.
  pub panic_on_header: bool,
  /// Zero-based index of the line-item insert (counted across the store's lifetime) that fails.
  pub fail_line_item_at: Option<usize>,
  /// The next N `delete_order` calls fail.
  pub delete_failures: usize,
  pub deletes_broken: bool,
}

/// Wraps [`InMemoryOrders`], counting calls and injecting failures.
pub struct FlakyOrders {
  pub inner: Arc<InMemoryOrders>,
  pub faults: Mutex<OrderFaults>,
  pub headers: AtomicUsize,
  pub line_items: AtomicUsize,
  pub deletes: AtomicUsize,
}

impl FlakyOrders {
  pub fn new(inner: Arc<InMemoryOrders>) -> Self {
    Self {
      inner,
      faults: Mutex::new(OrderFaults::default()),
      headers: AtomicUsize::new(0),
      line_items: AtomicUsize::new(0),
      deletes: AtomicUsize::new(0),
    }
  }

  pub fn total_calls(&self) -> usize {
    self.headers.load(Ordering::SeqCst) + self.line_items.load(Ordering::SeqCst) + self.deletes.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl OrderStore for FlakyOrders {
  async fn insert_order(&self, header: &NewOrder) -> StoreResult<OrderId> {
    self.headers.fetch_add(1, Ordering::SeqCst);
    let (fail, stall, panic) = {
      let faults = self.faults.lock();
      (faults.fail_header, faults.stall_after_header, faults.panic_on_header)
    };
    if panic {
      panic!("order store crashed mid-insert");
    }
    if fail {
      return Err(anyhow::anyhow!("order insert refused").into());
    }
    let order_id = self.inner.insert_order(header).await?;
    if let Some(stall) = stall {
      tokio::time::sleep(stall).await;
    }
    Ok(order_id)
  }

  async fn insert_line_item(&self, order_id: OrderId, product_id: ProductId, quantity: u32) -> StoreResult<LineItemId> {
    let index = self.line_items.fetch_add(1, Ordering::SeqCst);
    if self.faults.lock().fail_line_item_at == Some(index) {
      return Err(anyhow::anyhow!("line item insert refused").into());
    }
    self.inner.insert_line_item(order_id, product_id, quantity).await
  }

  async fn delete_order(&self, order_id: OrderId) -> StoreResult<bool> {
    self.deletes.fetch_add(1, Ordering::SeqCst);
    let refuse = {
      let mut faults = self.faults.lock();
      if faults.deletes_broken {
        true
      } else if faults.delete_failures > 0 {
        faults.delete_failures -= 1;
        true
      } else {
        false
      }
    };
    if refuse {
      return Err(anyhow::anyhow!("order delete refused").into());
    }
    self.inner.delete_order(order_id).await
  }

  async fn find_order(&self, order_id: OrderId) -> StoreResult<Option<Order>> {
    self.inner.find_order(order_id).await
  }

  async fn line_items(&self, order_id: OrderId) -> StoreResult<Vec<OrderLineItem>> {
    self.inner.line_items(order_id).await
  }

  async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<Order>> {
    self.inner.orders_for_user(user_id).await
  }

  async fn list_orders(&self) -> StoreResult<Vec<Order>> {
    self.inner.list_orders().await
  }

  async fn update_order(&self, order_id: OrderId, update: &OrderUpdate) -> StoreResult<Option<Order>> {
    self.inner.update_order(order_id, update).await
  }
}

// --- Operator channel ---

#[derive(Debug, Default)]
pub struct RecordingLeakReporter {
  reports: Mutex<Vec<LeakReport>>,
}

impl RecordingLeakReporter {
  pub fn reports(&self) -> Vec<LeakReport> {
    self.reports.lock().clone()
  }
}

#[async_trait]
impl LeakReporter for RecordingLeakReporter {
  async fn report(&self, report: &LeakReport) {
    self.reports.lock().push(report.clone());
  }
}
