use super::{InMemoryCatalog, now};
use crate::{
    abstract_trait::{OrderCommandRepositoryTrait, OrderQueryRepositoryTrait},
    domain::{
        enums::{OrderStatus, PaymentStatus, PlacementState},
        requests::CreateOrderRecord,
    },
    errors::RepositoryError,
    model::{Order, OrderItem},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::{cmp::Reverse, collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

#[derive(Default)]
struct OrderState {
    orders: HashMap<i32, Order>,
    next_order_id: i32,
    next_item_id: i32,
}

impl OrderState {
    fn item_mut(&mut self, order_item_id: i32) -> Option<&mut OrderItem> {
        self.orders
            .values_mut()
            .flat_map(|order| order.items.iter_mut())
            .find(|item| item.order_item_id == order_item_id)
    }

    fn newest_first(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self.orders.values().filter(|o| keep(o)).cloned().collect();
        orders.sort_by_key(|o| Reverse((o.created_at, o.order_id)));
        orders
    }
}

/// Order table bound to a catalog. Stock apply/release adjust that catalog
/// while holding the order lock, so the flag and the stock move together.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
    catalog: InMemoryCatalog,
    failures: Arc<Mutex<HashMap<&'static str, u32>>>,
}

impl InMemoryOrderStore {
    pub fn new(catalog: InMemoryCatalog) -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderState::default())),
            catalog,
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Makes the next `times` calls of `operation` fail with a timeout.
    pub async fn fail_next(&self, operation: &'static str, times: u32) {
        self.failures.lock().await.insert(operation, times);
    }

    /// Moves an order's creation time back, to simulate a stale placement.
    pub async fn backdate(&self, order_id: i32, by: chrono::Duration) {
        if let Some(order) = self.state.write().await.orders.get_mut(&order_id) {
            order.created_at = order.created_at.map(|created| created - by);
        }
    }

    pub async fn all_orders(&self) -> Vec<Order> {
        self.state.read().await.newest_first(|_| true)
    }

    async fn injected_failure(&self, operation: &'static str) -> Result<(), RepositoryError> {
        let mut failures = self.failures.lock().await;
        match failures.get_mut(operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(RepositoryError::Timeout(format!("{operation} injected failure")))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for InMemoryOrderStore {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn find_placed_by_user(&self, user_id: i32) -> Result<Vec<Order>, RepositoryError> {
        Ok(self.state.read().await.newest_first(|o| {
            o.user_id == user_id && o.placement_state == PlacementState::Placed
        }))
    }

    async fn find_all_placed(&self) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .newest_first(|o| o.placement_state == PlacementState::Placed))
    }

    async fn find_pending_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.state.read().await.newest_first(|o| {
            o.placement_state == PlacementState::Pending
                && o.created_at.is_some_and(|created| created < cutoff)
        });
        orders.reverse();
        Ok(orders)
    }

    async fn find_cancelled_unreleased(&self) -> Result<Vec<Order>, RepositoryError> {
        let mut orders = self.state.read().await.newest_first(|o| {
            o.order_status == OrderStatus::Cancelled && o.items.iter().any(|i| i.stock_applied)
        });
        orders.reverse();
        Ok(orders)
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for InMemoryOrderStore {
    async fn create_order(&self, record: &CreateOrderRecord) -> Result<Order, RepositoryError> {
        self.injected_failure("create_order").await?;

        let mut state = self.state.write().await;

        if state
            .orders
            .values()
            .any(|o| o.tracking_id == record.tracking_id)
        {
            return Err(RepositoryError::AlreadyExists("tracking id".to_string()));
        }

        state.next_order_id += 1;
        let order_id = state.next_order_id;

        let mut items = Vec::with_capacity(record.items.len());
        for item in &record.items {
            state.next_item_id += 1;
            items.push(OrderItem {
                order_item_id: state.next_item_id,
                order_id,
                product_id: item.product_id,
                name: item.name.clone(),
                price: item.price,
                quantity: item.quantity,
                stock_applied: false,
            });
        }

        let order = Order {
            order_id,
            user_id: record.user_id,
            tracking_id: record.tracking_id.clone(),
            shipping_address: record.shipping_address.clone(),
            payment_method: record.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Placed,
            placement_state: PlacementState::Pending,
            subtotal: record.subtotal,
            delivery_charge: record.delivery_charge,
            total_amount: record.total_amount,
            delivered_at: None,
            cancelled_at: None,
            created_at: now(),
            updated_at: now(),
            items,
        };

        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn apply_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError> {
        self.injected_failure("apply_item_stock").await?;

        let mut state = self.state.write().await;
        let item = state
            .item_mut(order_item_id)
            .ok_or(RepositoryError::NotFound)?;

        if item.stock_applied {
            return Ok(false);
        }

        match self.catalog.apply(item.product_id, -item.quantity, true).await {
            Ok(_) => {}
            Err(RepositoryError::NotFound) => {
                return Err(RepositoryError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: 0,
                });
            }
            Err(err) => return Err(err),
        }
        item.stock_applied = true;

        Ok(true)
    }

    async fn release_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError> {
        self.injected_failure("release_item_stock").await?;

        let mut state = self.state.write().await;
        let item = state
            .item_mut(order_item_id)
            .ok_or(RepositoryError::NotFound)?;

        if !item.stock_applied {
            return Ok(false);
        }

        match self.catalog.apply(item.product_id, item.quantity, false).await {
            Ok(_) | Err(RepositoryError::NotFound) => {}
            Err(err) => return Err(err),
        }
        item.stock_applied = false;

        Ok(true)
    }

    async fn mark_placement(
        &self,
        order_id: i32,
        from: PlacementState,
        to: PlacementState,
    ) -> Result<(), RepositoryError> {
        self.injected_failure("mark_placement").await?;

        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;

        if order.placement_state == to {
            return Ok(());
        }
        if order.placement_state != from {
            return Err(RepositoryError::Conflict(format!(
                "order {order_id} placement is {}",
                order.placement_state
            )));
        }

        order.placement_state = to;
        order.updated_at = now();
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.injected_failure("update_status").await?;

        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&order_id)
            .filter(|o| o.placement_state == PlacementState::Placed)
            .ok_or(RepositoryError::NotFound)?;

        if order.order_status != from {
            return Err(RepositoryError::Conflict(format!(
                "order {order_id} status is {}",
                order.order_status
            )));
        }

        order.order_status = to;
        match to {
            OrderStatus::Delivered => order.delivered_at = now(),
            OrderStatus::Cancelled => order.cancelled_at = now(),
            _ => {}
        }
        order.updated_at = now();

        Ok(order.clone())
    }
}
