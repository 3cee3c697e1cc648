use crate::{
    abstract_trait::{
        DynCartRepository, DynOrderCommandRepository, DynOrderQueryRepository,
        DynProductQueryRepository, OrderCommandServiceTrait,
    },
    domain::{
        enums::{OrderStatus, PlacementState},
        requests::{CreateOrderRecord, NewOrderItem, PlaceOrderRequest, UpdateOrderStatusRequest},
        responses::{ApiResponse, OrderResponse},
        session::Session,
    },
    errors::{RepositoryError, ServiceError},
    model::{Order as OrderModel, Product, delivery_charge_for},
    utils::{Method, RetryPolicy, ServiceObserver, generate_tracking_id, with_retry},
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use opentelemetry::KeyValue;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

/// One lock per user, so a double-submitted checkout runs after the first
/// one finished and finds the cart gone.
#[derive(Default)]
struct CheckoutLocks {
    users: Mutex<HashMap<i32, Arc<Mutex<()>>>>,
}

impl CheckoutLocks {
    async fn acquire(&self, user_id: i32) -> OwnedMutexGuard<()> {
        let lock = self.users.lock().await.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }
}

pub struct OrderCommandServiceDeps {
    pub query: DynOrderQueryRepository,
    pub command: DynOrderCommandRepository,
    pub carts: DynCartRepository,
    pub products: DynProductQueryRepository,
    pub policy: RetryPolicy,
    pub observer: ServiceObserver,
}

pub struct OrderCommandService {
    query: DynOrderQueryRepository,
    command: DynOrderCommandRepository,
    carts: DynCartRepository,
    products: DynProductQueryRepository,
    policy: RetryPolicy,
    locks: CheckoutLocks,
    observer: ServiceObserver,
}

impl OrderCommandService {
    pub fn new(deps: OrderCommandServiceDeps) -> Self {
        let OrderCommandServiceDeps {
            query,
            command,
            carts,
            products,
            policy,
            observer,
        } = deps;

        Self {
            query,
            command,
            carts,
            products,
            policy,
            locks: CheckoutLocks::default(),
            observer,
        }
    }

    fn placement_failed(order_id: i32, step: &str) -> ServiceError {
        ServiceError::OrderPlacementFailed {
            order_id,
            step: step.to_string(),
        }
    }

    /// Reverts every applied decrement of the order. Items that were never
    /// applied, or were already released, are skipped by the store.
    async fn release_items(&self, order: &OrderModel) -> Result<usize, RepositoryError> {
        let mut released = 0;

        for item in &order.items {
            let item_id = item.order_item_id;
            if with_retry(&self.policy, "release_item_stock", || {
                self.command.release_item_stock(item_id)
            })
            .await?
            {
                released += 1;
            }
        }

        Ok(released)
    }

    /// Compensation for a placement that cannot complete. Whatever fails
    /// here leaves the order pending for the reconciler.
    async fn abort(&self, order: &OrderModel) {
        let order_id = order.order_id;

        if let Err(err) = self.release_items(order).await {
            error!(
                "❌ Compensation for order {} stopped while releasing stock: {}",
                order_id, err
            );
            return;
        }

        if let Err(err) = with_retry(&self.policy, "mark_failed", || {
            self.command
                .mark_placement(order_id, PlacementState::Pending, PlacementState::Failed)
        })
        .await
        {
            error!("❌ Could not mark order {} as failed: {}", order_id, err);
        }
    }

    async fn snapshot_items(&self, user_id: i32) -> Result<Vec<NewOrderItem>, ServiceError> {
        let cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(ServiceError::EmptyCart)?;

        let products: HashMap<i32, Product> = self
            .products
            .find_by_ids(&cart.product_ids())
            .await?
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();

        cart.items
            .iter()
            .map(|line| {
                products
                    .get(&line.product_id)
                    .map(|product| NewOrderItem {
                        product_id: product.product_id,
                        name: product.name.clone(),
                        price: product.price,
                        quantity: line.quantity,
                    })
                    .ok_or_else(|| ServiceError::not_found("Product"))
            })
            .collect()
    }

    async fn place_inner(
        &self,
        user_id: i32,
        req: &PlaceOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        let _guard = self.locks.acquire(user_id).await;

        let items = self.snapshot_items(user_id).await?;

        let subtotal: i64 = items
            .iter()
            .map(|item| item.price * item.quantity as i64)
            .sum();
        let delivery_charge = delivery_charge_for(subtotal);

        let record = CreateOrderRecord {
            user_id,
            tracking_id: generate_tracking_id(),
            shipping_address: req.shipping_address.clone().into(),
            payment_method: req.payment_method,
            subtotal,
            delivery_charge,
            total_amount: subtotal + delivery_charge,
            items,
        };

        let mut order = self
            .policy
            .once("create_order", self.command.create_order(&record))
            .await?;
        let order_id = order.order_id;

        info!(
            "📦 Order {} ({}) pending for user {}",
            order_id, order.tracking_id, user_id
        );

        for index in 0..order.items.len() {
            let item_id = order.items[index].order_item_id;

            match with_retry(&self.policy, "apply_item_stock", || {
                self.command.apply_item_stock(item_id)
            })
            .await
            {
                Ok(_) => order.items[index].stock_applied = true,
                Err(RepositoryError::InsufficientStock {
                    requested,
                    available,
                    ..
                }) => {
                    let item = &order.items[index];
                    warn!(
                        "❌ Order {} short on '{}': requested {}, available {}",
                        order_id, item.name, requested, available
                    );
                    let err = ServiceError::InsufficientStock {
                        product_id: item.product_id,
                        name: item.name.clone(),
                    };
                    self.abort(&order).await;
                    return Err(err);
                }
                Err(err) => {
                    error!(
                        "❌ Order {} could not reserve stock for item {}: {}",
                        order_id, item_id, err
                    );
                    self.abort(&order).await;
                    return Err(Self::placement_failed(order_id, "apply_item_stock"));
                }
            }
        }

        if let Err(err) = with_retry(&self.policy, "mark_placed", || {
            self.command
                .mark_placement(order_id, PlacementState::Pending, PlacementState::Placed)
        })
        .await
        {
            error!(
                "❌ Order {} left pending for reconciliation: {}",
                order_id, err
            );
            return Err(Self::placement_failed(order_id, "mark_placed"));
        }
        order.placement_state = PlacementState::Placed;

        if let Err(err) = with_retry(&self.policy, "delete_cart", || {
            self.carts.delete_by_user(user_id)
        })
        .await
        {
            error!(
                "❌ Order {} placed but the cart of user {} was kept: {}",
                order_id, user_id, err
            );
            return Err(Self::placement_failed(order_id, "delete_cart"));
        }

        info!(
            "✅ Order {} placed for user {}, total {}",
            order_id, user_id, order.total_amount
        );

        Ok(order)
    }

    async fn find_placed(&self, order_id: i32) -> Result<OrderModel, ServiceError> {
        self.query
            .find_by_id(order_id)
            .await?
            .filter(|order| order.placement_state == PlacementState::Placed)
            .ok_or_else(|| ServiceError::not_found("Order"))
    }

    /// Validates and applies a status change as a compare-and-set on the
    /// status `order` was read with. A cancel gives stock back only after its
    /// status write landed; a release that stops halfway is finished by the
    /// reconciler.
    async fn transition(
        &self,
        order: OrderModel,
        next: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let from = order.order_status;
        if !from.can_transition_to(next) {
            return Err(ServiceError::InvalidTransition {
                from: from.to_string(),
                to: next.to_string(),
            });
        }

        let order_id = order.order_id;

        let mut updated = match with_retry(&self.policy, "update_status", || {
            self.command.update_status(order_id, from, next)
        })
        .await
        {
            Ok(updated) => updated,
            Err(RepositoryError::Conflict(_)) => {
                let current = self.find_placed(order_id).await?;
                // a retry whose first attempt was applied
                if current.order_status != next {
                    warn!(
                        "⚠️ Order {} moved to {} while applying {} -> {}",
                        order_id, current.order_status, from, next
                    );
                    return Err(ServiceError::InvalidTransition {
                        from: current.order_status.to_string(),
                        to: next.to_string(),
                    });
                }
                current
            }
            Err(err) => return Err(err.into()),
        };

        if next == OrderStatus::Cancelled {
            match self.release_items(&updated).await {
                Ok(released) => {
                    info!("🔄 Restored stock for {} items of order {}", released, order_id);
                    for item in &mut updated.items {
                        item.stock_applied = false;
                    }
                }
                Err(err) => error!(
                    "❌ Order {} cancelled, stock release left for reconciliation: {}",
                    order_id, err
                ),
            }
        }

        Ok(updated)
    }

    async fn cancel_inner(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.find_placed(order_id).await?;

        if !session.can_manage_order(order.user_id) {
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }

        self.transition(order, OrderStatus::Cancelled).await
    }

    async fn update_status_inner(
        &self,
        session: &Session,
        order_id: i32,
        next: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        if !session.is_admin() {
            return Err(ServiceError::Forbidden("Admin access required".to_string()));
        }

        let order = self.find_placed(order_id).await?;
        self.transition(order, next).await
    }
}

#[async_trait]
impl OrderCommandServiceTrait for OrderCommandService {
    async fn place_order(
        &self,
        user_id: i32,
        req: &PlaceOrderRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "place_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "place"),
                KeyValue::new("order.user_id", user_id.to_string()),
                KeyValue::new("order.payment_method", req.payment_method.as_str()),
            ],
        );

        let result = self.place_inner(user_id, req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Order placed");

        Ok(ApiResponse::success(
            "Order placed successfully! 🎉",
            OrderResponse::from(result?),
        ))
    }

    async fn cancel_order(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "cancel_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "cancel"),
                KeyValue::new("order.id", order_id.to_string()),
            ],
        );

        let result = self.cancel_inner(session, order_id).await;

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Order cancelled");

        Ok(ApiResponse::success(
            "Order cancelled",
            OrderResponse::from(result?),
        ))
    }

    async fn update_status(
        &self,
        session: &Session,
        order_id: i32,
        req: &UpdateOrderStatusRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "update_order_status",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "update_status"),
                KeyValue::new("order.id", order_id.to_string()),
                KeyValue::new("order.status", req.order_status.as_str()),
            ],
        );

        let result = self
            .update_status_inner(session, order_id, req.order_status)
            .await;

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Order status updated");

        Ok(ApiResponse::success(
            "Order status updated",
            OrderResponse::from(result?),
        ))
    }

    async fn reconcile_pending(&self, older_than: Duration) -> Result<usize, ServiceError> {
        let tracing_ctx = self.observer.start(
            "reconcile_pending",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("operation", "reconcile"),
                KeyValue::new("reconcile.older_than_secs", older_than.num_seconds()),
            ],
        );

        let cutoff = Utc::now().naive_utc() - older_than;
        let result = async {
            let pending = self.query.find_pending_before(cutoff).await?;
            let cancelled = self.query.find_cancelled_unreleased().await?;
            Ok::<_, RepositoryError>((pending, cancelled))
        }
        .await
        .map_err(ServiceError::from);

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Unsettled orders scanned");

        let (pending, cancelled) = result?;
        let mut repaired = 0;

        for stale in pending {
            // waits out a checkout of the same user still in flight
            let _guard = self.locks.acquire(stale.user_id).await;

            let order = match self.query.find_by_id(stale.order_id).await {
                Ok(Some(order)) if order.placement_state == PlacementState::Pending => order,
                Ok(_) => {
                    info!("Order {} settled before reconciliation", stale.order_id);
                    continue;
                }
                Err(err) => {
                    error!("❌ Reconcile of order {} failed: {}", stale.order_id, err);
                    continue;
                }
            };

            let released = match self.release_items(&order).await {
                Ok(released) => released,
                Err(err) => {
                    error!("❌ Reconcile of order {} failed: {}", order.order_id, err);
                    continue;
                }
            };

            match with_retry(&self.policy, "mark_failed", || {
                self.command.mark_placement(
                    order.order_id,
                    PlacementState::Pending,
                    PlacementState::Failed,
                )
            })
            .await
            {
                Ok(()) => {
                    warn!(
                        "🔄 Order {} was stuck pending, released {} items",
                        order.order_id, released
                    );
                    repaired += 1;
                }
                Err(err) => {
                    error!(
                        "❌ Could not fail stuck order {}: {}",
                        order.order_id, err
                    );
                }
            }
        }

        for order in cancelled {
            match self.release_items(&order).await {
                Ok(0) => {}
                Ok(released) => {
                    warn!(
                        "🔄 Cancelled order {} still held stock, released {} items",
                        order.order_id, released
                    );
                    repaired += 1;
                }
                Err(err) => {
                    error!("❌ Reconcile of order {} failed: {}", order.order_id, err);
                }
            }
        }

        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        abstract_trait::{
            CartRepositoryTrait, OrderCommandRepositoryTrait, OrderQueryRepositoryTrait,
            ProductCommandRepositoryTrait, UserCommandRepositoryTrait,
        },
        domain::{enums::Role, requests::CreateUserRecord},
        model::Cart,
        repository::memory::{
            InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryUserStore,
        },
        service::{
            OrderService, OrderServiceDeps,
            fixtures::{new_product, place_order_request},
        },
    };

    use super::*;
    use prometheus_client::registry::Registry;
    use std::time::Duration as StdDuration;

    const SELLER: i32 = 100;
    const ADMIN: Session = Session {
        user_id: 1,
        role: Role::Admin,
    };

    struct Harness {
        service: OrderService,
        catalog: InMemoryCatalog,
        carts: InMemoryCartStore,
        orders: InMemoryOrderStore,
        users: InMemoryUserStore,
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, StdDuration::from_millis(500)).with_backoff(StdDuration::ZERO)
    }

    async fn harness() -> Harness {
        let catalog = InMemoryCatalog::new();
        let carts = InMemoryCartStore::new();
        let orders = InMemoryOrderStore::new(catalog.clone());
        let users = InMemoryUserStore::new();

        let service = OrderService::new(OrderServiceDeps {
            query: Arc::new(orders.clone()),
            command: Arc::new(orders.clone()),
            carts: Arc::new(carts.clone()),
            products: Arc::new(catalog.clone()),
            users: Arc::new(users.clone()),
            policy: policy(),
            registry: Arc::new(Mutex::new(Registry::default())),
        })
        .await;

        Harness {
            service,
            catalog,
            carts,
            orders,
            users,
        }
    }

    impl Harness {
        /// A command service over the same stores, for reaching its internals.
        async fn command_service(&self) -> OrderCommandService {
            let registry = Arc::new(Mutex::new(Registry::default()));
            OrderCommandService::new(OrderCommandServiceDeps {
                query: Arc::new(self.orders.clone()),
                command: Arc::new(self.orders.clone()),
                carts: Arc::new(self.carts.clone()),
                products: Arc::new(self.catalog.clone()),
                policy: policy(),
                observer: ServiceObserver::new("order-command-service", &registry).await,
            })
        }

        async fn stored(&self, order_id: i32) -> OrderModel {
            self.orders.find_by_id(order_id).await.unwrap().unwrap()
        }

        async fn product(&self, name: &str, price: i64, stock: i32) -> i32 {
            self.catalog
                .create_product(SELLER, &new_product(name, price, stock))
                .await
                .unwrap()
                .product_id
        }

        async fn fill_cart(&self, user_id: i32, lines: &[(i32, i32)]) {
            let mut cart = Cart::empty(user_id);
            for (product_id, quantity) in lines {
                cart.add(*product_id, *quantity);
            }
            self.carts.save(&cart).await.unwrap();
        }

        async fn place(&self, user_id: i32) -> Result<OrderResponse, ServiceError> {
            self.service
                .command
                .place_order(user_id, &place_order_request())
                .await
                .map(|response| response.data)
        }

        async fn stock(&self, product_id: i32) -> i32 {
            self.catalog.stock_of(product_id).await.unwrap()
        }
    }

    fn owner(user_id: i32) -> Session {
        Session::new(user_id, Role::User)
    }

    fn status(order_status: OrderStatus) -> UpdateOrderStatusRequest {
        UpdateOrderStatusRequest { order_status }
    }

    #[tokio::test]
    async fn placing_an_order_decrements_stock_and_clears_the_cart() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;

        let order = h.place(7).await.unwrap();

        assert_eq!(order.subtotal, 600);
        assert_eq!(order.delivery_charge, 0);
        assert_eq!(order.total_amount, 600);
        assert!(order.tracking_id.starts_with("GZ"));
        assert_eq!(order.order_status, OrderStatus::Placed);
        assert_eq!(h.stock(halo).await, 3);
        assert!(h.carts.find_by_user(7).await.unwrap().is_none());

        let mine = h.service.query.my_orders(7).await.unwrap().data;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, order.id);
    }

    #[tokio::test]
    async fn small_orders_pay_for_delivery() {
        let h = harness().await;
        let pad = h.product("Pad", 450, 5).await;
        h.fill_cart(7, &[(pad, 1)]).await;

        let order = h.place(7).await.unwrap();

        assert_eq!(order.delivery_charge, 49);
        assert_eq!(order.total_amount, 499);
    }

    #[tokio::test]
    async fn empty_or_missing_cart_is_rejected() {
        let h = harness().await;
        assert!(matches!(h.place(7).await, Err(ServiceError::EmptyCart)));

        h.fill_cart(8, &[]).await;
        assert!(matches!(h.place(8).await, Err(ServiceError::EmptyCart)));
        assert!(h.orders.all_orders().await.is_empty());
    }

    #[tokio::test]
    async fn deleted_product_fails_before_any_write() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1), (999, 1)]).await;

        let err = h.place(7).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(msg) if msg == "Product not found"));
        assert!(h.orders.all_orders().await.is_empty());
        assert_eq!(h.stock(halo).await, 5);
    }

    #[tokio::test]
    async fn short_stock_rolls_back_and_keeps_the_cart() {
        let h = harness().await;
        let plenty = h.product("Plenty", 100, 5).await;
        let scarce = h.product("Scarce", 100, 1).await;
        h.fill_cart(7, &[(plenty, 2), (scarce, 3)]).await;

        let err = h.place(7).await.unwrap_err();

        assert!(
            matches!(err, ServiceError::InsufficientStock { product_id, ref name } if product_id == scarce && name == "Scarce")
        );
        assert_eq!(h.stock(plenty).await, 5);
        assert_eq!(h.stock(scarce).await, 1);
        assert_eq!(h.carts.find_by_user(7).await.unwrap().unwrap().items.len(), 2);

        let stored = h.orders.all_orders().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].placement_state, PlacementState::Failed);
        assert!(stored[0].items.iter().all(|item| !item.stock_applied));
        assert!(h.service.query.my_orders(7).await.unwrap().data.is_empty());
    }

    #[tokio::test]
    async fn last_unit_goes_to_exactly_one_buyer() {
        let h = harness().await;
        let console = h.product("Last PS5", 45_000, 1).await;
        h.fill_cart(7, &[(console, 1)]).await;
        h.fill_cart(8, &[(console, 1)]).await;

        let (first, second) = tokio::join!(h.place(7), h.place(8));

        let outcomes = [first, second];
        let placed = outcomes.iter().filter(|r| r.is_ok()).count();
        let short = outcomes
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::InsufficientStock { .. })))
            .count();

        assert_eq!((placed, short), (1, 1));
        assert_eq!(h.stock(console).await, 0);
    }

    #[tokio::test]
    async fn double_submit_places_one_order() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;

        let (first, second) = tokio::join!(h.place(7), h.place(7));

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(ServiceError::EmptyCart)))
        );
        assert_eq!(h.stock(halo).await, 4);
        assert_eq!(h.orders.all_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn transient_stock_failures_are_retried() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        h.orders.fail_next("apply_item_stock", 2).await;

        let order = h.place(7).await.unwrap();

        assert_eq!(h.stock(halo).await, 4);
        assert_eq!(order.items.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_compensate_and_report_the_step() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        h.orders.fail_next("apply_item_stock", 10).await;

        let err = h.place(7).await.unwrap_err();

        assert!(
            matches!(err, ServiceError::OrderPlacementFailed { ref step, .. } if step == "apply_item_stock")
        );
        assert_eq!(h.stock(halo).await, 5);
        assert!(h.carts.find_by_user(7).await.unwrap().is_some());
        assert_eq!(
            h.orders.all_orders().await[0].placement_state,
            PlacementState::Failed
        );
    }

    #[tokio::test]
    async fn reconciler_releases_a_stuck_order_once() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;
        // first attempt plus three retries
        h.orders.fail_next("mark_placement", 4).await;

        let err = h.place(7).await.unwrap_err();
        let ServiceError::OrderPlacementFailed { order_id, step } = err else {
            panic!("expected a placement failure");
        };
        assert_eq!(step, "mark_placed");
        assert_eq!(h.stock(halo).await, 3);

        let command = &h.service.command;
        assert_eq!(command.reconcile_pending(Duration::minutes(5)).await.unwrap(), 0);

        h.orders.backdate(order_id, Duration::minutes(10)).await;
        assert_eq!(command.reconcile_pending(Duration::minutes(5)).await.unwrap(), 1);
        assert_eq!(h.stock(halo).await, 5);

        assert_eq!(command.reconcile_pending(Duration::minutes(5)).await.unwrap(), 0);
        assert_eq!(h.stock(halo).await, 5);
    }

    #[tokio::test]
    async fn cancelling_restores_stock_exactly_once() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;
        let order = h.place(7).await.unwrap();

        let cancelled = h
            .service
            .command
            .cancel_order(&owner(7), order.id)
            .await
            .unwrap()
            .data;

        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(h.stock(halo).await, 5);

        let again = h
            .service
            .command
            .cancel_order(&owner(7), order.id)
            .await
            .unwrap_err();
        assert!(matches!(again, ServiceError::InvalidTransition { .. }));
        assert_eq!(h.stock(halo).await, 5);
    }

    #[tokio::test]
    async fn strangers_and_shipped_orders_cannot_be_cancelled() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        let order = h.place(7).await.unwrap();

        let stranger = h
            .service
            .command
            .cancel_order(&owner(8), order.id)
            .await
            .unwrap_err();
        assert!(matches!(stranger, ServiceError::Forbidden(_)));

        let missing = h
            .service
            .command
            .cancel_order(&owner(7), 404)
            .await
            .unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(msg) if msg == "Order not found"));

        for next in [OrderStatus::Confirmed, OrderStatus::Shipped] {
            h.service
                .command
                .update_status(&ADMIN, order.id, &status(next))
                .await
                .unwrap();
        }

        let shipped = h
            .service
            .command
            .cancel_order(&owner(7), order.id)
            .await
            .unwrap_err();
        assert!(matches!(shipped, ServiceError::InvalidTransition { .. }));
        assert_eq!(h.stock(halo).await, 4);
    }

    #[tokio::test]
    async fn status_changes_follow_the_lifecycle() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        let order = h.place(7).await.unwrap();
        let command = &h.service.command;

        let not_admin = command
            .update_status(&owner(7), order.id, &status(OrderStatus::Confirmed))
            .await
            .unwrap_err();
        assert!(matches!(not_admin, ServiceError::Forbidden(_)));

        let skipped = command
            .update_status(&ADMIN, order.id, &status(OrderStatus::Shipped))
            .await
            .unwrap_err();
        assert!(
            matches!(skipped, ServiceError::InvalidTransition { ref from, ref to } if from == "placed" && to == "shipped")
        );

        let mut latest = None;
        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            latest = Some(
                command
                    .update_status(&ADMIN, order.id, &status(next))
                    .await
                    .unwrap()
                    .data,
            );
        }
        let delivered = latest.unwrap();
        assert_eq!(delivered.order_status, OrderStatus::Delivered);
        assert!(delivered.delivered_at.is_some());

        let backwards = command
            .update_status(&ADMIN, order.id, &status(OrderStatus::Placed))
            .await
            .unwrap_err();
        assert!(matches!(backwards, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn admin_cancel_through_status_restores_stock() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 3)]).await;
        let order = h.place(7).await.unwrap();

        h.service
            .command
            .update_status(&ADMIN, order.id, &status(OrderStatus::Cancelled))
            .await
            .unwrap();

        assert_eq!(h.stock(halo).await, 5);
    }

    #[tokio::test]
    async fn admin_listing_carries_fresh_stats() {
        let h = harness().await;
        let cheap = h.product("Cheap", 100, 10).await;
        let big = h.product("Big", 600, 10).await;

        h.fill_cart(7, &[(cheap, 1)]).await;
        let first = h.place(7).await.unwrap();
        h.fill_cart(8, &[(big, 1)]).await;
        let second = h.place(8).await.unwrap();

        for next in [
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ] {
            h.service
                .command
                .update_status(&ADMIN, second.id, &status(next))
                .await
                .unwrap();
        }

        let forbidden = h.service.query.admin_all(&owner(7)).await.unwrap_err();
        assert!(matches!(forbidden, ServiceError::Forbidden(_)));

        let all = h.service.query.admin_all(&ADMIN).await.unwrap().data;
        assert_eq!(all.orders.len(), 2);
        assert_eq!(all.stats.total_orders, 2);
        assert_eq!(all.stats.total_revenue, first.total_amount + second.total_amount);
        assert_eq!(all.stats.pending_orders, 1);
        assert_eq!(all.stats.delivered_orders, 1);

        let foreign = h.service.query.get_order(&owner(8), first.id).await.unwrap_err();
        assert!(matches!(foreign, ServiceError::Forbidden(_)));
        let own = h.service.query.get_order(&owner(7), first.id).await.unwrap().data;
        assert_eq!(own.total_amount, 149);
    }

    #[tokio::test]
    async fn failed_cancel_write_keeps_the_stock_with_the_order() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;
        let order = h.place(7).await.unwrap();
        h.orders.fail_next("update_status", 10).await;

        let err = h
            .service
            .command
            .cancel_order(&owner(7), order.id)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Repo(RepositoryError::Timeout(_))));
        assert_eq!(h.stock(halo).await, 3);
        assert_eq!(h.stored(order.id).await.order_status, OrderStatus::Placed);

        h.orders.fail_next("update_status", 0).await;
        for next in [OrderStatus::Confirmed, OrderStatus::Shipped] {
            h.service
                .command
                .update_status(&ADMIN, order.id, &status(next))
                .await
                .unwrap();
        }
        assert_eq!(h.stock(halo).await, 3);
    }

    #[tokio::test]
    async fn interrupted_cancel_release_is_finished_by_the_reconciler() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;
        let order = h.place(7).await.unwrap();
        h.orders.fail_next("release_item_stock", 10).await;

        let cancelled = h
            .service
            .command
            .cancel_order(&owner(7), order.id)
            .await
            .unwrap()
            .data;
        assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
        assert_eq!(h.stock(halo).await, 3);

        h.orders.fail_next("release_item_stock", 0).await;
        let command = &h.service.command;
        assert_eq!(command.reconcile_pending(Duration::minutes(5)).await.unwrap(), 1);
        assert_eq!(h.stock(halo).await, 5);

        assert_eq!(command.reconcile_pending(Duration::minutes(5)).await.unwrap(), 0);
        assert_eq!(h.stock(halo).await, 5);
    }

    #[tokio::test]
    async fn concurrent_cancel_and_confirm_settle_on_one_status() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        let order = h.place(7).await.unwrap();

        let canceller = owner(7);
        let confirmed = status(OrderStatus::Confirmed);
        let (cancel, confirm) = tokio::join!(
            h.service.command.cancel_order(&canceller, order.id),
            h.service
                .command
                .update_status(&ADMIN, order.id, &confirmed),
        );

        assert_ne!(cancel.is_ok(), confirm.is_ok());
        let stored = h.stored(order.id).await;
        let expected = if stored.order_status == OrderStatus::Cancelled {
            5
        } else {
            assert_eq!(stored.order_status, OrderStatus::Confirmed);
            4
        };
        assert_eq!(h.stock(halo).await, expected);
    }

    #[tokio::test]
    async fn stale_cancel_loses_to_a_status_change_it_did_not_see() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        let order = h.place(7).await.unwrap();
        let command = h.command_service().await;

        let seen = h.stored(order.id).await;
        for next in [OrderStatus::Confirmed, OrderStatus::Shipped] {
            h.service
                .command
                .update_status(&ADMIN, order.id, &status(next))
                .await
                .unwrap();
        }

        let err = command
            .transition(seen, OrderStatus::Cancelled)
            .await
            .unwrap_err();

        assert!(
            matches!(err, ServiceError::InvalidTransition { ref from, ref to } if from == "shipped" && to == "cancelled")
        );
        assert_eq!(h.stored(order.id).await.order_status, OrderStatus::Shipped);
        assert_eq!(h.stock(halo).await, 4);
    }

    #[tokio::test]
    async fn placement_marks_only_move_from_the_expected_state() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 1)]).await;
        h.orders.fail_next("mark_placement", 4).await;
        let Err(ServiceError::OrderPlacementFailed { order_id, .. }) = h.place(7).await else {
            panic!("expected a placement failure");
        };

        let wrong_from = h
            .orders
            .mark_placement(order_id, PlacementState::Placed, PlacementState::Failed)
            .await;
        assert!(matches!(wrong_from, Err(RepositoryError::Conflict(_))));

        for _ in 0..2 {
            h.orders
                .mark_placement(order_id, PlacementState::Pending, PlacementState::Placed)
                .await
                .unwrap();
        }

        let late_fail = h
            .orders
            .mark_placement(order_id, PlacementState::Pending, PlacementState::Failed)
            .await;
        assert!(matches!(late_fail, Err(RepositoryError::Conflict(_))));
        assert_eq!(h.stored(order_id).await.placement_state, PlacementState::Placed);
    }

    #[tokio::test]
    async fn reconciler_skips_an_order_settled_while_it_waited() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        h.fill_cart(7, &[(halo, 2)]).await;
        let command = h.command_service().await;
        h.orders.fail_next("mark_placement", 4).await;

        let Err(ServiceError::OrderPlacementFailed { order_id, .. }) =
            command.place_inner(7, &place_order_request()).await
        else {
            panic!("expected a placement failure");
        };
        h.orders.backdate(order_id, Duration::minutes(10)).await;

        let guard = command.locks.acquire(7).await;
        let settle = async {
            tokio::task::yield_now().await;
            h.orders
                .mark_placement(order_id, PlacementState::Pending, PlacementState::Placed)
                .await
                .unwrap();
            drop(guard);
        };

        let (repaired, ()) = tokio::join!(command.reconcile_pending(Duration::minutes(5)), settle);

        assert_eq!(repaired.unwrap(), 0);
        assert_eq!(h.stock(halo).await, 3);
        assert_eq!(h.stored(order_id).await.placement_state, PlacementState::Placed);
    }

    #[tokio::test]
    async fn order_views_carry_the_buyer() {
        let h = harness().await;
        let halo = h.product("Halo", 300, 5).await;
        let buyer = h
            .users
            .create_user(&CreateUserRecord {
                name: "Asha".to_string(),
                email: "asha@gamezone.test".to_string(),
                phone: "9876543210".to_string(),
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();
        h.fill_cart(buyer.user_id, &[(halo, 1)]).await;
        let order = h.place(buyer.user_id).await.unwrap();

        let detail = h
            .service
            .query
            .get_order(&owner(buyer.user_id), order.id)
            .await
            .unwrap()
            .data;
        let customer = detail.customer.unwrap();
        assert_eq!(customer.name, "Asha");
        assert_eq!(customer.email, "asha@gamezone.test");
        assert_eq!(customer.phone, "9876543210");

        let all = h.service.query.admin_all(&ADMIN).await.unwrap().data;
        assert_eq!(
            all.orders[0].customer.as_ref().map(|c| c.name.as_str()),
            Some("Asha")
        );
    }
}
