use crate::{
    abstract_trait::{DynOrderQueryRepository, DynUserQueryRepository, OrderQueryServiceTrait},
    domain::{
        enums::PlacementState,
        responses::{AdminOrdersResponse, ApiResponse, OrderResponse, OrderStatsResponse},
        session::Session,
    },
    errors::ServiceError,
    model::{OrderStats, User},
    utils::{Method, ServiceObserver},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use std::collections::HashMap;
use tracing::info;

pub struct OrderQueryService {
    query: DynOrderQueryRepository,
    users: DynUserQueryRepository,
    observer: ServiceObserver,
}

impl OrderQueryService {
    pub fn new(
        query: DynOrderQueryRepository,
        users: DynUserQueryRepository,
        observer: ServiceObserver,
    ) -> Self {
        Self {
            query,
            users,
            observer,
        }
    }

    async fn get_order_inner(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<OrderResponse, ServiceError> {
        // pending and failed placements stay invisible
        let order = self
            .query
            .find_by_id(order_id)
            .await?
            .filter(|order| order.placement_state == PlacementState::Placed)
            .ok_or_else(|| ServiceError::not_found("Order"))?;

        if !session.can_manage_order(order.user_id) {
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }

        let customer = self.users.find_by_id(order.user_id).await?;
        Ok(OrderResponse::from(order).with_customer(customer.as_ref()))
    }

    async fn admin_all_inner(&self, session: &Session) -> Result<AdminOrdersResponse, ServiceError> {
        if !session.is_admin() {
            return Err(ServiceError::Forbidden("Admin access required".to_string()));
        }

        let orders = self.query.find_all_placed().await?;
        let stats = OrderStatsResponse::from(OrderStats::from_orders(&orders));

        let mut user_ids: Vec<i32> = orders.iter().map(|order| order.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let customers: HashMap<i32, User> = self
            .users
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|user| (user.user_id, user))
            .collect();

        Ok(AdminOrdersResponse {
            orders: orders
                .into_iter()
                .map(|order| {
                    let customer = customers.get(&order.user_id);
                    OrderResponse::from(order).with_customer(customer)
                })
                .collect(),
            stats,
        })
    }
}

#[async_trait]
impl OrderQueryServiceTrait for OrderQueryService {
    async fn my_orders(
        &self,
        user_id: i32,
    ) -> Result<ApiResponse<Vec<OrderResponse>>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "my_orders",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("order.user_id", user_id.to_string()),
            ],
        );

        let result = self
            .query
            .find_placed_by_user(user_id)
            .await
            .map_err(ServiceError::from);

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Orders retrieved");

        let orders = result?;
        info!("📦 User {} has {} orders", user_id, orders.len());

        Ok(ApiResponse::success(
            "Orders retrieved successfully",
            orders.into_iter().map(OrderResponse::from).collect(),
        ))
    }

    async fn get_order(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "get_order",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("order.id", order_id.to_string()),
            ],
        );

        let result = self.get_order_inner(session, order_id).await;

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Order retrieved");

        Ok(ApiResponse::success("Order retrieved successfully", result?))
    }

    async fn admin_all(
        &self,
        session: &Session,
    ) -> Result<ApiResponse<AdminOrdersResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "admin_all_orders",
            vec![
                KeyValue::new("component", "order"),
                KeyValue::new("session.user_id", session.user_id.to_string()),
            ],
        );

        let result = self.admin_all_inner(session).await;

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "All orders retrieved");

        Ok(ApiResponse::success("Orders retrieved successfully", result?))
    }
}
