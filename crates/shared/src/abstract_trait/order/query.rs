use crate::{
    domain::{
        responses::{AdminOrdersResponse, ApiResponse, OrderResponse},
        session::Session,
    },
    errors::{RepositoryError, ServiceError},
    model::Order as OrderModel,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Arc;

pub type DynOrderQueryRepository = Arc<dyn OrderQueryRepositoryTrait + Send + Sync>;
pub type DynOrderQueryService = Arc<dyn OrderQueryServiceTrait + Send + Sync>;

/// Every lookup returns orders with their items loaded.
#[async_trait]
pub trait OrderQueryRepositoryTrait {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderModel>, RepositoryError>;

    /// Placed orders of one user, newest first.
    async fn find_placed_by_user(&self, user_id: i32) -> Result<Vec<OrderModel>, RepositoryError>;

    /// Every placed order, newest first.
    async fn find_all_placed(&self) -> Result<Vec<OrderModel>, RepositoryError>;

    async fn find_pending_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<OrderModel>, RepositoryError>;

    /// Cancelled orders with at least one item whose stock is still applied.
    async fn find_cancelled_unreleased(&self) -> Result<Vec<OrderModel>, RepositoryError>;
}

#[async_trait]
pub trait OrderQueryServiceTrait {
    async fn my_orders(&self, user_id: i32)
    -> Result<ApiResponse<Vec<OrderResponse>>, ServiceError>;
    async fn get_order(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;
    async fn admin_all(
        &self,
        session: &Session,
    ) -> Result<ApiResponse<AdminOrdersResponse>, ServiceError>;
}
