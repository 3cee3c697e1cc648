use crate::{
    domain::{
        enums::{OrderStatus, PlacementState},
        requests::{CreateOrderRecord, PlaceOrderRequest, UpdateOrderStatusRequest},
        responses::{ApiResponse, OrderResponse},
        session::Session,
    },
    errors::{RepositoryError, ServiceError},
    model::Order as OrderModel,
};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;

pub type DynOrderCommandRepository = Arc<dyn OrderCommandRepositoryTrait + Send + Sync>;
pub type DynOrderCommandService = Arc<dyn OrderCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait OrderCommandRepositoryTrait {
    /// Persists the order and its items with placement state `pending`.
    async fn create_order(&self, record: &CreateOrderRecord) -> Result<OrderModel, RepositoryError>;

    /// Conditionally decrements stock for one order item and flags it as
    /// applied, atomically. Returns `false` when it was already applied.
    async fn apply_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError>;

    /// Reverts an applied decrement and clears the flag. Returns `false`
    /// when there was nothing to release.
    async fn release_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError>;

    /// Moves the placement state from `from` to `to`. Succeeds without a
    /// write when the order is already at `to`, and returns `Conflict` when
    /// it is anywhere else.
    async fn mark_placement(
        &self,
        order_id: i32,
        from: PlacementState,
        to: PlacementState,
    ) -> Result<(), RepositoryError>;

    /// Compare-and-set on the status of a placed order: applies only while
    /// the status is still `from`, otherwise `Conflict`. Stamps
    /// `delivered_at` or `cancelled_at` when `to` calls for it.
    async fn update_status(
        &self,
        order_id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderModel, RepositoryError>;
}

#[async_trait]
pub trait OrderCommandServiceTrait {
    async fn place_order(
        &self,
        user_id: i32,
        req: &PlaceOrderRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;
    async fn cancel_order(
        &self,
        session: &Session,
        order_id: i32,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;
    async fn update_status(
        &self,
        session: &Session,
        order_id: i32,
        req: &UpdateOrderStatusRequest,
    ) -> Result<ApiResponse<OrderResponse>, ServiceError>;

    /// Fails orders stuck in `pending` for longer than `older_than`,
    /// releasing their applied stock, and finishes the stock release of
    /// cancelled orders that still hold some. Returns how many were repaired.
    async fn reconcile_pending(&self, older_than: Duration) -> Result<usize, ServiceError>;
}
