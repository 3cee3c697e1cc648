use crate::{
    domain::{
        requests::{AddToCartRequest, UpdateCartRequest},
        responses::{ApiResponse, CartResponse},
    },
    errors::{RepositoryError, ServiceError},
    model::Cart as CartModel,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynCartRepository = Arc<dyn CartRepositoryTrait + Send + Sync>;
pub type DynCartService = Arc<dyn CartServiceTrait + Send + Sync>;

#[async_trait]
pub trait CartRepositoryTrait {
    async fn find_by_user(&self, user_id: i32) -> Result<Option<CartModel>, RepositoryError>;

    /// Upserts the cart row and replaces its items with `cart.items`.
    async fn save(&self, cart: &CartModel) -> Result<CartModel, RepositoryError>;

    /// Returns whether a cart existed.
    async fn delete_by_user(&self, user_id: i32) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait CartServiceTrait {
    async fn get_cart(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn add_item(
        &self,
        user_id: i32,
        req: &AddToCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn update_quantity(
        &self,
        user_id: i32,
        req: &UpdateCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn remove_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<ApiResponse<CartResponse>, ServiceError>;
    async fn clear(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError>;
}
