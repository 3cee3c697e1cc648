use crate::{
    domain::{
        requests::UpdateProfileRequest,
        responses::{ApiResponse, UserResponse, WishlistResponse},
    },
    errors::ServiceError,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynProfileService = Arc<dyn ProfileServiceTrait + Send + Sync>;

#[async_trait]
pub trait ProfileServiceTrait {
    async fn get_profile(&self, user_id: i32) -> Result<ApiResponse<UserResponse>, ServiceError>;
    async fn update_profile(
        &self,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError>;
    async fn toggle_wishlist(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<ApiResponse<WishlistResponse>, ServiceError>;
}
