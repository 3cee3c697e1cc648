use crate::{
    domain::requests::{CreateUserRecord, UpdateProfileRequest},
    errors::RepositoryError,
    model::User as UserModel,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynUserCommandRepository = Arc<dyn UserCommandRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait UserCommandRepositoryTrait {
    async fn create_user(&self, record: &CreateUserRecord) -> Result<UserModel, RepositoryError>;
    async fn update_profile(
        &self,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<UserModel, RepositoryError>;
    async fn set_wishlist(
        &self,
        user_id: i32,
        wishlist: &[i32],
    ) -> Result<UserModel, RepositoryError>;
}
