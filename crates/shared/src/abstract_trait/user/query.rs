use crate::{errors::RepositoryError, model::User as UserModel};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynUserQueryRepository = Arc<dyn UserQueryRepositoryTrait + Send + Sync>;

#[async_trait]
pub trait UserQueryRepositoryTrait {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<UserModel>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, RepositoryError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserModel>, RepositoryError>;
    /// Unknown ids are skipped.
    async fn find_by_ids(&self, user_ids: &[i32]) -> Result<Vec<UserModel>, RepositoryError>;
}
