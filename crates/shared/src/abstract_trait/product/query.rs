use crate::{
    domain::{
        requests::FindAllProducts,
        responses::{ApiResponse, ProductListResponse, ProductResponse},
    },
    errors::{RepositoryError, ServiceError},
    model::{Product as ProductModel, Review as ReviewModel},
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynProductQueryRepository = Arc<dyn ProductQueryRepositoryTrait + Send + Sync>;
pub type DynProductQueryService = Arc<dyn ProductQueryServiceTrait + Send + Sync>;

#[async_trait]
pub trait ProductQueryRepositoryTrait {
    /// Active products matching the filters, plus the total match count.
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<(Vec<ProductModel>, i64), RepositoryError>;
    async fn find_by_id(&self, product_id: i32) -> Result<Option<ProductModel>, RepositoryError>;
    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<ProductModel>, RepositoryError>;
    async fn find_reviews(&self, product_id: i32) -> Result<Vec<ReviewModel>, RepositoryError>;
}

#[async_trait]
pub trait ProductQueryServiceTrait {
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<ApiResponse<ProductListResponse>, ServiceError>;
    async fn find_by_id(&self, product_id: i32)
    -> Result<ApiResponse<ProductResponse>, ServiceError>;
}
