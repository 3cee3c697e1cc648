use crate::{
    domain::{
        requests::{CreateProductRequest, CreateReviewRecord, CreateReviewRequest, UpdateProductRequest},
        responses::{ApiResponse, ProductResponse, StockResponse},
        session::Session,
    },
    errors::{RepositoryError, ServiceError},
    model::Product as ProductModel,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynProductCommandRepository = Arc<dyn ProductCommandRepositoryTrait + Send + Sync>;
pub type DynProductCommandService = Arc<dyn ProductCommandServiceTrait + Send + Sync>;

#[async_trait]
pub trait ProductCommandRepositoryTrait {
    async fn create_product(
        &self,
        seller_id: i32,
        req: &CreateProductRequest,
    ) -> Result<ProductModel, RepositoryError>;
    async fn update_product(
        &self,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ProductModel, RepositoryError>;
    async fn delete_product(&self, product_id: i32) -> Result<(), RepositoryError>;

    /// Inserts the review and refreshes the product's rating mean and count.
    /// `AlreadyExists` when the user reviewed this product before.
    async fn add_review(&self, review: &CreateReviewRecord)
    -> Result<ProductModel, RepositoryError>;

    /// Applies `delta` atomically and returns the new stock. With
    /// `conditional`, a decrement only applies while `stock >= -delta`.
    async fn adjust_stock(
        &self,
        product_id: i32,
        delta: i32,
        conditional: bool,
    ) -> Result<i32, RepositoryError>;
}

#[async_trait]
pub trait ProductCommandServiceTrait {
    async fn create_product(
        &self,
        session: &Session,
        req: &CreateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError>;
    async fn update_product(
        &self,
        session: &Session,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError>;
    async fn delete_product(
        &self,
        session: &Session,
        product_id: i32,
    ) -> Result<ApiResponse<()>, ServiceError>;
    async fn add_review(
        &self,
        session: &Session,
        product_id: i32,
        req: &CreateReviewRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError>;
    async fn adjust_stock(
        &self,
        session: &Session,
        product_id: i32,
        delta: i32,
    ) -> Result<ApiResponse<StockResponse>, ServiceError>;
}
