use crate::{
    abstract_trait::{DynProductQueryRepository, DynUserQueryRepository, ProductQueryServiceTrait},
    domain::{
        requests::FindAllProducts,
        responses::{ApiResponse, ProductListResponse, ProductResponse},
    },
    errors::ServiceError,
    utils::{Method, ServiceObserver},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use std::collections::HashMap;
use tracing::info;

pub struct ProductQueryService {
    query: DynProductQueryRepository,
    users: DynUserQueryRepository,
    observer: ServiceObserver,
}

impl ProductQueryService {
    pub fn new(
        query: DynProductQueryRepository,
        users: DynUserQueryRepository,
        observer: ServiceObserver,
    ) -> Self {
        Self {
            query,
            users,
            observer,
        }
    }

    async fn seller_names(&self, seller_ids: &[i32]) -> Result<HashMap<i32, String>, ServiceError> {
        let mut seller_ids = seller_ids.to_vec();
        seller_ids.sort_unstable();
        seller_ids.dedup();

        Ok(self
            .users
            .find_by_ids(&seller_ids)
            .await?
            .into_iter()
            .map(|user| (user.user_id, user.name))
            .collect())
    }

    async fn find_all_inner(
        &self,
        req: &FindAllProducts,
    ) -> Result<ProductListResponse, ServiceError> {
        let (products, total) = self.query.find_all(req).await?;
        let limit = req.limit.max(1) as i64;
        let total_pages = (total + limit - 1) / limit;

        let seller_ids: Vec<i32> = products.iter().map(|product| product.seller_id).collect();
        let sellers = self.seller_names(&seller_ids).await?;

        info!("✅ Found {} products on page {}", products.len(), req.page);

        Ok(ProductListResponse {
            products: products
                .into_iter()
                .map(|product| {
                    let seller = sellers.get(&product.seller_id).cloned();
                    ProductResponse::from(product).with_seller(seller)
                })
                .collect(),
            current_page: req.page,
            total_pages,
            total_products: total,
        })
    }

    async fn find_by_id_inner(&self, product_id: i32) -> Result<ProductResponse, ServiceError> {
        let product = self
            .query
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        let reviews = self.query.find_reviews(product_id).await?;
        let seller = self
            .users
            .find_by_id(product.seller_id)
            .await?
            .map(|user| user.name);

        Ok(ProductResponse::from(product)
            .with_reviews(reviews)
            .with_seller(seller))
    }
}

#[async_trait]
impl ProductQueryServiceTrait for ProductQueryService {
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<ApiResponse<ProductListResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "find_all_products",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.page", req.page.to_string()),
                KeyValue::new("product.limit", req.limit.to_string()),
                KeyValue::new(
                    "product.search",
                    req.search_term().unwrap_or_default().to_string(),
                ),
            ],
        );

        let result = self.find_all_inner(req).await;

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Products retrieved");

        Ok(ApiResponse::success("Products retrieved successfully", result?))
    }

    async fn find_by_id(
        &self,
        product_id: i32,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "find_product_by_id",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("product.id", product_id.to_string()),
            ],
        );

        let result = self.find_by_id_inner(product_id).await;

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Product retrieved");

        Ok(ApiResponse::success("Product retrieved successfully", result?))
    }
}
