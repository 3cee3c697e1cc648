use crate::{
    abstract_trait::ProductQueryRepositoryTrait,
    config::ConnectionPool,
    domain::{enums::ProductSort, requests::FindAllProducts},
    errors::RepositoryError,
    model::{Product as ProductModel, Review as ReviewModel},
};
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::{error, info};

#[derive(FromRow)]
struct ProductWithCount {
    #[sqlx(flatten)]
    product: ProductModel,
    total_count: i64,
}

fn order_clause(sort: Option<ProductSort>) -> &'static str {
    match sort {
        Some(ProductSort::PriceLow) => "p.price ASC, p.product_id ASC",
        Some(ProductSort::PriceHigh) => "p.price DESC, p.product_id ASC",
        Some(ProductSort::Rating) => "p.rating_average DESC, p.product_id ASC",
        Some(ProductSort::Newest) | None => "p.created_at DESC, p.product_id DESC",
    }
}

#[derive(Clone)]
pub struct ProductQueryRepository {
    db: ConnectionPool,
}

impl ProductQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for ProductQueryRepository {
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<(Vec<ProductModel>, i64), RepositoryError> {
        info!("🔍 Fetching products with search: {:?}", req.search_term());

        let mut conn = self.db.acquire().await.map_err(|e| {
            error!("❌ Failed to acquire DB connection: {:?}", e);
            RepositoryError::from(e)
        })?;

        let sql = format!(
            r#"
            SELECT p.*, COUNT(*) OVER() AS total_count
            FROM products p
            WHERE p.is_active = TRUE
              AND ($1::TEXT IS NULL OR p.platform = $1)
              AND ($2::TEXT IS NULL OR p.condition = $2)
              AND ($3::TEXT IS NULL OR p.category = $3)
              AND ($4::BIGINT IS NULL OR p.price >= $4)
              AND ($5::BIGINT IS NULL OR p.price <= $5)
              AND (
                $6::TEXT IS NULL
                OR p.name ILIKE '%' || $6 || '%'
                OR p.description ILIKE '%' || $6 || '%'
                OR EXISTS (SELECT 1 FROM unnest(p.tags) AS tag WHERE tag ILIKE '%' || $6 || '%')
              )
              AND ($7::BOOLEAN IS NULL OR p.is_featured = $7)
              AND ($8::BOOLEAN IS NULL OR p.is_deal = $8)
            ORDER BY {}
            LIMIT $9 OFFSET $10
            "#,
            order_clause(req.sort)
        );

        let rows = sqlx::query_as::<_, ProductWithCount>(&sql)
            .bind(req.platform.map(|p| p.as_str()))
            .bind(req.condition.map(|c| c.as_str()))
            .bind(req.category.map(|c| c.as_str()))
            .bind(req.min_price)
            .bind(req.max_price)
            .bind(req.search_term())
            .bind(req.featured.filter(|featured| *featured))
            .bind(req.deals.filter(|deals| *deals))
            .bind(req.limit as i64)
            .bind(req.offset())
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to fetch products: {:?}", e);
                RepositoryError::from(e)
            })?;

        let total = rows.first().map(|row| row.total_count).unwrap_or(0);
        let products = rows.into_iter().map(|row| row.product).collect::<Vec<_>>();

        info!("✅ Retrieved {} products (total {})", products.len(), total);

        Ok((products, total))
    }

    async fn find_by_id(&self, product_id: i32) -> Result<Option<ProductModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let product =
            sqlx::query_as::<_, ProductModel>("SELECT * FROM products WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| {
                    error!("❌ Failed to fetch product {}: {:?}", product_id, e);
                    RepositoryError::from(e)
                })?;

        Ok(product)
    }

    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<ProductModel>, RepositoryError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let products =
            sqlx::query_as::<_, ProductModel>("SELECT * FROM products WHERE product_id = ANY($1)")
                .bind(product_ids)
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| {
                    error!("❌ Failed to fetch products {:?}: {:?}", product_ids, e);
                    RepositoryError::from(e)
                })?;

        Ok(products)
    }

    async fn find_reviews(&self, product_id: i32) -> Result<Vec<ReviewModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let reviews = sqlx::query_as::<_, ReviewModel>(
            r#"
            SELECT review_id, product_id, user_id, name, rating, comment, created_at
            FROM reviews
            WHERE product_id = $1
            ORDER BY created_at DESC, review_id DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch reviews for product {}: {:?}", product_id, e);
            RepositoryError::from(e)
        })?;

        Ok(reviews)
    }
}
