use crate::{
    abstract_trait::ProductCommandRepositoryTrait,
    config::ConnectionPool,
    domain::requests::{CreateProductRequest, CreateReviewRecord, UpdateProductRequest},
    errors::RepositoryError,
    model::Product as ProductModel,
};
use async_trait::async_trait;
use tracing::{error, info};

pub struct ProductCommandRepository {
    db: ConnectionPool,
}

impl ProductCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductCommandRepositoryTrait for ProductCommandRepository {
    async fn create_product(
        &self,
        seller_id: i32,
        req: &CreateProductRequest,
    ) -> Result<ProductModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let product = sqlx::query_as::<_, ProductModel>(
            r#"
            INSERT INTO products (
                name, description, price, original_price, platform, condition, category,
                emoji, stock, seller_id, tags, is_featured, is_deal, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, current_timestamp, current_timestamp)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.original_price)
        .bind(req.platform.as_str())
        .bind(req.condition.as_str())
        .bind(req.category.as_str())
        .bind(&req.emoji)
        .bind(req.stock)
        .bind(seller_id)
        .bind(&req.tags)
        .bind(req.is_featured)
        .bind(req.is_deal)
        .fetch_one(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to create product '{}': {:?}", req.name, err);
            RepositoryError::from_constraint(err, "seller")
        })?;

        info!(
            "✅ Created product ID {} '{}' for seller {}",
            product.product_id, product.name, seller_id
        );
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ProductModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let product = sqlx::query_as::<_, ProductModel>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                original_price = COALESCE($5, original_price),
                platform = COALESCE($6, platform),
                condition = COALESCE($7, condition),
                category = COALESCE($8, category),
                emoji = COALESCE($9, emoji),
                stock = COALESCE($10, stock),
                tags = COALESCE($11, tags),
                is_featured = COALESCE($12, is_featured),
                is_deal = COALESCE($13, is_deal),
                is_active = COALESCE($14, is_active),
                updated_at = current_timestamp
            WHERE product_id = $1
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(req.name.as_deref())
        .bind(req.description.as_deref())
        .bind(req.price)
        .bind(req.original_price)
        .bind(req.platform.map(|p| p.as_str()))
        .bind(req.condition.map(|c| c.as_str()))
        .bind(req.category.map(|c| c.as_str()))
        .bind(req.emoji.as_deref())
        .bind(req.stock)
        .bind(req.tags.as_deref())
        .bind(req.is_featured)
        .bind(req.is_deal)
        .bind(req.is_active)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to update product ID {}: {:?}", product_id, err);
            RepositoryError::from(err)
        })?
        .ok_or(RepositoryError::NotFound)?;

        info!("🔄 Updated product ID {}", product.product_id);
        Ok(product)
    }

    async fn delete_product(&self, product_id: i32) -> Result<(), RepositoryError> {
        info!("🗑️ Deleting product: {}", product_id);

        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to delete product {}: {:?}", product_id, e);
                RepositoryError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn add_review(
        &self,
        review: &CreateReviewRecord,
    ) -> Result<ProductModel, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        sqlx::query(
            r#"
            INSERT INTO reviews (product_id, user_id, name, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, current_timestamp)
            "#,
        )
        .bind(review.product_id)
        .bind(review.user_id)
        .bind(&review.name)
        .bind(review.rating)
        .bind(&review.comment)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to add review by user {} on product {}: {:?}",
                review.user_id, review.product_id, err
            );
            match RepositoryError::from_constraint(err, "review") {
                RepositoryError::ForeignKey(_) => RepositoryError::NotFound,
                other => other,
            }
        })?;

        let product = sqlx::query_as::<_, ProductModel>(
            r#"
            UPDATE products
            SET rating_average = stats.average,
                rating_count = stats.count,
                updated_at = current_timestamp
            FROM (
                SELECT AVG(rating)::DOUBLE PRECISION AS average, COUNT(*)::INTEGER AS count
                FROM reviews
                WHERE product_id = $1
            ) AS stats
            WHERE products.product_id = $1
            RETURNING products.*
            "#,
        )
        .bind(review.product_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            error!(
                "❌ Failed to refresh rating for product {}: {:?}",
                review.product_id, err
            );
            RepositoryError::from(err)
        })?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "✅ Review added to product {} (average {:.2} over {})",
            product.product_id, product.rating_average, product.rating_count
        );
        Ok(product)
    }

    async fn adjust_stock(
        &self,
        product_id: i32,
        delta: i32,
        conditional: bool,
    ) -> Result<i32, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let sql = if conditional && delta < 0 {
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = current_timestamp
            WHERE product_id = $1 AND stock >= -$2
            RETURNING stock
            "#
        } else {
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = current_timestamp
            WHERE product_id = $1
            RETURNING stock
            "#
        };

        let updated: Option<i32> = sqlx::query_scalar(sql)
            .bind(product_id)
            .bind(delta)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|err| {
                error!("❌ Failed to adjust stock of product {}: {:?}", product_id, err);
                RepositoryError::from(err)
            })?;

        if let Some(stock) = updated {
            info!("🔄 Stock of product {} adjusted by {} to {}", product_id, delta, stock);
            return Ok(stock);
        }

        let available: Option<i32> =
            sqlx::query_scalar("SELECT stock FROM products WHERE product_id = $1")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(RepositoryError::from)?;

        match available {
            Some(available) => {
                error!(
                    "❌ Insufficient stock for product {}: requested {}, available {}",
                    product_id, -delta, available
                );
                Err(RepositoryError::InsufficientStock {
                    product_id,
                    requested: -delta,
                    available,
                })
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}
