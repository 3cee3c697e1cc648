use crate::{
    abstract_trait::CartRepositoryTrait,
    config::ConnectionPool,
    errors::RepositoryError,
    model::{Cart as CartModel, CartItem},
};
use async_trait::async_trait;
use tracing::{error, info};

#[derive(Clone)]
pub struct CartRepository {
    db: ConnectionPool,
}

impl CartRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CartRepositoryTrait for CartRepository {
    async fn find_by_user(&self, user_id: i32) -> Result<Option<CartModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let cart = sqlx::query_as::<_, CartModel>(
            "SELECT user_id, total_price, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch cart of user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        let Some(mut cart) = cart else {
            return Ok(None);
        };

        cart.items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT product_id, quantity
            FROM cart_items
            WHERE user_id = $1
            ORDER BY position
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch cart items of user {}: {:?}", user_id, e);
            RepositoryError::from(e)
        })?;

        Ok(Some(cart))
    }

    async fn save(&self, cart: &CartModel) -> Result<CartModel, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let mut saved = sqlx::query_as::<_, CartModel>(
            r#"
            INSERT INTO carts (user_id, total_price, created_at, updated_at)
            VALUES ($1, $2, current_timestamp, current_timestamp)
            ON CONFLICT (user_id) DO UPDATE
            SET total_price = EXCLUDED.total_price,
                updated_at = current_timestamp
            RETURNING user_id, total_price, created_at, updated_at
            "#,
        )
        .bind(cart.user_id)
        .bind(cart.total_price)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to save cart of user {}: {:?}", cart.user_id, err);
            RepositoryError::from_constraint(err, "user")
        })?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(cart.user_id)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        let product_ids = cart.product_ids();
        let quantities: Vec<i32> = cart.items.iter().map(|item| item.quantity).collect();
        let positions: Vec<i32> = (0..cart.items.len() as i32).collect();

        sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity, position)
            SELECT $1, item.product_id, item.quantity, item.position
            FROM UNNEST($2::INTEGER[], $3::INTEGER[], $4::INTEGER[])
                AS item(product_id, quantity, position)
            "#,
        )
        .bind(cart.user_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&positions)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to save cart items of user {}: {:?}", cart.user_id, err);
            RepositoryError::from(err)
        })?;

        tx.commit().await.map_err(RepositoryError::from)?;

        saved.items = cart.items.clone();

        info!(
            "🛒 Saved cart of user {} with {} items, total {}",
            saved.user_id,
            saved.items.len(),
            saved.total_price
        );
        Ok(saved)
    }

    async fn delete_by_user(&self, user_id: i32) -> Result<bool, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to delete cart of user {}: {:?}", user_id, e);
                RepositoryError::from(e)
            })?;

        info!("🗑️ Deleted cart of user {}", user_id);
        Ok(result.rows_affected() > 0)
    }
}
