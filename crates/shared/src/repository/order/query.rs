use crate::{
    abstract_trait::OrderQueryRepositoryTrait,
    config::ConnectionPool,
    errors::RepositoryError,
    model::{Order as OrderModel, OrderItem},
};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::{error, info};

/// Loads the items of `orders` and attaches them in insertion order.
pub(super) async fn attach_items(
    conn: &mut PgConnection,
    orders: &mut [OrderModel],
) -> Result<(), RepositoryError> {
    if orders.is_empty() {
        return Ok(());
    }

    let order_ids: Vec<i32> = orders.iter().map(|order| order.order_id).collect();

    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT order_item_id, order_id, product_id, name, price, quantity, stock_applied
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_item_id
        "#,
    )
    .bind(&order_ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| {
        error!("❌ Failed to fetch items of orders {:?}: {:?}", order_ids, e);
        RepositoryError::from(e)
    })?;

    let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }

    for order in orders.iter_mut() {
        order.items = by_order.remove(&order.order_id).unwrap_or_default();
    }

    Ok(())
}

#[derive(Clone)]
pub struct OrderQueryRepository {
    db: ConnectionPool,
}

impl OrderQueryRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }

    async fn fetch_many(
        &self,
        sql: &str,
        bind: Option<i32>,
    ) -> Result<Vec<OrderModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let mut query = sqlx::query_as::<_, OrderModel>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }

        let mut orders = query.fetch_all(&mut *conn).await.map_err(|e| {
            error!("❌ Failed to fetch orders: {:?}", e);
            RepositoryError::from(e)
        })?;

        attach_items(&mut *conn, &mut orders).await?;

        Ok(orders)
    }
}

#[async_trait]
impl OrderQueryRepositoryTrait for OrderQueryRepository {
    async fn find_by_id(&self, order_id: i32) -> Result<Option<OrderModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let order = sqlx::query_as::<_, OrderModel>("SELECT * FROM orders WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| {
                error!("❌ Failed to fetch order {}: {:?}", order_id, e);
                RepositoryError::from(e)
            })?;

        let Some(order) = order else {
            return Ok(None);
        };

        let mut orders = [order];
        attach_items(&mut *conn, &mut orders).await?;
        let [order] = orders;

        Ok(Some(order))
    }

    async fn find_placed_by_user(&self, user_id: i32) -> Result<Vec<OrderModel>, RepositoryError> {
        info!("🔍 Fetching placed orders of user {}", user_id);

        self.fetch_many(
            r#"
            SELECT * FROM orders
            WHERE user_id = $1 AND placement_state = 'placed'
            ORDER BY created_at DESC, order_id DESC
            "#,
            Some(user_id),
        )
        .await
    }

    async fn find_all_placed(&self) -> Result<Vec<OrderModel>, RepositoryError> {
        info!("🔍 Fetching all placed orders");

        self.fetch_many(
            r#"
            SELECT * FROM orders
            WHERE placement_state = 'placed'
            ORDER BY created_at DESC, order_id DESC
            "#,
            None,
        )
        .await
    }

    async fn find_pending_before(
        &self,
        cutoff: NaiveDateTime,
    ) -> Result<Vec<OrderModel>, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let mut orders = sqlx::query_as::<_, OrderModel>(
            r#"
            SELECT * FROM orders
            WHERE placement_state = 'pending' AND created_at < $1
            ORDER BY created_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            error!("❌ Failed to fetch pending orders: {:?}", e);
            RepositoryError::from(e)
        })?;

        attach_items(&mut *conn, &mut orders).await?;

        Ok(orders)
    }

    async fn find_cancelled_unreleased(&self) -> Result<Vec<OrderModel>, RepositoryError> {
        self.fetch_many(
            r#"
            SELECT o.* FROM orders o
            WHERE o.order_status = 'cancelled'
              AND EXISTS (
                  SELECT 1 FROM order_items i
                  WHERE i.order_id = o.order_id AND i.stock_applied
              )
            ORDER BY o.updated_at
            "#,
            None,
        )
        .await
    }
}
