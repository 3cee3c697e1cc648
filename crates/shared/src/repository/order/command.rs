use super::query::attach_items;
use crate::{
    abstract_trait::OrderCommandRepositoryTrait,
    config::ConnectionPool,
    domain::{
        enums::{OrderStatus, PlacementState},
        requests::CreateOrderRecord,
    },
    errors::RepositoryError,
    model::{Order as OrderModel, OrderItem},
};
use async_trait::async_trait;
use tracing::{error, info, warn};

pub struct OrderCommandRepository {
    db: ConnectionPool,
}

impl OrderCommandRepository {
    pub fn new(db: ConnectionPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderCommandRepositoryTrait for OrderCommandRepository {
    async fn create_order(&self, record: &CreateOrderRecord) -> Result<OrderModel, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let address = &record.shipping_address;

        let mut order = sqlx::query_as::<_, OrderModel>(
            r#"
            INSERT INTO orders (
                user_id, tracking_id,
                shipping_name, shipping_phone, shipping_street, shipping_city, shipping_state, shipping_pincode,
                payment_method, payment_status, order_status, placement_state,
                subtotal, delivery_charge, total_amount, created_at, updated_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', 'placed', 'pending',
                $10, $11, $12, current_timestamp, current_timestamp
            )
            RETURNING *
            "#,
        )
        .bind(record.user_id)
        .bind(&record.tracking_id)
        .bind(&address.name)
        .bind(&address.phone)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.pincode)
        .bind(record.payment_method.as_str())
        .bind(record.subtotal)
        .bind(record.delivery_charge)
        .bind(record.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to create order for user {}: {:?}", record.user_id, err);
            RepositoryError::from_constraint(err, "tracking id")
        })?;

        let product_ids: Vec<i32> = record.items.iter().map(|item| item.product_id).collect();
        let names: Vec<String> = record.items.iter().map(|item| item.name.clone()).collect();
        let prices: Vec<i64> = record.items.iter().map(|item| item.price).collect();
        let quantities: Vec<i32> = record.items.iter().map(|item| item.quantity).collect();

        order.items = sqlx::query_as::<_, OrderItem>(
            r#"
            INSERT INTO order_items (order_id, product_id, name, price, quantity, stock_applied)
            SELECT $1, item.product_id, item.name, item.price, item.quantity, FALSE
            FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::BIGINT[], $5::INTEGER[])
                WITH ORDINALITY AS item(product_id, name, price, quantity, position)
            ORDER BY item.position
            RETURNING order_item_id, order_id, product_id, name, price, quantity, stock_applied
            "#,
        )
        .bind(order.order_id)
        .bind(&product_ids)
        .bind(&names)
        .bind(&prices)
        .bind(&quantities)
        .fetch_all(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to create items of order {}: {:?}", order.order_id, err);
            RepositoryError::from(err)
        })?;
        order.items.sort_by_key(|item| item.order_item_id);

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "📦 Created pending order ID {} ({}) for user {}",
            order.order_id, order.tracking_id, order.user_id
        );
        Ok(order)
    }

    async fn apply_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let claimed: Option<(i32, i32)> = sqlx::query_as(
            r#"
            UPDATE order_items
            SET stock_applied = TRUE
            WHERE order_item_id = $1 AND stock_applied = FALSE
            RETURNING product_id, quantity
            "#,
        )
        .bind(order_item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let Some((product_id, quantity)) = claimed else {
            let exists: Option<i32> =
                sqlx::query_scalar("SELECT order_item_id FROM order_items WHERE order_item_id = $1")
                    .bind(order_item_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(RepositoryError::from)?;

            return match exists {
                Some(_) => Ok(false),
                None => Err(RepositoryError::NotFound),
            };
        };

        let decremented: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE products
            SET stock = stock - $2, updated_at = current_timestamp
            WHERE product_id = $1 AND stock >= $2
            RETURNING stock
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to decrement stock of product {}: {:?}", product_id, err);
            RepositoryError::from(err)
        })?;

        if decremented.is_none() {
            tx.rollback().await.map_err(RepositoryError::from)?;

            let available: Option<i32> =
                sqlx::query_scalar("SELECT stock FROM products WHERE product_id = $1")
                    .bind(product_id)
                    .fetch_optional(&self.db)
                    .await
                    .map_err(RepositoryError::from)?;

            warn!(
                "❌ Insufficient stock for product {}: requested {}, available {:?}",
                product_id, quantity, available
            );
            return Err(RepositoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available: available.unwrap_or(0),
            });
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "📦 Applied stock for order item {} (product {} -{})",
            order_item_id, product_id, quantity
        );
        Ok(true)
    }

    async fn release_item_stock(&self, order_item_id: i32) -> Result<bool, RepositoryError> {
        let mut tx = self.db.begin().await.map_err(RepositoryError::from)?;

        let released: Option<(i32, i32)> = sqlx::query_as(
            r#"
            UPDATE order_items
            SET stock_applied = FALSE
            WHERE order_item_id = $1 AND stock_applied = TRUE
            RETURNING product_id, quantity
            "#,
        )
        .bind(order_item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let Some((product_id, quantity)) = released else {
            return Ok(false);
        };

        sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = current_timestamp
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            error!("❌ Failed to restore stock of product {}: {:?}", product_id, err);
            RepositoryError::from(err)
        })?;

        tx.commit().await.map_err(RepositoryError::from)?;

        info!(
            "🔄 Released stock for order item {} (product {} +{})",
            order_item_id, product_id, quantity
        );
        Ok(true)
    }

    async fn mark_placement(
        &self,
        order_id: i32,
        from: PlacementState,
        to: PlacementState,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET placement_state = $3, updated_at = current_timestamp
            WHERE order_id = $1 AND placement_state = $2
            "#,
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to mark order {} as {}: {:?}", order_id, to, err);
            RepositoryError::from(err)
        })?;

        if result.rows_affected() == 0 {
            let current: Option<String> =
                sqlx::query_scalar("SELECT placement_state FROM orders WHERE order_id = $1")
                    .bind(order_id)
                    .fetch_optional(&mut *conn)
                    .await
                    .map_err(RepositoryError::from)?;

            return match current {
                None => Err(RepositoryError::NotFound),
                Some(current) if current == to.as_str() => Ok(()),
                Some(current) => {
                    warn!(
                        "⚠️ Order {} placement is {}, not moving it to {}",
                        order_id, current, to
                    );
                    Err(RepositoryError::Conflict(format!(
                        "order {order_id} placement is {current}"
                    )))
                }
            };
        }

        info!("🔄 Order {} placement is now {}", order_id, to);
        Ok(())
    }

    async fn update_status(
        &self,
        order_id: i32,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderModel, RepositoryError> {
        let mut conn = self.db.acquire().await.map_err(RepositoryError::from)?;

        let order = sqlx::query_as::<_, OrderModel>(
            r#"
            UPDATE orders
            SET order_status = $3,
                delivered_at = CASE WHEN $3 = 'delivered' THEN current_timestamp ELSE delivered_at END,
                cancelled_at = CASE WHEN $3 = 'cancelled' THEN current_timestamp ELSE cancelled_at END,
                updated_at = current_timestamp
            WHERE order_id = $1 AND order_status = $2 AND placement_state = 'placed'
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|err| {
            error!("❌ Failed to update status of order {}: {:?}", order_id, err);
            RepositoryError::from(err)
        })?;

        let Some(order) = order else {
            let current: Option<String> = sqlx::query_scalar(
                "SELECT order_status FROM orders WHERE order_id = $1 AND placement_state = 'placed'",
            )
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(RepositoryError::from)?;

            return match current {
                None => Err(RepositoryError::NotFound),
                Some(current) => {
                    warn!(
                        "⚠️ Order {} moved to {} before {} -> {} applied",
                        order_id, current, from, to
                    );
                    Err(RepositoryError::Conflict(format!(
                        "order {order_id} status is {current}"
                    )))
                }
            };
        };

        let mut orders = [order];
        attach_items(&mut *conn, &mut orders).await?;
        let [order] = orders;

        info!("🔄 Order {} status {} -> {}", order_id, from, to);
        Ok(order)
    }
}
