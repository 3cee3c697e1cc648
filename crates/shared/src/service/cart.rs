use crate::{
    abstract_trait::{CartServiceTrait, DynCartRepository, DynProductQueryRepository},
    domain::{
        requests::{AddToCartRequest, UpdateCartRequest},
        responses::{ApiResponse, CartItemResponse, CartResponse},
    },
    errors::ServiceError,
    model::{Cart, MAX_LINE_QUANTITY, Product},
    utils::{Method, ServiceObserver},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::info;

pub struct CartServiceDeps {
    pub carts: DynCartRepository,
    pub products: DynProductQueryRepository,
    pub registry: Arc<Mutex<Registry>>,
}

pub struct CartService {
    carts: DynCartRepository,
    products: DynProductQueryRepository,
    observer: ServiceObserver,
}

impl CartService {
    pub async fn new(deps: CartServiceDeps) -> Self {
        let CartServiceDeps {
            carts,
            products,
            registry,
        } = deps;

        Self {
            carts,
            products,
            observer: ServiceObserver::new("cart-service", &registry).await,
        }
    }

    async fn live_products(&self, cart: &Cart) -> Result<HashMap<i32, Product>, ServiceError> {
        let products = self.products.find_by_ids(&cart.product_ids()).await?;
        Ok(products
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect())
    }

    /// Recomputes the total from live prices, dropping lines whose product
    /// is gone, and renders the response from the same snapshot.
    fn reprice(cart: &mut Cart, products: &HashMap<i32, Product>) -> CartResponse {
        let prices = products
            .iter()
            .map(|(id, product)| (*id, product.price))
            .collect::<HashMap<_, _>>();
        cart.recompute_total(&prices);

        let items = cart
            .items
            .iter()
            .filter_map(|item| {
                products.get(&item.product_id).map(|product| CartItemResponse {
                    product_id: product.product_id,
                    name: product.name.clone(),
                    emoji: product.emoji.clone(),
                    price: product.price,
                    stock: product.stock,
                    quantity: item.quantity,
                    line_total: product.price * item.quantity as i64,
                })
            })
            .collect();

        CartResponse {
            items,
            total_price: cart.total_price,
        }
    }

    async fn persist(&self, mut cart: Cart) -> Result<CartResponse, ServiceError> {
        let products = self.live_products(&cart).await?;
        let response = Self::reprice(&mut cart, &products);
        self.carts.save(&cart).await?;
        Ok(response)
    }

    async fn add_item_inner(
        &self,
        user_id: i32,
        req: &AddToCartRequest,
    ) -> Result<CartResponse, ServiceError> {
        if self.products.find_by_id(req.product_id).await?.is_none() {
            return Err(ServiceError::not_found("Product"));
        }

        let mut cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .unwrap_or_else(|| Cart::empty(user_id));

        if cart.add(req.product_id, req.quantity).is_none() {
            return Err(ServiceError::Validation(vec![format!(
                "Quantity cannot exceed {MAX_LINE_QUANTITY} per item"
            )]));
        }

        info!(
            "🛒 User {} added product {} x{}",
            user_id, req.product_id, req.quantity
        );

        self.persist(cart).await
    }

    async fn update_quantity_inner(
        &self,
        user_id: i32,
        req: &UpdateCartRequest,
    ) -> Result<CartResponse, ServiceError> {
        let mut cart = self
            .carts
            .find_by_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart"))?;

        if req.quantity > MAX_LINE_QUANTITY {
            return Err(ServiceError::Validation(vec![format!(
                "Quantity cannot exceed {MAX_LINE_QUANTITY} per item"
            )]));
        }

        if !cart.set_quantity(req.product_id, req.quantity) {
            return Err(ServiceError::NotFound("Item not in cart".to_string()));
        }

        self.persist(cart).await
    }

    async fn remove_item_inner(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<CartResponse, ServiceError> {
        let Some(mut cart) = self.carts.find_by_user(user_id).await? else {
            return Ok(CartResponse::empty());
        };

        cart.remove(product_id);
        self.persist(cart).await
    }
}

#[async_trait]
impl CartServiceTrait for CartService {
    async fn get_cart(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "get_cart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("cart.user_id", user_id.to_string()),
            ],
        );

        let result = match self.carts.find_by_user(user_id).await {
            Ok(Some(mut cart)) => self
                .live_products(&cart)
                .await
                .map(|products| Self::reprice(&mut cart, &products)),
            Ok(None) => Ok(CartResponse::empty()),
            Err(e) => Err(ServiceError::Repo(e)),
        };

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Cart retrieved");

        Ok(ApiResponse::success("Cart retrieved successfully", result?))
    }

    async fn add_item(
        &self,
        user_id: i32,
        req: &AddToCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "add_item",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("cart.user_id", user_id.to_string()),
                KeyValue::new("cart.product_id", req.product_id.to_string()),
                KeyValue::new("cart.quantity", req.quantity.to_string()),
            ],
        );

        let result = self.add_item_inner(user_id, req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Item added to cart");

        Ok(ApiResponse::success("Added to cart!", result?))
    }

    async fn update_quantity(
        &self,
        user_id: i32,
        req: &UpdateCartRequest,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "update_quantity",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("cart.user_id", user_id.to_string()),
                KeyValue::new("cart.product_id", req.product_id.to_string()),
            ],
        );

        let result = self.update_quantity_inner(user_id, req).await;

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Cart quantity updated");

        Ok(ApiResponse::success("Cart updated!", result?))
    }

    async fn remove_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "remove_item",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("cart.user_id", user_id.to_string()),
                KeyValue::new("cart.product_id", product_id.to_string()),
            ],
        );

        let result = self.remove_item_inner(user_id, product_id).await;

        self.observer
            .record(&tracing_ctx, Method::Delete, &result, "Item removed from cart");

        Ok(ApiResponse::success("Item removed!", result?))
    }

    async fn clear(&self, user_id: i32) -> Result<ApiResponse<CartResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "clear_cart",
            vec![
                KeyValue::new("component", "cart"),
                KeyValue::new("cart.user_id", user_id.to_string()),
            ],
        );

        let result = self
            .carts
            .delete_by_user(user_id)
            .await
            .map_err(ServiceError::from);

        self.observer
            .record(&tracing_ctx, Method::Delete, &result, "Cart cleared");

        if result? {
            info!("🗑️ Cleared cart of user {}", user_id);
        }

        Ok(ApiResponse::success("Cart cleared!", CartResponse::empty()))
    }
}
