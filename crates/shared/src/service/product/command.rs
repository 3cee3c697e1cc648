use crate::{
    abstract_trait::{
        DynProductCommandRepository, DynProductQueryRepository, DynUserQueryRepository,
        ProductCommandServiceTrait,
    },
    domain::{
        requests::{CreateProductRequest, CreateReviewRecord, CreateReviewRequest, UpdateProductRequest},
        responses::{ApiResponse, ProductResponse, StockResponse},
        session::Session,
    },
    errors::{RepositoryError, ServiceError},
    model::Product as ProductModel,
    utils::{Method, ServiceObserver},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use tracing::{info, warn};

pub struct ProductCommandServiceDeps {
    pub query: DynProductQueryRepository,
    pub command: DynProductCommandRepository,
    pub user_query: DynUserQueryRepository,
    pub observer: ServiceObserver,
}

pub struct ProductCommandService {
    query: DynProductQueryRepository,
    command: DynProductCommandRepository,
    user_query: DynUserQueryRepository,
    observer: ServiceObserver,
}

impl ProductCommandService {
    pub fn new(deps: ProductCommandServiceDeps) -> Self {
        let ProductCommandServiceDeps {
            query,
            command,
            user_query,
            observer,
        } = deps;

        Self {
            query,
            command,
            user_query,
            observer,
        }
    }

    /// Loads the product and checks the caller may edit it.
    async fn editable(
        &self,
        session: &Session,
        product_id: i32,
    ) -> Result<ProductModel, ServiceError> {
        let product = self
            .query
            .find_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        if !session.can_edit_product(product.seller_id) {
            warn!(
                "❌ User {} may not edit product {} of seller {}",
                session.user_id, product_id, product.seller_id
            );
            return Err(ServiceError::Forbidden("Not authorized".to_string()));
        }

        Ok(product)
    }

    async fn create_inner(
        &self,
        session: &Session,
        req: &CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        if !session.can_sell() {
            return Err(ServiceError::Forbidden(
                "Only sellers and admins can list products".to_string(),
            ));
        }

        let product = self.command.create_product(session.user_id, req).await?;
        Ok(ProductResponse::from(product))
    }

    async fn update_inner(
        &self,
        session: &Session,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        self.editable(session, product_id).await?;

        let product = self
            .command
            .update_product(product_id, req)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("Product"),
                other => ServiceError::Repo(other),
            })?;

        Ok(ProductResponse::from(product))
    }

    async fn delete_inner(&self, session: &Session, product_id: i32) -> Result<(), ServiceError> {
        self.editable(session, product_id).await?;

        self.command
            .delete_product(product_id)
            .await
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("Product"),
                other => ServiceError::Repo(other),
            })
    }

    async fn review_inner(
        &self,
        session: &Session,
        product_id: i32,
        req: &CreateReviewRequest,
    ) -> Result<ProductResponse, ServiceError> {
        if self.query.find_by_id(product_id).await?.is_none() {
            return Err(ServiceError::not_found("Product"));
        }

        let reviewer = self
            .user_query
            .find_by_id(session.user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        let record = CreateReviewRecord {
            product_id,
            user_id: session.user_id,
            name: reviewer.name,
            rating: req.rating,
            comment: req.comment.clone(),
        };

        let product = self
            .command
            .add_review(&record)
            .await
            .map_err(|err| match err {
                RepositoryError::AlreadyExists(_) => {
                    ServiceError::BadRequest("Already reviewed".to_string())
                }
                RepositoryError::NotFound => ServiceError::not_found("Product"),
                other => ServiceError::Repo(other),
            })?;

        let reviews = self.query.find_reviews(product_id).await?;

        Ok(ProductResponse::from(product).with_reviews(reviews))
    }

    async fn adjust_inner(
        &self,
        session: &Session,
        product_id: i32,
        delta: i32,
    ) -> Result<StockResponse, ServiceError> {
        let product = self.editable(session, product_id).await?;

        let stock = self
            .command
            .adjust_stock(product_id, delta, true)
            .await
            .map_err(|err| match err {
                RepositoryError::InsufficientStock { product_id, .. } => {
                    ServiceError::InsufficientStock {
                        product_id,
                        name: product.name.clone(),
                    }
                }
                RepositoryError::NotFound => ServiceError::not_found("Product"),
                other => ServiceError::Repo(other),
            })?;

        Ok(StockResponse { product_id, stock })
    }
}

#[async_trait]
impl ProductCommandServiceTrait for ProductCommandService {
    async fn create_product(
        &self,
        session: &Session,
        req: &CreateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        info!("🏗️ User {} listing product '{}'", session.user_id, req.name);

        let tracing_ctx = self.observer.start(
            "create_product",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("operation", "create"),
                KeyValue::new("product.name", req.name.clone()),
                KeyValue::new("product.seller_id", session.user_id.to_string()),
            ],
        );

        let result = self.create_inner(session, req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Product created");

        Ok(ApiResponse::success("Product created successfully", result?))
    }

    async fn update_product(
        &self,
        session: &Session,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "update_product",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("operation", "update"),
                KeyValue::new("product.id", product_id.to_string()),
            ],
        );

        let result = self.update_inner(session, product_id, req).await;

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Product updated");

        Ok(ApiResponse::success("Product updated successfully", result?))
    }

    async fn delete_product(
        &self,
        session: &Session,
        product_id: i32,
    ) -> Result<ApiResponse<()>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "delete_product",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("operation", "delete"),
                KeyValue::new("product.id", product_id.to_string()),
            ],
        );

        let result = self.delete_inner(session, product_id).await;

        self.observer
            .record(&tracing_ctx, Method::Delete, &result, "Product deleted");

        result?;
        info!("🗑️ Product {} deleted by user {}", product_id, session.user_id);

        Ok(ApiResponse::success("Product deleted successfully", ()))
    }

    async fn add_review(
        &self,
        session: &Session,
        product_id: i32,
        req: &CreateReviewRequest,
    ) -> Result<ApiResponse<ProductResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "add_review",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("operation", "review"),
                KeyValue::new("product.id", product_id.to_string()),
                KeyValue::new("review.rating", req.rating.to_string()),
            ],
        );

        let result = self.review_inner(session, product_id, req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Review added");

        Ok(ApiResponse::success("Review added!", result?))
    }

    async fn adjust_stock(
        &self,
        session: &Session,
        product_id: i32,
        delta: i32,
    ) -> Result<ApiResponse<StockResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "adjust_stock",
            vec![
                KeyValue::new("component", "product"),
                KeyValue::new("operation", "adjust_stock"),
                KeyValue::new("product.id", product_id.to_string()),
                KeyValue::new("stock.delta", delta.to_string()),
            ],
        );

        let result = self.adjust_inner(session, product_id, delta).await;

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Stock adjusted");

        Ok(ApiResponse::success("Stock updated", result?))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        abstract_trait::{ProductQueryServiceTrait, UserCommandRepositoryTrait},
        domain::{
            enums::{Platform, ProductSort, Role},
            requests::{CreateUserRecord, FindAllProducts},
        },
        repository::memory::{InMemoryCatalog, InMemoryUserStore},
        service::{ProductService, ProductServiceDeps, fixtures::new_product},
    };

    use super::*;
    use prometheus_client::registry::Registry;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    struct Harness {
        service: ProductService,
        users: InMemoryUserStore,
    }

    async fn harness() -> Harness {
        let catalog = InMemoryCatalog::new();
        let users = InMemoryUserStore::new();

        let service = ProductService::new(ProductServiceDeps {
            query: Arc::new(catalog.clone()),
            command: Arc::new(catalog),
            user_query: Arc::new(users.clone()),
            registry: Arc::new(Mutex::new(Registry::default())),
        })
        .await;

        Harness { service, users }
    }

    async fn user(h: &Harness, name: &str, role: Role) -> Session {
        let created = h
            .users
            .create_user(&CreateUserRecord {
                name: name.to_string(),
                email: format!("{}@gamezone.test", name.to_lowercase()),
                phone: format!("phone-{}", name.to_lowercase()),
                password_hash: "x".to_string(),
                role,
            })
            .await
            .unwrap();
        Session::new(created.user_id, role)
    }

    #[tokio::test]
    async fn plain_users_cannot_list_products() {
        let h = harness().await;
        let buyer = user(&h, "Buyer", Role::User).await;

        let err = h
            .service
            .command
            .create_product(&buyer, &new_product("GTA V", 999, 3))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn only_owner_or_admin_can_edit() {
        let h = harness().await;
        let seller = user(&h, "Seller", Role::Seller).await;
        let rival = user(&h, "Rival", Role::Seller).await;
        let admin = user(&h, "Admin", Role::Admin).await;

        let product = h
            .service
            .command
            .create_product(&seller, &new_product("FIFA 24", 1500, 2))
            .await
            .unwrap()
            .data;
        assert_eq!(product.seller_id, seller.user_id);
        assert_eq!(product.discount, 50);

        let change = UpdateProductRequest {
            price: Some(1200),
            ..Default::default()
        };

        let err = h
            .service
            .command
            .update_product(&rival, product.id, &change)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let updated = h
            .service
            .command
            .update_product(&admin, product.id, &change)
            .await
            .unwrap()
            .data;
        assert_eq!(updated.price, 1200);

        h.service
            .command
            .delete_product(&seller, product.id)
            .await
            .unwrap();

        let missing = h.service.query.find_by_id(product.id).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(msg) if msg == "Product not found"));
    }

    #[tokio::test]
    async fn second_review_is_rejected_and_average_is_the_mean() {
        let h = harness().await;
        let seller = user(&h, "Seller", Role::Seller).await;
        let alice = user(&h, "Alice", Role::User).await;
        let bob = user(&h, "Bob", Role::User).await;

        let product = h
            .service
            .command
            .create_product(&seller, &new_product("Elden Ring", 2500, 4))
            .await
            .unwrap()
            .data;

        let review = |rating| CreateReviewRequest {
            rating,
            comment: "solid".to_string(),
        };

        h.service
            .command
            .add_review(&alice, product.id, &review(5))
            .await
            .unwrap();
        let after = h
            .service
            .command
            .add_review(&bob, product.id, &review(2))
            .await
            .unwrap()
            .data;

        assert_eq!(after.rating_count, 2);
        assert!((after.rating_average - 3.5).abs() < f64::EPSILON);
        assert_eq!(after.reviews.as_ref().map(Vec::len), Some(2));

        let err = h
            .service
            .command
            .add_review(&alice, product.id, &review(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(msg) if msg == "Already reviewed"));
    }

    #[tokio::test]
    async fn listing_filters_sorts_and_hides_inactive_products() {
        let h = harness().await;
        let seller = user(&h, "Seller", Role::Seller).await;

        let mut cheap = new_product("Mario Kart", 300, 5);
        cheap.platform = Platform::Nintendo;
        cheap.tags = vec!["racing".to_string()];
        let mut pricey = new_product("Forza", 900, 5);
        pricey.platform = Platform::Xbox;
        pricey.tags = vec!["racing".to_string()];
        let hidden = new_product("Old racing bundle", 100, 5);

        for req in [&cheap, &pricey, &hidden] {
            h.service.command.create_product(&seller, req).await.unwrap();
        }

        let hidden_id = h
            .service
            .query
            .find_all(&FindAllProducts {
                search: Some("bundle".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
            .data
            .products[0]
            .id;
        h.service
            .command
            .update_product(
                &seller,
                hidden_id,
                &UpdateProductRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let racing = h
            .service
            .query
            .find_all(&FindAllProducts {
                search: Some("RACING".to_string()),
                sort: Some(ProductSort::PriceHigh),
                ..Default::default()
            })
            .await
            .unwrap()
            .data;
        let names: Vec<_> = racing.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Forza", "Mario Kart"]);
        assert_eq!(racing.total_products, 2);

        let nintendo = h
            .service
            .query
            .find_all(&FindAllProducts {
                platform: Some(Platform::Nintendo),
                max_price: Some(500),
                ..Default::default()
            })
            .await
            .unwrap()
            .data;
        assert_eq!(nintendo.total_products, 1);

        let paged = h
            .service
            .query
            .find_all(&FindAllProducts {
                page: 2,
                limit: 1,
                ..Default::default()
            })
            .await
            .unwrap()
            .data;
        assert_eq!(paged.products.len(), 1);
        assert_eq!(paged.current_page, 2);
        assert_eq!(paged.total_pages, 2);
    }

    #[tokio::test]
    async fn stock_decrements_never_go_negative() {
        let h = harness().await;
        let seller = user(&h, "Seller", Role::Seller).await;
        let product = h
            .service
            .command
            .create_product(&seller, &new_product("PS5 Pad", 4000, 2))
            .await
            .unwrap()
            .data;

        let after = h
            .service
            .command
            .adjust_stock(&seller, product.id, -2)
            .await
            .unwrap()
            .data;
        assert_eq!(after.stock, 0);

        let err = h
            .service
            .command
            .adjust_stock(&seller, product.id, -1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientStock { .. }));
    }

    #[tokio::test]
    async fn detail_and_listing_name_the_seller() {
        let h = harness().await;
        let seller = user(&h, "Seller", Role::Seller).await;
        let product = h
            .service
            .command
            .create_product(&seller, &new_product("Hades", 700, 3))
            .await
            .unwrap()
            .data;

        let detail = h.service.query.find_by_id(product.id).await.unwrap().data;
        assert_eq!(detail.seller_name.as_deref(), Some("Seller"));

        let listing = h
            .service
            .query
            .find_all(&FindAllProducts::default())
            .await
            .unwrap()
            .data;
        assert_eq!(listing.products[0].seller_name.as_deref(), Some("Seller"));
    }
}
