use crate::{
    abstract_trait::{
        DynProductQueryRepository, DynUserCommandRepository, DynUserQueryRepository,
        ProfileServiceTrait,
    },
    domain::{
        requests::UpdateProfileRequest,
        responses::{ApiResponse, UserResponse, WishlistResponse},
    },
    errors::{RepositoryError, ServiceError},
    model::User as UserModel,
    utils::{Method, ServiceObserver},
};
use async_trait::async_trait;
use opentelemetry::KeyValue;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub struct ProfileServiceDeps {
    pub query: DynUserQueryRepository,
    pub command: DynUserCommandRepository,
    pub products: DynProductQueryRepository,
    pub registry: Arc<Mutex<Registry>>,
}

pub struct ProfileService {
    query: DynUserQueryRepository,
    command: DynUserCommandRepository,
    products: DynProductQueryRepository,
    observer: ServiceObserver,
}

impl ProfileService {
    pub async fn new(deps: ProfileServiceDeps) -> Self {
        let ProfileServiceDeps {
            query,
            command,
            products,
            registry,
        } = deps;

        Self {
            query,
            command,
            products,
            observer: ServiceObserver::new("profile-service", &registry).await,
        }
    }

    async fn user(&self, user_id: i32) -> Result<UserModel, ServiceError> {
        self.query
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    async fn toggle_inner(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<WishlistResponse, ServiceError> {
        let mut wishlist = self.user(user_id).await?.wishlist;

        let added = if wishlist.contains(&product_id) {
            wishlist.retain(|id| *id != product_id);
            false
        } else {
            if self.products.find_by_id(product_id).await?.is_none() {
                return Err(ServiceError::not_found("Product"));
            }
            wishlist.push(product_id);
            true
        };

        let user = self.command.set_wishlist(user_id, &wishlist).await?;

        Ok(WishlistResponse {
            added,
            wishlist: user.wishlist,
        })
    }
}

#[async_trait]
impl ProfileServiceTrait for ProfileService {
    async fn get_profile(&self, user_id: i32) -> Result<ApiResponse<UserResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "get_profile",
            vec![
                KeyValue::new("component", "profile"),
                KeyValue::new("user.id", user_id.to_string()),
            ],
        );

        let result = self.user(user_id).await;

        self.observer
            .record(&tracing_ctx, Method::Get, &result, "Profile retrieved");

        Ok(ApiResponse::success(
            "Profile retrieved successfully",
            UserResponse::from(result?),
        ))
    }

    async fn update_profile(
        &self,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<ApiResponse<UserResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "update_profile",
            vec![
                KeyValue::new("component", "profile"),
                KeyValue::new("user.id", user_id.to_string()),
            ],
        );

        let result = self
            .command
            .update_profile(user_id, req)
            .await
            .map_err(|err| match err {
                RepositoryError::AlreadyExists(_) => {
                    ServiceError::Conflict("Phone number already in use".to_string())
                }
                RepositoryError::NotFound => ServiceError::not_found("User"),
                other => ServiceError::Repo(other),
            });

        self.observer
            .record(&tracing_ctx, Method::Put, &result, "Profile updated");

        let user = result?;
        info!("🔄 Profile of user {} updated", user.user_id);

        Ok(ApiResponse::success(
            "Profile updated successfully",
            UserResponse::from(user),
        ))
    }

    async fn toggle_wishlist(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<ApiResponse<WishlistResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "toggle_wishlist",
            vec![
                KeyValue::new("component", "profile"),
                KeyValue::new("user.id", user_id.to_string()),
                KeyValue::new("product.id", product_id.to_string()),
            ],
        );

        let result = self.toggle_inner(user_id, product_id).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Wishlist toggled");

        let response = result?;
        let message = if response.added {
            "Added to wishlist"
        } else {
            "Removed from wishlist"
        };

        Ok(ApiResponse::success(message, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abstract_trait::{ProductCommandRepositoryTrait, UserCommandRepositoryTrait},
        domain::{
            enums::Role,
            requests::{AddressRequest, CreateUserRecord},
        },
        repository::memory::{InMemoryCatalog, InMemoryUserStore},
        service::fixtures::new_product,
    };

    async fn setup() -> (ProfileService, InMemoryUserStore, InMemoryCatalog) {
        let users = InMemoryUserStore::new();
        let catalog = InMemoryCatalog::new();

        let service = ProfileService::new(ProfileServiceDeps {
            query: Arc::new(users.clone()),
            command: Arc::new(users.clone()),
            products: Arc::new(catalog.clone()),
            registry: Arc::new(Mutex::new(Registry::default())),
        })
        .await;

        (service, users, catalog)
    }

    async fn create_user(users: &InMemoryUserStore, email: &str, phone: &str) -> i32 {
        users
            .create_user(&CreateUserRecord {
                name: "Ravi".to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
            })
            .await
            .unwrap()
            .user_id
    }

    #[tokio::test]
    async fn wishlist_toggles_in_and_out() {
        let (service, users, catalog) = setup().await;
        let user_id = create_user(&users, "ravi@gamezone.test", "9000000001").await;
        let product = catalog
            .create_product(1, &new_product("Halo", 300, 1))
            .await
            .unwrap();

        let added = service
            .toggle_wishlist(user_id, product.product_id)
            .await
            .unwrap();
        assert!(added.data.added);
        assert_eq!(added.data.wishlist, vec![product.product_id]);

        let removed = service
            .toggle_wishlist(user_id, product.product_id)
            .await
            .unwrap();
        assert!(!removed.data.added);
        assert!(removed.data.wishlist.is_empty());

        let missing = service.toggle_wishlist(user_id, 404).await.unwrap_err();
        assert!(matches!(missing, ServiceError::NotFound(msg) if msg == "Product not found"));
    }

    #[tokio::test]
    async fn profile_updates_are_partial() {
        let (service, users, _) = setup().await;
        let user_id = create_user(&users, "ravi@gamezone.test", "9000000001").await;
        create_user(&users, "meera@gamezone.test", "9000000002").await;

        let updated = service
            .update_profile(
                user_id,
                &UpdateProfileRequest {
                    address: Some(AddressRequest {
                        street: None,
                        city: Some("Pune".to_string()),
                        state: None,
                        pincode: Some("411001".to_string()),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .data;

        assert_eq!(updated.name, "Ravi");
        assert_eq!(updated.address.city.as_deref(), Some("Pune"));
        assert_eq!(updated.address.street, None);

        let taken = service
            .update_profile(
                user_id,
                &UpdateProfileRequest {
                    phone: Some("9000000002".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(taken, ServiceError::Conflict(_)));
    }
}
