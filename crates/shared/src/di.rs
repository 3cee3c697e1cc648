use crate::{
    abstract_trait::{
        DynAuthService, DynCartRepository, DynCartService, DynHashing, DynJwtService,
        DynOrderCommandRepository, DynOrderQueryRepository, DynProductCommandRepository,
        DynProductQueryRepository, DynProfileService, DynUserCommandRepository,
        DynUserQueryRepository,
    },
    config::ConnectionPool,
    repository::{CartRepository, OrderRepository, ProductRepository, UserRepository},
    service::{
        AuthService, AuthServiceDeps, CartService, CartServiceDeps, OrderService,
        OrderServiceDeps, ProductService, ProductServiceDeps, ProfileService, ProfileServiceDeps,
    },
    utils::RetryPolicy,
};
use prometheus_client::registry::Registry;
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

/// Repository handles the services are built from.
#[derive(Clone)]
pub struct Stores {
    pub user_query: DynUserQueryRepository,
    pub user_command: DynUserCommandRepository,
    pub product_query: DynProductQueryRepository,
    pub product_command: DynProductCommandRepository,
    pub carts: DynCartRepository,
    pub order_query: DynOrderQueryRepository,
    pub order_command: DynOrderCommandRepository,
}

impl Stores {
    pub fn postgres(pool: ConnectionPool) -> Self {
        let users = UserRepository::new(pool.clone());
        let products = ProductRepository::new(pool.clone());
        let orders = OrderRepository::new(pool.clone());
        let carts = Arc::new(CartRepository::new(pool)) as DynCartRepository;

        Self {
            user_query: users.query,
            user_command: users.command,
            product_query: products.query,
            product_command: products.command,
            carts,
            order_query: orders.query,
            order_command: orders.command,
        }
    }

    #[cfg(any(test, feature = "in-memory"))]
    pub fn in_memory() -> Self {
        use crate::repository::memory::{
            InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryUserStore,
        };

        let users = InMemoryUserStore::new();
        let catalog = InMemoryCatalog::new();
        let orders = InMemoryOrderStore::new(catalog.clone());

        Self {
            user_query: Arc::new(users.clone()),
            user_command: Arc::new(users),
            product_query: Arc::new(catalog.clone()),
            product_command: Arc::new(catalog),
            carts: Arc::new(InMemoryCartStore::new()),
            order_query: Arc::new(orders.clone()),
            order_command: Arc::new(orders),
        }
    }
}

#[derive(Clone)]
pub struct DependenciesInject {
    pub auth_service: DynAuthService,
    pub profile_service: DynProfileService,
    pub product_service: ProductService,
    pub cart_service: DynCartService,
    pub order_service: OrderService,
}

impl fmt::Debug for DependenciesInject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependenciesInject")
            .field("auth_service", &"<AuthService>")
            .field("profile_service", &"<ProfileService>")
            .field("product_service", &self.product_service)
            .field("cart_service", &"<CartService>")
            .field("order_service", &self.order_service)
            .finish()
    }
}

pub struct DependenciesInjectDeps {
    pub stores: Stores,
    pub hash: DynHashing,
    pub jwt_config: DynJwtService,
    pub policy: RetryPolicy,
    pub registry: Arc<Mutex<Registry>>,
}

impl DependenciesInject {
    pub async fn new(deps: DependenciesInjectDeps) -> Self {
        let DependenciesInjectDeps {
            stores,
            hash,
            jwt_config,
            policy,
            registry,
        } = deps;

        let auth_service = Arc::new(
            AuthService::new(AuthServiceDeps {
                query: stores.user_query.clone(),
                command: stores.user_command.clone(),
                hashing: hash,
                jwt: jwt_config,
                registry: registry.clone(),
            })
            .await,
        ) as DynAuthService;

        let profile_service = Arc::new(
            ProfileService::new(ProfileServiceDeps {
                query: stores.user_query.clone(),
                command: stores.user_command,
                products: stores.product_query.clone(),
                registry: registry.clone(),
            })
            .await,
        ) as DynProfileService;

        let product_service = ProductService::new(ProductServiceDeps {
            query: stores.product_query.clone(),
            command: stores.product_command,
            user_query: stores.user_query.clone(),
            registry: registry.clone(),
        })
        .await;

        let cart_service = Arc::new(
            CartService::new(CartServiceDeps {
                carts: stores.carts.clone(),
                products: stores.product_query.clone(),
                registry: registry.clone(),
            })
            .await,
        ) as DynCartService;

        let order_service = OrderService::new(OrderServiceDeps {
            query: stores.order_query,
            command: stores.order_command,
            carts: stores.carts,
            products: stores.product_query,
            users: stores.user_query,
            policy,
            registry,
        })
        .await;

        Self {
            auth_service,
            profile_service,
            product_service,
            cart_service,
            order_service,
        }
    }
}
