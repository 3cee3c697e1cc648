use crate::{
    abstract_trait::{DynHashing, DynJwtService},
    config::{Config, ConnectionPool, Hashing, JwtConfig},
    di::{DependenciesInject, DependenciesInjectDeps, Stores},
    utils::{RetryPolicy, SystemMetrics, run_metrics_collector},
};
use prometheus_client::registry::Registry;
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub di_container: DependenciesInject,
    pub jwt_config: DynJwtService,
    pub registry: Arc<Mutex<Registry>>,
    pub system_metrics: Arc<SystemMetrics>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("di_container", &self.di_container)
            .field("jwt_config", &"<dyn JwtService>")
            .finish()
    }
}

impl AppState {
    /// Postgres-backed state; also starts the system metrics sampler.
    pub async fn new(pool: ConnectionPool, config: &Config) -> Self {
        let state = Self::from_stores(
            Stores::postgres(pool),
            Arc::new(Hashing::new()),
            &config.jwt_secret,
            config.checkout.retry_policy(),
        )
        .await;

        tokio::spawn(run_metrics_collector(state.system_metrics.clone()));

        state
    }

    pub async fn from_stores(
        stores: Stores,
        hash: DynHashing,
        jwt_secret: &str,
        policy: RetryPolicy,
    ) -> Self {
        let jwt_config = Arc::new(JwtConfig::new(jwt_secret)) as DynJwtService;
        let registry = Arc::new(Mutex::new(Registry::default()));
        let system_metrics = Arc::new(SystemMetrics::new());

        let di_container = DependenciesInject::new(DependenciesInjectDeps {
            stores,
            hash,
            jwt_config: jwt_config.clone(),
            policy,
            registry: registry.clone(),
        })
        .await;

        system_metrics.register(&mut *registry.lock().await);

        Self {
            di_container,
            jwt_config,
            registry,
            system_metrics,
        }
    }

    /// In-memory state with cheap hashing, for the HTTP tests.
    #[cfg(any(test, feature = "in-memory"))]
    pub async fn in_memory(jwt_secret: &str) -> Self {
        Self::from_stores(
            Stores::in_memory(),
            Arc::new(Hashing::with_cost(4)),
            jwt_secret,
            RetryPolicy::default(),
        )
        .await
    }
}
