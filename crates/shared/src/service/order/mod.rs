mod command;
mod query;

use self::command::{OrderCommandService, OrderCommandServiceDeps};
use self::query::OrderQueryService;
use crate::{
    abstract_trait::{
        DynCartRepository, DynOrderCommandRepository, DynOrderCommandService,
        DynOrderQueryRepository, DynOrderQueryService, DynProductQueryRepository,
        DynUserQueryRepository,
    },
    utils::{RetryPolicy, ServiceObserver},
};
use prometheus_client::registry::Registry;
use std::{fmt, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct OrderService {
    pub query: DynOrderQueryService,
    pub command: DynOrderCommandService,
}

pub struct OrderServiceDeps {
    pub query: DynOrderQueryRepository,
    pub command: DynOrderCommandRepository,
    pub carts: DynCartRepository,
    pub products: DynProductQueryRepository,
    pub users: DynUserQueryRepository,
    pub policy: RetryPolicy,
    pub registry: Arc<Mutex<Registry>>,
}

impl fmt::Debug for OrderService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderService")
            .field("query", &"Arc<dyn OrderQueryServiceTrait>")
            .field("command", &"Arc<dyn OrderCommandServiceTrait>")
            .finish()
    }
}

impl OrderService {
    pub async fn new(deps: OrderServiceDeps) -> Self {
        let OrderServiceDeps {
            query,
            command,
            carts,
            products,
            users,
            policy,
            registry,
        } = deps;

        let query_service = Arc::new(OrderQueryService::new(
            query.clone(),
            users,
            ServiceObserver::new("order-query-service", &registry).await,
        )) as DynOrderQueryService;

        let command_service = Arc::new(OrderCommandService::new(OrderCommandServiceDeps {
            query,
            command,
            carts,
            products,
            policy,
            observer: ServiceObserver::new("order-command-service", &registry).await,
        })) as DynOrderCommandService;

        Self {
            query: query_service,
            command: command_service,
        }
    }
}
