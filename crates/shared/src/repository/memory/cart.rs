use super::now;
use crate::{abstract_trait::CartRepositoryTrait, errors::RepositoryError, model::Cart};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<i32, Cart>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepositoryTrait for InMemoryCartStore {
    async fn find_by_user(&self, user_id: i32) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.write().await;

        let mut saved = cart.clone();
        saved.created_at = carts
            .get(&cart.user_id)
            .and_then(|existing| existing.created_at)
            .or_else(now);
        saved.updated_at = now();

        carts.insert(cart.user_id, saved.clone());
        Ok(saved)
    }

    async fn delete_by_user(&self, user_id: i32) -> Result<bool, RepositoryError> {
        Ok(self.carts.write().await.remove(&user_id).is_some())
    }
}
