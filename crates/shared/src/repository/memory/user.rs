use super::now;
use crate::{
    abstract_trait::{UserCommandRepositoryTrait, UserQueryRepositoryTrait},
    domain::requests::{CreateUserRecord, UpdateProfileRequest},
    errors::RepositoryError,
    model::User,
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Default)]
struct UserState {
    users: HashMap<i32, User>,
    next_user_id: i32,
}

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<UserState>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserQueryRepositoryTrait for InMemoryUserStore {
    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.phone == phone)
            .cloned())
    }

    async fn find_by_ids(&self, user_ids: &[i32]) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl UserCommandRepositoryTrait for InMemoryUserStore {
    async fn create_user(&self, record: &CreateUserRecord) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        let email = record.email.to_lowercase();

        if state
            .users
            .values()
            .any(|user| user.email == email || user.phone == record.phone)
        {
            return Err(RepositoryError::AlreadyExists(
                "User with this email or phone".to_string(),
            ));
        }

        state.next_user_id += 1;
        let user = User {
            user_id: state.next_user_id,
            name: record.name.clone(),
            email,
            phone: record.phone.clone(),
            password: record.password_hash.clone(),
            role: record.role,
            street: None,
            city: None,
            state: None,
            pincode: None,
            wishlist: Vec::new(),
            created_at: now(),
            updated_at: now(),
        };

        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: i32,
        req: &UpdateProfileRequest,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;

        if let Some(phone) = &req.phone
            && state
                .users
                .values()
                .any(|user| user.user_id != user_id && &user.phone == phone)
        {
            return Err(RepositoryError::AlreadyExists(
                "User with this phone".to_string(),
            ));
        }

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = &req.name {
            user.name = name.clone();
        }
        if let Some(phone) = &req.phone {
            user.phone = phone.clone();
        }
        if let Some(address) = &req.address {
            if let Some(street) = &address.street {
                user.street = Some(street.clone());
            }
            if let Some(city) = &address.city {
                user.city = Some(city.clone());
            }
            if let Some(region) = &address.state {
                user.state = Some(region.clone());
            }
            if let Some(pincode) = &address.pincode {
                user.pincode = Some(pincode.clone());
            }
        }
        user.updated_at = now();

        Ok(user.clone())
    }

    async fn set_wishlist(&self, user_id: i32, wishlist: &[i32]) -> Result<User, RepositoryError> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or(RepositoryError::NotFound)?;

        user.wishlist = wishlist.to_vec();
        user.updated_at = now();
        Ok(user.clone())
    }
}
