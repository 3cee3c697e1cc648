use crate::{
    domain::{
        requests::{LoginRequest, RegisterRequest},
        responses::{ApiResponse, AuthResponse, TokenResponse},
        session::Session,
    },
    errors::ServiceError,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type DynAuthService = Arc<dyn AuthServiceTrait + Send + Sync>;

#[async_trait]
pub trait AuthServiceTrait {
    async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<ApiResponse<AuthResponse>, ServiceError>;
    async fn login(&self, req: &LoginRequest) -> Result<ApiResponse<AuthResponse>, ServiceError>;
    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ApiResponse<TokenResponse>, ServiceError>;

    /// Resolves the caller's current role for an authenticated user id.
    async fn session(&self, user_id: i32) -> Result<Session, ServiceError>;
}
