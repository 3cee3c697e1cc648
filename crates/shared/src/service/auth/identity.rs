use crate::{
    abstract_trait::{
        AuthServiceTrait, DynHashing, DynJwtService, DynUserCommandRepository,
        DynUserQueryRepository,
    },
    config::{ACCESS_TOKEN, REFRESH_TOKEN},
    domain::{
        enums::Role,
        requests::{CreateUserRecord, LoginRequest, RegisterRequest},
        responses::{ApiResponse, AuthResponse, TokenResponse, UserResponse},
        session::Session,
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
use tracing::{info, warn};

pub struct AuthServiceDeps {
    pub query: DynUserQueryRepository,
    pub command: DynUserCommandRepository,
    pub hashing: DynHashing,
    pub jwt: DynJwtService,
    pub registry: Arc<Mutex<Registry>>,
}

pub struct AuthService {
    query: DynUserQueryRepository,
    command: DynUserCommandRepository,
    hashing: DynHashing,
    jwt: DynJwtService,
    observer: ServiceObserver,
}

impl AuthService {
    pub async fn new(deps: AuthServiceDeps) -> Self {
        let AuthServiceDeps {
            query,
            command,
            hashing,
            jwt,
            registry,
        } = deps;

        Self {
            query,
            command,
            hashing,
            jwt,
            observer: ServiceObserver::new("auth-service", &registry).await,
        }
    }

    fn issue_tokens(&self, user_id: i32) -> Result<TokenResponse, ServiceError> {
        Ok(TokenResponse {
            access_token: self.jwt.generate_token(user_id, ACCESS_TOKEN)?,
            refresh_token: self.jwt.generate_token(user_id, REFRESH_TOKEN)?,
        })
    }

    fn authenticated(&self, user: UserModel) -> Result<AuthResponse, ServiceError> {
        let tokens = self.issue_tokens(user.user_id)?;

        Ok(AuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: UserResponse::from(user),
        })
    }

    async fn register_inner(&self, req: &RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let taken = self.query.find_by_email(&req.email).await?.is_some()
            || self.query.find_by_phone(&req.phone).await?.is_some();

        if taken {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let password_hash = self.hashing.hash_password(&req.password).await?;

        let user = self
            .command
            .create_user(&CreateUserRecord {
                name: req.name.clone(),
                email: req.email.clone(),
                phone: req.phone.clone(),
                password_hash,
                role: Role::User,
            })
            .await
            .map_err(|err| match err {
                // lost a race with a concurrent registration
                RepositoryError::AlreadyExists(_) => {
                    ServiceError::Conflict("User already exists".to_string())
                }
                other => ServiceError::Repo(other),
            })?;

        info!("✅ Registered user {} <{}>", user.user_id, user.email);

        self.authenticated(user)
    }

    async fn login_inner(&self, req: &LoginRequest) -> Result<AuthResponse, ServiceError> {
        let Some(user) = self.query.find_by_email(&req.email).await? else {
            warn!("❌ Login attempt for unknown email {}", req.email);
            return Err(ServiceError::InvalidCredentials);
        };

        self.hashing
            .compare_password(&user.password, &req.password)
            .await?;

        self.authenticated(user)
    }

    async fn refresh_inner(&self, refresh_token: &str) -> Result<TokenResponse, ServiceError> {
        let user_id = self.jwt.verify_token(refresh_token, REFRESH_TOKEN)?;

        if self.query.find_by_id(user_id).await?.is_none() {
            return Err(ServiceError::InvalidCredentials);
        }

        self.issue_tokens(user_id)
    }
}

#[async_trait]
impl AuthServiceTrait for AuthService {
    async fn register(
        &self,
        req: &RegisterRequest,
    ) -> Result<ApiResponse<AuthResponse>, ServiceError> {
        info!("📝 Registering {}", req.email);

        let tracing_ctx = self.observer.start(
            "register",
            vec![
                KeyValue::new("component", "auth"),
                KeyValue::new("user.email", req.email.clone()),
            ],
        );

        let result = self.register_inner(req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "User registered");

        Ok(ApiResponse::success("Registration successful", result?))
    }

    async fn login(&self, req: &LoginRequest) -> Result<ApiResponse<AuthResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "login",
            vec![
                KeyValue::new("component", "auth"),
                KeyValue::new("user.email", req.email.clone()),
            ],
        );

        let result = self.login_inner(req).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "User logged in");

        Ok(ApiResponse::success("Login successful", result?))
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<ApiResponse<TokenResponse>, ServiceError> {
        let tracing_ctx = self.observer.start(
            "refresh_token",
            vec![KeyValue::new("component", "auth")],
        );

        let result = self.refresh_inner(refresh_token).await;

        self.observer
            .record(&tracing_ctx, Method::Post, &result, "Token refreshed");

        Ok(ApiResponse::success("Token refreshed", result?))
    }

    async fn session(&self, user_id: i32) -> Result<Session, ServiceError> {
        let user = self
            .query
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        Ok(Session::new(user.user_id, user.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Hashing, JwtConfig},
        repository::memory::InMemoryUserStore,
    };

    async fn service() -> AuthService {
        let users = InMemoryUserStore::new();

        AuthService::new(AuthServiceDeps {
            query: Arc::new(users.clone()),
            command: Arc::new(users),
            hashing: Arc::new(Hashing::with_cost(4)),
            jwt: Arc::new(JwtConfig::new("test-secret")),
            registry: Arc::new(Mutex::new(Registry::default())),
        })
        .await
    }

    fn register_request(email: &str, phone: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Asha".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password: "secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn registered_users_can_log_in() {
        let auth = service().await;

        let registered = auth
            .register(&register_request("Asha@GameZone.test", "9000000001"))
            .await
            .unwrap()
            .data;
        assert_eq!(registered.user.email, "asha@gamezone.test");
        assert_eq!(registered.user.role, Role::User);

        let logged_in = auth
            .login(&LoginRequest {
                email: "asha@gamezone.test".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap()
            .data;
        assert_eq!(logged_in.user.id, registered.user.id);

        let session = auth.session(logged_in.user.id).await.unwrap();
        assert_eq!(session, Session::new(registered.user.id, Role::User));
    }

    #[tokio::test]
    async fn duplicate_email_or_phone_conflicts() {
        let auth = service().await;
        auth.register(&register_request("a@gamezone.test", "9000000001"))
            .await
            .unwrap();

        for req in [
            register_request("a@gamezone.test", "9000000002"),
            register_request("b@gamezone.test", "9000000001"),
        ] {
            let err = auth.register(&req).await.unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(msg) if msg == "User already exists"));
        }
    }

    #[tokio::test]
    async fn bad_password_and_unknown_email_look_the_same() {
        let auth = service().await;
        auth.register(&register_request("a@gamezone.test", "9000000001"))
            .await
            .unwrap();

        for (email, password) in [("a@gamezone.test", "nope"), ("ghost@gamezone.test", "secret123")] {
            let err = auth
                .login(&LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn only_refresh_tokens_can_be_refreshed() {
        let auth = service().await;
        let tokens = auth
            .register(&register_request("a@gamezone.test", "9000000001"))
            .await
            .unwrap()
            .data;

        assert!(auth.refresh_token(&tokens.refresh_token).await.is_ok());
        assert!(matches!(
            auth.refresh_token(&tokens.access_token).await,
            Err(ServiceError::InvalidTokenType)
        ));
    }
}
