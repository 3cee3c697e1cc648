use crate::middleware::{
    jwt::{TOKEN_COOKIE, auth_middleware},
    session::session_middleware,
    validate::SimpleValidatedJson,
};
use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use shared::{
    abstract_trait::{DynAuthService, DynProfileService},
    domain::{
        requests::{LoginRequest, RefreshTokenRequest, RegisterRequest, UpdateProfileRequest},
        responses::{ApiResponse, AuthResponse, TokenResponse, UserResponse, WishlistResponse},
        session::Session,
    },
    errors::HttpError,
    state::AppState,
};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or phone already registered")
    ),
    tag = "Auth"
)]
pub async fn register_handler(
    Extension(service): Extension<DynAuthService>,
    jar: CookieJar,
    SimpleValidatedJson(body): SimpleValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.register(&body).await?;
    let jar = jar.add(token_cookie(response.data.access_token.clone()));
    Ok((StatusCode::CREATED, jar, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    Extension(service): Extension<DynAuthService>,
    jar: CookieJar,
    SimpleValidatedJson(body): SimpleValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.login(&body).await?;
    let jar = jar.add(token_cookie(response.data.access_token.clone()));
    Ok((StatusCode::OK, jar, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Invalid or expired refresh token")
    ),
    tag = "Auth"
)]
pub async fn refresh_token_handler(
    Extension(service): Extension<DynAuthService>,
    SimpleValidatedJson(body): SimpleValidatedJson<RefreshTokenRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.refresh_token(&body.refresh_token).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Auth"
)]
pub async fn get_profile_handler(
    Extension(service): Extension<DynProfileService>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.get_profile(session.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Phone number already in use")
    ),
    tag = "Auth"
)]
pub async fn update_profile_handler(
    Extension(service): Extension<DynProfileService>,
    Extension(session): Extension<Session>,
    SimpleValidatedJson(body): SimpleValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.update_profile(session.user_id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/wishlist/{product_id}",
    security(("bearer_auth" = [])),
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Wishlist toggled", body = ApiResponse<WishlistResponse>),
        (status = 404, description = "Product not found")
    ),
    tag = "Auth"
)]
pub async fn toggle_wishlist_handler(
    Extension(service): Extension<DynProfileService>,
    Extension(session): Extension<Session>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.toggle_wishlist(session.user_id, product_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn auth_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    let di = &app_state.di_container;

    let public = OpenApiRouter::new()
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh-token", post(refresh_token_handler));

    let protected = OpenApiRouter::new()
        .route(
            "/api/auth/profile",
            get(get_profile_handler).put(update_profile_handler),
        )
        .route(
            "/api/auth/wishlist/{product_id}",
            post(toggle_wishlist_handler),
        )
        .route_layer(middleware::from_fn(session_middleware))
        .route_layer(middleware::from_fn(auth_middleware));

    public
        .merge(protected)
        .layer(Extension(di.auth_service.clone()))
        .layer(Extension(di.profile_service.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
