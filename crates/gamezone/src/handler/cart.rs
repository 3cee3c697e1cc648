use crate::middleware::{
    jwt::auth_middleware, session::session_middleware, validate::SimpleValidatedJson,
};
use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use shared::{
    abstract_trait::DynCartService,
    domain::{
        requests::{AddToCartRequest, UpdateCartRequest},
        responses::{ApiResponse, CartResponse},
        session::Session,
    },
    errors::HttpError,
    state::AppState,
};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    get,
    path = "/api/cart",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart with current prices", body = ApiResponse<CartResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_cart(
    Extension(service): Extension<DynCartService>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.get_cart(session.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    tag = "Cart",
    security(("bearer_auth" = [])),
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<CartResponse>),
        (status = 400, description = "Product unavailable or stock exceeded"),
        (status = 404, description = "Product not found")
    )
)]
pub async fn add_to_cart(
    Extension(service): Extension<DynCartService>,
    Extension(session): Extension<Session>,
    SimpleValidatedJson(body): SimpleValidatedJson<AddToCartRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.add_item(session.user_id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/cart/update",
    tag = "Cart",
    security(("bearer_auth" = [])),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<CartResponse>),
        (status = 400, description = "Stock exceeded"),
        (status = 404, description = "Cart or item not found")
    )
)]
pub async fn update_cart(
    Extension(service): Extension<DynCartService>,
    Extension(session): Extension<Session>,
    SimpleValidatedJson(body): SimpleValidatedJson<UpdateCartRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.update_quantity(session.user_id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/remove/{product_id}",
    tag = "Cart",
    security(("bearer_auth" = [])),
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<CartResponse>)
    )
)]
pub async fn remove_from_cart(
    Extension(service): Extension<DynCartService>,
    Extension(session): Extension<Session>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.remove_item(session.user_id, product_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/clear",
    tag = "Cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<CartResponse>)
    )
)]
pub async fn clear_cart(
    Extension(service): Extension<DynCartService>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.clear(session.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn cart_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/add", post(add_to_cart))
        .route("/api/cart/update", put(update_cart))
        .route("/api/cart/remove/{product_id}", delete(remove_from_cart))
        .route("/api/cart/clear", delete(clear_cart))
        .route_layer(middleware::from_fn(session_middleware))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.cart_service.clone()))
        .layer(Extension(app_state.di_container.auth_service.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
