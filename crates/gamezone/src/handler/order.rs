use crate::middleware::{
    jwt::auth_middleware, session::session_middleware, validate::SimpleValidatedJson,
};
use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use shared::{
    domain::{
        requests::{PlaceOrderRequest, UpdateOrderStatusRequest},
        responses::{AdminOrdersResponse, ApiResponse, OrderResponse},
        session::Session,
    },
    errors::HttpError,
    service::OrderService,
    state::AppState,
};
use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

#[utoipa::path(
    post,
    path = "/api/orders/place",
    tag = "Order",
    security(("bearer_auth" = [])),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Cart is empty or address invalid"),
        (status = 409, description = "Insufficient stock"),
        (status = 500, description = "Placement failed midway")
    )
)]
pub async fn place_order(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
    SimpleValidatedJson(body): SimpleValidatedJson<PlaceOrderRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.command.place_order(session.user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/orders/my-orders",
    tag = "Order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's orders, newest first", body = ApiResponse<Vec<OrderResponse>>)
    )
)]
pub async fn my_orders(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.query.my_orders(session.user_id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/orders/admin/all",
    tag = "Order",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Every order with aggregate stats", body = ApiResponse<AdminOrdersResponse>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn admin_all_orders(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.query.admin_all(&session).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderResponse>),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.query.get_order(&session, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/cancel",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled and stock restored", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Order can no longer be cancelled"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn cancel_order(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.command.cancel_order(&session, id).await?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    tag = "Order",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<OrderResponse>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_order_status(
    Extension(service): Extension<OrderService>,
    Extension(session): Extension<Session>,
    Path(id): Path<i32>,
    SimpleValidatedJson(body): SimpleValidatedJson<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, HttpError> {
    let response = service.command.update_status(&session, id, &body).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub fn order_routes(app_state: Arc<AppState>) -> OpenApiRouter {
    OpenApiRouter::new()
        .route("/api/orders/place", post(place_order))
        .route("/api/orders/my-orders", get(my_orders))
        .route("/api/orders/admin/all", get(admin_all_orders))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/{id}/cancel", put(cancel_order))
        .route("/api/orders/{id}/status", put(update_order_status))
        .route_layer(middleware::from_fn(session_middleware))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(Extension(app_state.di_container.order_service.clone()))
        .layer(Extension(app_state.di_container.auth_service.clone()))
        .layer(Extension(app_state.jwt_config.clone()))
}
