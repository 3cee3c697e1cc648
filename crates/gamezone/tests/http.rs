use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use gamezone::handler::AppRouter;
use serde_json::{Value, json};
use shared::{
    abstract_trait::{HashingTrait, UserCommandRepositoryTrait},
    config::Hashing,
    di::Stores,
    domain::{enums::Role, requests::CreateUserRecord},
    state::AppState,
    utils::RetryPolicy,
};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "http-test-secret";

async fn app() -> Router {
    AppRouter::build(Arc::new(AppState::in_memory(SECRET).await))
}

/// App plus a seller account that already exists in the store.
async fn app_with_seller() -> Router {
    let stores = Stores::in_memory();
    let hashing = Hashing::with_cost(4);

    let password_hash = hashing.hash_password("secret123").await.unwrap();
    stores
        .user_command
        .create_user(&CreateUserRecord {
            name: "Ravi Seller".into(),
            email: "seller@gamezone.test".into(),
            phone: "9000000001".into(),
            password_hash,
            role: Role::Seller,
        })
        .await
        .unwrap();

    let state = AppState::from_stores(stores, Arc::new(hashing), SECRET, RetryPolicy::default()).await;
    AppRouter::build(Arc::new(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register(app: &Router, name: &str, email: &str, phone: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "phone": phone,
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

fn shipping() -> Value {
    json!({
        "shipping_address": {
            "name": "Asha Rao",
            "phone": "9876543210",
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "pincode": "560001"
        },
        "payment_method": "cod"
    })
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    let (status, _) = send(&app, Method::GET, "/api/cart", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_sets_cookie_and_profile_is_reachable() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Meera",
                "email": "meera@gamezone.test",
                "phone": "9123456780",
                "password": "secret123",
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    let token_pair = cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/auth/profile")
        .header(header::COOKIE, token_pair)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["email"], "meera@gamezone.test");
    assert_eq!(body["data"]["role"], "user");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "Meera Again",
            "email": "meera@gamezone.test",
            "phone": "9123456789",
            "password": "secret123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn invalid_registration_lists_field_errors() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "name": "M",
            "email": "not-an-email",
            "phone": "9123456780",
            "password": "123",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["email"].is_array());
    assert!(body["details"]["password"].is_array());
    assert!(body["details"].get("phone").is_none());
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() {
    let app = app().await;
    let token = register(&app, "Kabir", "kabir@gamezone.test", "9000000002").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders/place",
        Some(&token),
        Some(shipping()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn buyer_flow_from_listing_to_cancellation() {
    let app = app_with_seller().await;
    let seller = login(&app, "seller@gamezone.test").await;
    let buyer = register(&app, "Nisha", "nisha@gamezone.test", "9000000003").await;

    let listing = json!({
        "name": "Spider-Man 2",
        "description": "Disc, played once",
        "price": 300,
        "original_price": 4999,
        "platform": "ps5",
        "condition": "like-new",
        "stock": 2,
    });

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&buyer),
        Some(listing.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(&seller),
        Some(listing),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let product_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::GET, "/api/products?platform=ps5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_products"], 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/cart/add",
        Some(&buyer),
        Some(json!({ "product_id": product_id, "quantity": i32::MAX })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/cart/add",
        Some(&buyer),
        Some(json!({ "product_id": product_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["total_price"], 600);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders/place",
        Some(&buyer),
        Some(shipping()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["total_amount"], 600);
    assert_eq!(body["data"]["delivery_charge"], 0);
    assert_eq!(body["data"]["order_status"], "placed");
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (_, body) = send(&app, Method::GET, &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(body["data"]["stock"], 0);
    assert_eq!(body["data"]["seller_name"], "Ravi Seller");

    let (_, body) = send(&app, Method::GET, "/api/cart", Some(&buyer), None).await;
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));

    let (status, body) = send(&app, Method::GET, "/api/orders/my-orders", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{order_id}"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"]["name"], "Nisha");
    assert_eq!(body["data"]["customer"]["email"], "nisha@gamezone.test");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/orders/{order_id}"),
        Some(&seller),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/orders/admin/all", Some(&buyer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}/cancel"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order_status"], "cancelled");

    let (_, body) = send(&app, Method::GET, &format!("/api/products/{product_id}"), None, None).await;
    assert_eq!(body["data"]["stock"], 2);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{order_id}/cancel"),
        Some(&buyer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_and_openapi_are_served() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/orders/place"].is_object());
}
