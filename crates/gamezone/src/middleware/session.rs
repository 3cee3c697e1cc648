use axum::{
    Extension,
    body::Body,
    http::Request,
    middleware::Next,
    response::IntoResponse,
};
use shared::{abstract_trait::DynAuthService, errors::HttpError};
use tracing::warn;

/// Turns the authenticated user id into a [`shared::domain::session::Session`]
/// carrying the role as it is stored now, not as it was at login.
pub async fn session_middleware(
    Extension(auth): Extension<DynAuthService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let user_id = req
        .extensions()
        .get::<i32>()
        .copied()
        .ok_or_else(|| HttpError::Unauthorized("Missing user_id in request context".to_string()))?;

    let session = auth.session(user_id).await.map_err(|err| {
        warn!("❌ No session for user {}: {}", user_id, err);
        HttpError::Unauthorized("User no longer exists".to_string())
    })?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
