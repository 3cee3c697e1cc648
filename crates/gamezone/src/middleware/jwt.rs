use axum::{
    Extension,
    body::Body,
    http::{Request, header},
    middleware::Next,
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use shared::{abstract_trait::DynJwtService, config::ACCESS_TOKEN, errors::HttpError};

pub const TOKEN_COOKIE: &str = "token";

fn bearer(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Accepts an access token from the `token` cookie or a bearer header and
/// stores the caller's user id in the request extensions.
pub async fn auth_middleware(
    cookie_jar: CookieJar,
    Extension(jwt): Extension<DynJwtService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| bearer(&req))
        .ok_or_else(|| {
            HttpError::Unauthorized("You are not logged in, please provide token".to_string())
        })?;

    let user_id = jwt
        .verify_token(&token, ACCESS_TOKEN)
        .map_err(|_| HttpError::Unauthorized("Invalid token".to_string()))?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
