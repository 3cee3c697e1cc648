use crate::errors::{error::ErrorResponse, repository::RepositoryError, service::ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                HttpError::Unauthorized("Invalid email or password".to_string())
            }

            ServiceError::Validation(errors) => {
                HttpError::BadRequest(format!("Validation failed: {errors:?}"))
            }

            ServiceError::BadRequest(msg) => HttpError::BadRequest(msg),

            ServiceError::Conflict(msg) => HttpError::Conflict(msg),

            ServiceError::NotFound(msg) => HttpError::NotFound(msg),

            ServiceError::Forbidden(msg) => HttpError::Forbidden(msg),

            ServiceError::EmptyCart => HttpError::BadRequest("Cart is empty".into()),

            err @ ServiceError::InvalidTransition { .. } => HttpError::BadRequest(err.to_string()),

            err @ ServiceError::InsufficientStock { .. } => HttpError::Conflict(err.to_string()),

            err @ ServiceError::OrderPlacementFailed { .. } => HttpError::Internal(err.to_string()),

            ServiceError::Repo(repo_err) => match repo_err {
                RepositoryError::NotFound => HttpError::NotFound("Not found".into()),
                RepositoryError::Conflict(msg) => HttpError::Conflict(msg),
                RepositoryError::AlreadyExists(msg) => HttpError::Conflict(msg),
                RepositoryError::ForeignKey(msg) => {
                    HttpError::BadRequest(format!("Foreign key violation: {msg}"))
                }
                err @ RepositoryError::InsufficientStock { .. } => {
                    HttpError::Conflict(err.to_string())
                }
                RepositoryError::Timeout(msg) => HttpError::ServiceUnavailable(msg),
                _ => HttpError::Internal("Repository error".into()),
            },

            ServiceError::Jwt(err) => HttpError::Unauthorized(format!("JWT error: {err}")),

            ServiceError::Internal(msg) | ServiceError::Custom(msg) => HttpError::Internal(msg),

            ServiceError::Bcrypt(_) => {
                HttpError::Internal("Internal authentication error".into())
            }

            ServiceError::TokenExpired => HttpError::Unauthorized("Token expired".into()),

            ServiceError::InvalidTokenType => {
                HttpError::Unauthorized("Invalid token type".into())
            }
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            HttpError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            status: "error".into(),
            message: msg,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        HttpError::from(err).into_response().status()
    }

    #[test]
    fn checkout_errors_map_to_distinct_statuses() {
        assert_eq!(status_of(ServiceError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(ServiceError::InsufficientStock {
                product_id: 1,
                name: "PS5".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::OrderPlacementFailed {
                order_id: 7,
                step: "delete_cart".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServiceError::Forbidden("Not authorized".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ServiceError::not_found("Order")),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn account_and_catalog_errors_keep_their_meaning() {
        assert_eq!(
            status_of(ServiceError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ServiceError::Conflict("User already exists".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::BadRequest("Already reviewed".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::Repo(RepositoryError::Timeout("slow".into()))),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
