use crate::{abstract_trait::JwtServiceTrait, errors::ServiceError};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub exp: usize,
    pub iat: usize,
    pub token_type: String,
}

impl Claims {
    pub fn new(user_id: i32, exp: usize, iat: usize, token_type: String) -> Self {
        Claims {
            user_id,
            exp,
            iat,
            token_type,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub jwt_secret: String,
}

impl JwtConfig {
    pub fn new(jwt_secret: &str) -> Self {
        JwtConfig {
            jwt_secret: jwt_secret.to_string(),
        }
    }
}

impl JwtServiceTrait for JwtConfig {
    fn generate_token(&self, user_id: i32, token_type: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = match token_type {
            ACCESS_TOKEN => (now + Duration::minutes(60)).timestamp() as usize,
            REFRESH_TOKEN => (now + Duration::days(7)).timestamp() as usize,
            _ => return Err(ServiceError::InvalidTokenType),
        };

        let claims = Claims::new(user_id, exp, iat, token_type.to_string());

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(ServiceError::Jwt)
    }

    fn verify_token(&self, token: &str, expected_type: &str) -> Result<i32, ServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ServiceError::TokenExpired,
                _ => ServiceError::Jwt(err),
            })?;

        if token_data.claims.token_type != expected_type {
            return Err(ServiceError::InvalidTokenType);
        }

        Ok(token_data.claims.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_with_their_type() {
        let jwt = JwtConfig::new("test-secret");
        let token = jwt.generate_token(42, ACCESS_TOKEN).unwrap();

        assert_eq!(jwt.verify_token(&token, ACCESS_TOKEN).unwrap(), 42);
        assert!(matches!(
            jwt.verify_token(&token, REFRESH_TOKEN),
            Err(ServiceError::InvalidTokenType)
        ));
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = JwtConfig::new("a").generate_token(1, REFRESH_TOKEN).unwrap();

        assert!(matches!(
            JwtConfig::new("b").verify_token(&token, REFRESH_TOKEN),
            Err(ServiceError::Jwt(_))
        ));
    }

    #[test]
    fn unknown_token_types_cannot_be_issued() {
        let jwt = JwtConfig::new("test-secret");
        assert!(matches!(
            jwt.generate_token(1, "reset"),
            Err(ServiceError::InvalidTokenType)
        ));
    }
}
