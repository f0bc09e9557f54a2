use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::JwtConfig;

/// Пользователь, которого удостоверил внешний identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Claims принимаемых bearer-токенов. В `sub` лежит числовой id пользователя.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

pub fn verify_token(token: &str, jwt: &JwtConfig) -> Result<AuthUser, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = jwt.leeway_secs;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &validation,
    )?;

    let user_id = data
        .claims
        .sub
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or(jsonwebtoken::errors::ErrorKind::InvalidSubject)?;

    Ok(AuthUser { user_id })
}

// Bearer JWT extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        verify_token(token.trim(), &state.config.jwt).map_err(|e| {
            tracing::debug!("rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn jwt() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            leeway_secs: 0,
        }
    }

    fn token(sub: &str, exp_offset: i64, secret: &str) -> String {
        let exp = (chrono::Utc::now().timestamp() + exp_offset) as u64;
        encode(
            &Header::new(Algorithm::HS256),
            &Claims { sub: sub.to_string(), exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_token() {
        let user = verify_token(&token("42", 600, "test-secret"), &jwt()).unwrap();
        assert_eq!(user.user_id, 42);
    }

    #[test]
    fn rejects_expired_token() {
        assert!(verify_token(&token("42", -600, "test-secret"), &jwt()).is_err());
    }

    #[test]
    fn rejects_foreign_signature() {
        assert!(verify_token(&token("42", 600, "other-secret"), &jwt()).is_err());
    }

    #[test]
    fn rejects_non_numeric_subject() {
        assert!(verify_token(&token("alice", 600, "test-secret"), &jwt()).is_err());
        assert!(verify_token(&token("0", 600, "test-secret"), &jwt()).is_err());
    }
}
