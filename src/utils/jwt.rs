// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Claims of an identity-provider ID token.
///
/// The provider owns sign-up, passwords and social login; this service only
/// checks the signature and reads the profile claims.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Stable user id issued by the provider.
    pub sub: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Profile claims carried by a token minted with `sign_jwt`.
#[derive(Debug, Clone, Default)]
pub struct TokenProfile<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub picture: Option<&'a str>,
}

/// Mints a token with the same shape the provider issues. Used by local
/// tooling and the integration tests.
pub fn sign_jwt(
    user_id: &str,
    profile: TokenProfile<'_>,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user_id.to_owned(),
        name: profile.name.map(str::to_owned),
        email: profile.email.map(str::to_owned),
        picture: profile.picture.map(str::to_owned),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

/// Verifies and decodes a JWT string.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Auth("Invalid token".to_string()))?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(AppError::Auth("Token has no subject".to_string()));
    }
    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions. Anything else is a 401.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::debug!("Rejected token: {}", e.public_message());
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_tokens_verify_with_the_same_secret() {
        let token = sign_jwt(
            "firebase-uid-1",
            TokenProfile {
                name: Some("Ada"),
                ..Default::default()
            },
            "secret",
            60,
        )
        .unwrap();

        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.sub, "firebase-uid-1");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert!(claims.email.is_none());

        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::Auth(_))));
    }
}
