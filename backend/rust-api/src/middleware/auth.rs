use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::UserId;
use crate::AppState;

/// Claims of an identity-service access token. Only `sub` and `exp` are required.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// Validate an `Authorization` header value against the shared HS256 secret.
pub fn authenticate(header: Option<&HeaderValue>, secret: &str) -> Result<AuthUser, ApiError> {
    let header = header.ok_or_else(|| {
        tracing::warn!("Missing Authorization header");
        ApiError::Unauthorized("Missing Authorization header".to_string())
    })?;

    let invalid_format = || ApiError::Unauthorized("Invalid authorization header format".to_string());
    let raw = header.to_str().map_err(|_| invalid_format())?;
    let mut parts = raw.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => {
            tracing::warn!("Authorization header parsing failed");
            return Err(invalid_format());
        }
    };

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::warn!("Invalid authorization scheme: {}", scheme);
        return Err(ApiError::Unauthorized(
            "Invalid authorization scheme. Use 'Bearer <token>'".to_string(),
        ));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_aud = false;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| {
            tracing::warn!("JWT validation failed: {:?}", e);
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?
        .claims;

    let user_id = claims
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or_else(|| {
            tracing::warn!("Missing 'sub' in JWT payload");
            ApiError::Unauthorized("Invalid token: missing user ID".to_string())
        })?;

    tracing::debug!("User authenticated: {}", user_id);
    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(req.headers().get(AUTHORIZATION), &state.config.jwt_secret) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Mint an access token shaped like the identity service's (`aud`/`role` = "authenticated").
pub fn issue_token(
    user_id: &str,
    email: Option<&str>,
    secret: &str,
    expiration_secs: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = (Utc::now() + Duration::seconds(expiration_secs)).timestamp() as usize;
    let claims = Claims {
        sub: Some(user_id.to_string()),
        exp,
        email: email.map(String::from),
        role: Some("authenticated".to_string()),
        aud: Some("authenticated".to_string()),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
