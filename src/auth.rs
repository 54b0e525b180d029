//! Credentials: salted password hashes and bearer tokens.

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{DateTime, Duration, FixedOffset};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::models::OwnerId;
use crate::state::AppState;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    InvalidToken,

    #[error("wrong username or password")]
    BadCredentials,

    #[error("could not issue token")]
    Issue,

    #[error("could not hash password")]
    Hash,
}

pub const BCRYPT_COST: u32 = 10;

/// Salted bcrypt hash in the modular crypt format (`$2b$10$...`).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AuthError::Hash
    })
}

/// Malformed stored hashes never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: OwnerId,
    pub username: String,
    pub exp: i64,
}

pub fn issue_token(
    user_id: OwnerId,
    username: &str,
    ttl_days: i64,
    now: DateTime<FixedOffset>,
    secret: &str,
) -> Result<String, AuthError> {
    let claims = Claims {
        user_id,
        username: username.to_string(),
        exp: (now + Duration::days(ttl_days)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).map_err(|e| {
        tracing::error!(error = %e, "Token encoding failed");
        AuthError::Issue
    })
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken,
        })
}

/// Owner resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: OwnerId,
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = verify_token(token, &state.config.jwt_secret)?;
        tracing::debug!(user_id = %claims.user_id, "Authenticated request");
        Ok(AuthUser {
            id: claims.user_id,
            username: claims.username,
        })
    }
}
