// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, views::Viewer};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - Stores the User ID (as string).
    pub sub: String,
    pub username: String,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }
}

/// Signs a new access token for the user.
pub fn sign_jwt(
    id: i64,
    username: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize;

    let claims = Claims {
        sub: id.to_string(),
        username: username.to_owned(),
        iat: now,
        exp: now + expiration_seconds as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// `Some(token)` for `Authorization: Bearer <token>`, `None` when the header is absent.
/// A header with any other scheme is an error.
fn bearer_token(req: &Request<Body>) -> Result<Option<&str>, AppError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::AuthError("Unauthenticated.".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AppError::AuthError("Unauthenticated.".to_string()))
}

fn authenticate(req: &mut Request<Body>, token: &str, secret: &str) -> Result<(), AppError> {
    let claims = verify_jwt(token, secret)?;
    let viewer = Viewer::Authenticated(claims.user_id()?);
    req.extensions_mut().insert(claims);
    req.extensions_mut().insert(viewer);
    Ok(())
}

/// Axum Middleware: Authentication.
///
/// Requires a valid 'Authorization: Bearer <token>' header.
/// Injects `Claims` and `Viewer::Authenticated` into the request extensions,
/// otherwise returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?
        .ok_or_else(|| AppError::AuthError("Unauthenticated.".to_string()))?
        .to_owned();

    authenticate(&mut req, &token, &config.jwt_secret)?;
    Ok(next.run(req).await)
}

/// Axum Middleware: Viewer resolution for read routes.
///
/// A presented token must be valid. Without one the request proceeds as
/// `Viewer::Anonymous` if anonymous reads are enabled, and is rejected otherwise.
pub async fn viewer_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?.map(str::to_owned);
    match token {
        Some(token) => authenticate(&mut req, &token, &config.jwt_secret)?,
        None if config.allow_anonymous_reads => {
            req.extensions_mut().insert(Viewer::Anonymous);
        }
        None => return Err(AppError::AuthError("Unauthenticated.".to_string())),
    }

    Ok(next.run(req).await)
}
