// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extract::AppJson,
    models::user::{CreateUserRequest, LoginRequest, NewUser},
    state::DynStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and an access token for the new account.
pub async fn register(
    State(store): State<DynStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .create_user(NewUser {
            name: payload.name.filter(|n| !n.trim().is_empty()),
            username: payload.username,
            email: payload.email,
            password_hash: hashed_password,
        })
        .await?;
    tracing::info!(user_id = user.id, "User registered: {}", user.username);

    let token = sign_jwt(user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "access_token": token,
            "token_type": "Bearer"
        })),
    ))
}

/// Authenticates a user by email and password and returns a JWT.
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "access_token": token,
        "token_type": "Bearer"
    })))
}
