// src/models/user.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").expect("username pattern is valid"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Display name.
    pub name: Option<String>,

    /// Unique handle.
    pub username: String,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Object storage path of the avatar image, if one was uploaded.
    pub avatar_path: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a freshly registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile of the authenticated user (`GET /api/user`).
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 255, message = "Name may not be greater than 255 characters."))]
    pub name: Option<String>,

    #[validate(
        length(
            min = 3,
            max = 30,
            message = "Username length must be between 3 and 30 characters."
        ),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Email must be a valid email address."))]
    pub email: String,

    #[validate(
        length(
            min = 8,
            max = 128,
            message = "Password length must be between 8 and 128 characters."
        ),
        must_match(other = "password_confirmation", message = "Password confirmation does not match.")
    )]
    pub password: String,

    pub password_confirmation: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_format").with_message(
            "Username may only contain letters, numbers, dots and underscores.".into(),
        ))
    }
}
