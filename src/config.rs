// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Upload cap applied to post media when `MAX_UPLOAD_BYTES` is not set.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL URL. `None` runs the server on the in-process store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub media_root: String,
    pub public_url: String,
    pub max_upload_bytes: usize,
    pub allow_anonymous_reads: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let media_root = env::var("MEDIA_ROOT")
            .unwrap_or_else(|_| "storage/public".to_string());

        let public_url = env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000/storage/".to_string());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let allow_anonymous_reads = env::var("ALLOW_ANONYMOUS_READS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            media_root,
            public_url,
            max_upload_bytes,
            allow_anonymous_reads,
        }
    }
}
