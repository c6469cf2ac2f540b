// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{auth, community, interaction, profile},
    state::AppState,
    utils::jwt::{auth_middleware, viewer_middleware},
};

/// Multipart framing allowance on top of the raw media size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Assembles the main application router.
///
/// * `/api/register`, `/api/login` are public.
/// * Feed reads resolve a `Viewer` (anonymous only if enabled in config).
/// * Everything else requires a bearer token.
/// * Uploaded media is served from `/storage`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://127.0.0.1:5173"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let read_routes = Router::new()
        .route("/posts", get(community::list_posts))
        .route("/posts/{id}", get(community::get_post))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            viewer_middleware,
        ));

    let protected_routes = Router::new()
        .route("/user", get(profile::get_me))
        .route("/posts", post(community::create_post))
        .route("/posts/{id}", delete(community::delete_post))
        .route("/posts/{id}/comments", post(interaction::create_comment))
        .route("/posts/{id}/like", post(interaction::toggle_like))
        .route("/comments/{id}", delete(interaction::delete_comment))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(read_routes)
        .merge(protected_routes);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/storage", ServeDir::new(&state.config.media_root))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
