use std::path::PathBuf;

use axum::{
    Json, Router,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use bloglist_types::api::ErrorResponse;

use crate::auth::{self, AppState};
use crate::middleware::{extract_token, resolve_user};
use crate::{blogs, users};

/// Build the full API. With `static_dir`, paths that match no route are
/// served from that directory before falling back to the 404 body.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let require_user = middleware::from_fn_with_state(state.clone(), resolve_user);

    let router = Router::new()
        .route(
            "/api/blogs",
            get(blogs::list_blogs).merge(post(blogs::create_blog).route_layer(require_user)),
        )
        .route("/api/stats", get(blogs::blog_stats))
        .route("/api/blogs/{id}", delete(blogs::delete_blog))
        .route("/api/blogs/{id}/likes", put(blogs::update_likes))
        .route("/api/users", get(users::list_users).post(users::register))
        .route("/api/login", post(auth::login));

    let router = match static_dir {
        Some(dir) => router.fallback_service(
            ServeDir::new(dir).not_found_service(unknown_endpoint.into_service()),
        ),
        None => router.fallback(unknown_endpoint),
    };

    router
        .layer(middleware::from_fn(extract_token))
        .with_state(state)
}

pub async fn unknown_endpoint() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "unknown endpoint".to_string(),
        }),
    )
}
