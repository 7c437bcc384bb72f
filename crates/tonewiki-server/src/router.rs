use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with every wiki endpoint.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(config.session_cookie_name.clone())
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_http_only(true);

    Router::new()
        .route("/", get(handler::home))
        .route("/health", get(handler::health))
        .route("/pages", get(handler::list_pages))
        .route("/pages/:name", get(handler::show_page))
        .route("/about", get(handler::about))
        .route("/images", get(handler::images))
        .route("/images/raw/:file", get(handler::raw_image))
        .route("/signup", post(handler::signup))
        .route("/login", post(handler::login))
        .route("/logout", get(handler::logout).post(handler::logout))
        .route("/upload", post(handler::upload))
        .route(
            "/comments",
            get(handler::list_comments).post(handler::post_comment),
        )
        .route("/history", get(handler::history))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
