//! recipe-api library - recipe management REST service
//!
//! Users register, obtain a token, and manage their own recipes, tags and
//! ingredients. Everything except registration, login, health, the API
//! schema and media files requires `Authorization: Token <key>`.

use axum::Router;
use recipe_common::db::AttributeKind;
use sqlx::SqlitePool;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod media;

use media::MediaStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Uploaded image storage
    pub media: MediaStore,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, media: MediaStore) -> Self {
        Self { db, media }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    // Protected routes (require a token)
    let protected = Router::new()
        .merge(api::users::profile_routes())
        .merge(api::recipe_routes())
        .merge(api::attribute_routes(AttributeKind::Tag))
        .merge(api::attribute_routes(AttributeKind::Ingredient))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_auth,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .merge(api::users::public_routes())
        .merge(api::schema_routes())
        .merge(api::health_routes());

    let media = ServeDir::new(state.media.root());

    Router::new()
        .merge(protected)
        .merge(public)
        .nest_service(state.media.url_prefix(), media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
