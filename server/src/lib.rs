pub mod accounts;
pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod models;
pub mod schema;
pub mod telemetry;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Router;
use tower_http::services::ServeDir;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::db::DbPool;
use crate::media::{MediaStore, MEDIA_URL};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub media: Arc<MediaStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, pool: DbPool) -> Self {
        Self {
            pool: Arc::new(pool),
            media: Arc::new(MediaStore::new(config.media_root.clone())),
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Build the full application router: API routes, uploaded media and API docs.
pub fn app(state: AppState) -> Router {
    let media = ServeDir::new(state.media.root());
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let router = Router::new()
        .merge(api::public::router())
        .nest("/user", api::user::router())
        .nest("/recipe/tags", api::tags::router())
        .nest("/recipe/ingredients", api::ingredients::router())
        .nest("/recipe/recipes", api::recipes::router())
        .nest_service(MEDIA_URL, media)
        .merge(swagger_ui)
        .with_state(state);

    telemetry::with_http_tracing(router)
}
