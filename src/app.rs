use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{health, sessions, themes};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/themes", themes::router())
        .nest("/api/sessions", sessions::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
