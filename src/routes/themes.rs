use axum::{Json, Router};
use axum::routing::get;
use tracing::info;

use crate::models::{ThemeName, ThemeSpec};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_themes))
}

pub async fn list_themes() -> Json<Vec<&'static ThemeSpec>> {
    info!("GET /api/themes - Listing themes");
    Json(ThemeName::ALL.iter().map(|t| t.spec()).collect())
}
