use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_secret;
use crate::models::SiteSettings;
use crate::state::AppState;

// GET /api/admin/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SiteSettings> {
    Json(state.settings.get().as_ref().clone())
}

// POST /api/admin/config
#[derive(Deserialize)]
pub struct ReplaceConfigRequest {
    pub secret: String,
    #[serde(flatten)]
    pub settings: SiteSettings,
}

/// Replaces the settings singleton: persisted row first, then the in-memory
/// cache, so every later request sees the new credentials.
pub async fn replace_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplaceConfigRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_secret(&state, &body.secret)?;

    {
        let db = state.db.lock().unwrap();
        queries::save_settings(&db, &body.settings)?;
    }
    state.settings.replace(body.settings);
    tracing::info!(version = state.settings.version(), "site settings replaced");

    Ok(Json(serde_json::json!({ "ok": true })))
}
