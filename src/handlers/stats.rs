use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::{AppState, error::Result, models::PlatformStats};

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "appfeedback"
    }))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>> {
    let stats = state.ledger.stats().await?;
    Ok(Json(stats))
}
