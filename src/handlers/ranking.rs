use axum::{extract::State, response::Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    handlers::{AppPath, AppQuery},
    models::{FeedbackItemResponse, ItemType, RankingAlgorithm},
};

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub item_type: Option<ItemType>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn get_results(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ResultsQuery>,
) -> Result<Json<Vec<FeedbackItemResponse>>> {
    let limit = params.limit.unwrap_or(20).min(100);
    let items = state.ledger.ranked_results(params.item_type, limit).await?;
    Ok(Json(items))
}

pub async fn run_ranking(State(state): State<AppState>) -> Result<Json<Value>> {
    let processed = state.ledger.rerank_all().await?;

    Ok(Json(json!({
        "message": format!("Re-ranked {} items", processed),
        "processed": processed,
        "timestamp": Utc::now()
    })))
}

pub async fn get_algorithm(State(state): State<AppState>) -> Result<Json<RankingAlgorithm>> {
    let algorithm = state.ledger.active_algorithm().await?;
    Ok(Json(algorithm))
}

pub async fn get_algorithm_history(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HistoryQuery>,
) -> Result<Json<Vec<RankingAlgorithm>>> {
    let limit = params.limit.unwrap_or(10).min(100);
    let history = state.ledger.algorithm_history(limit).await?;
    Ok(Json(history))
}

pub async fn rescore_item(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
) -> Result<Json<FeedbackItemResponse>> {
    let item = state.ledger.rescore_item(item_id).await?;
    Ok(Json(item))
}
