use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::Result,
    handlers::{AppJson, AppPath, AppQuery, enforce_rate_limit},
    models::{
        CreateFeedbackRequest, FeedbackItemResponse, ItemQuery, ItemSort, ItemStatus, ItemType,
        UpdateFeedbackRequest, VoteRequest, VoteResponse,
    },
};

#[derive(Debug, Deserialize)]
pub struct ListFeedbackQuery {
    pub item_type: Option<ItemType>,
    pub status: Option<ItemStatus>,
    pub sort_by: Option<ItemSort>,
    /// Viewer whose votes are reported back as `user_voted`.
    pub user_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    pub user_id: String,
}

pub async fn create_feedback(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackItemResponse>)> {
    payload.validate()?;

    // 10 per hour
    let rate_limit_key = format!("feedback_create:{}", payload.user_id);
    enforce_rate_limit(&state, &rate_limit_key, 10, 3600).await?;

    let item = state.ledger.create_item(&payload).await?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ListFeedbackQuery>,
) -> Result<Json<Value>> {
    let query = ItemQuery {
        item_type: params.item_type,
        status: params.status,
        sort: params.sort_by.unwrap_or_default(),
        limit: params.limit.unwrap_or(50).min(100),
        offset: params.offset.unwrap_or(0),
    };

    let (items, total) = state
        .ledger
        .list_items(&query, params.user_id.as_deref())
        .await?;

    Ok(Json(json!({
        "items": items,
        "pagination": {
            "limit": query.limit,
            "offset": query.offset,
            "total": total
        }
    })))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppQuery(params): AppQuery<ViewerQuery>,
) -> Result<Json<FeedbackItemResponse>> {
    let item = state
        .ledger
        .get_item(item_id, params.user_id.as_deref())
        .await?;

    Ok(Json(item))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppQuery(owner): AppQuery<OwnerQuery>,
    AppJson(payload): AppJson<UpdateFeedbackRequest>,
) -> Result<Json<FeedbackItemResponse>> {
    payload.validate()?;

    let item = state
        .ledger
        .update_item(item_id, &owner.user_id, &payload)
        .await?;

    Ok(Json(item))
}

pub async fn delete_feedback(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppQuery(owner): AppQuery<OwnerQuery>,
) -> Result<Json<Value>> {
    state.ledger.delete_item(item_id, &owner.user_id).await?;

    Ok(Json(json!({
        "message": "Item deleted"
    })))
}

pub async fn vote_feedback(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(payload): AppJson<VoteRequest>,
) -> Result<Json<VoteResponse>> {
    payload.validate()?;

    // 100 per hour
    let rate_limit_key = format!("vote:{}", payload.user_id);
    enforce_rate_limit(&state, &rate_limit_key, 100, 3600).await?;

    let response = state
        .ledger
        .vote(item_id, &payload.user_id, payload.vote_type)
        .await?;

    Ok(Json(response))
}
