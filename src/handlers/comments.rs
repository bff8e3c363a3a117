use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::Result,
    handlers::{AppJson, AppPath, enforce_rate_limit},
    models::{CreateCommentRequest, FeedbackComment},
};

pub async fn create_comment(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<FeedbackComment>)> {
    payload.validate()?;

    // 10 per minute
    let rate_limit_key = format!("comment_create:user:{}", payload.user_id);
    enforce_rate_limit(&state, &rate_limit_key, 10, 60).await?;

    let comment = state.ledger.add_comment(item_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn get_comments(
    State(state): State<AppState>,
    AppPath(item_id): AppPath<Uuid>,
) -> Result<Json<Vec<FeedbackComment>>> {
    let comments = state.ledger.list_comments(item_id).await?;
    Ok(Json(comments))
}
