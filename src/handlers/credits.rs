use axum::{extract::State, response::Json};
use serde::Deserialize;

use crate::{
    AppState,
    error::Result,
    handlers::AppQuery,
    models::{CreditTransaction, UserCredits},
};

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

pub async fn get_balance(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<BalanceQuery>,
) -> Result<Json<UserCredits>> {
    let credits = state.ledger.get_balance(&params.user_id).await?;
    Ok(Json(credits))
}

pub async fn get_history(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<HistoryQuery>,
) -> Result<Json<Vec<CreditTransaction>>> {
    let limit = params.limit.unwrap_or(50).min(100);
    let offset = params.offset.unwrap_or(0);

    let transactions = state
        .ledger
        .credit_history(&params.user_id, limit, offset)
        .await?;

    Ok(Json(transactions))
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LeaderboardQuery>,
) -> Result<Json<Vec<UserCredits>>> {
    let limit = params.limit.unwrap_or(20).min(50);
    let leaders = state.ledger.leaderboard(limit).await?;
    Ok(Json(leaders))
}
