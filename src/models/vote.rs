use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vote_direction", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Signed contribution of one vote in this direction to `vote_count`.
    pub fn weight(self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackVote {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: String,
    pub vote_type: VoteDirection,
    pub created_at: DateTime<Utc>,
}

// Vote request
#[derive(Debug, Validate, Deserialize)]
pub struct VoteRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[serde(default = "default_vote_type")]
    pub vote_type: VoteDirection,
}

fn default_vote_type() -> VoteDirection {
    VoteDirection::Up
}

// Vote response
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VoteResponse {
    pub vote_count: i32,
    pub user_voted: Option<VoteDirection>,
}
