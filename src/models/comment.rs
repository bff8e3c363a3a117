use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackComment {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: String,
    pub x_handle: Option<String>,
    pub content: String,
    pub is_product_owner: bool,
    pub created_at: DateTime<Utc>,
}

// Create comment request
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(max = 50))]
    pub x_handle: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub is_product_owner: bool,
}
