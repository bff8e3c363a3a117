use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{AiScores, VoteDirection, timestamp};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Wishlist,
    Bug,
}

impl ItemType {
    /// Wire and database name.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Wishlist => "wishlist",
            ItemType::Bug => "bug",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    New,
    UnderReview,
    Planned,
    InProgress,
    Completed,
    WontDo,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackItem {
    pub id: Uuid,
    pub item_type: ItemType,
    pub title: String,
    pub description: String,
    pub user_id: String,
    pub x_handle: Option<String>,
    pub status: ItemStatus,
    pub vote_count: i32,
    pub rank_score: f64,
    pub ai_feasibility_score: Option<f64>,
    pub ai_impact_score: Option<f64>,
    pub ai_clarity_score: Option<f64>,
    pub po_notes: Option<String>,
    pub credits_awarded: i32,
    pub issue_url: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

impl FeedbackItem {
    pub fn ai_scores(&self) -> AiScores {
        AiScores {
            feasibility: self.ai_feasibility_score,
            impact: self.ai_impact_score,
            clarity: self.ai_clarity_score,
        }
    }

    pub fn set_ai_scores(&mut self, scores: AiScores) {
        self.ai_feasibility_score = scores.feasibility;
        self.ai_impact_score = scores.impact;
        self.ai_clarity_score = scores.clarity;
    }
}

// Create item request
#[derive(Debug, Clone, Validate, Deserialize)]
pub struct CreateFeedbackRequest {
    pub item_type: ItemType,
    #[validate(length(min = 5, max = 200))]
    pub title: String,
    #[validate(length(min = 20))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(max = 50))]
    pub x_handle: Option<String>,
}

// Update item request (owner only)
#[derive(Debug, Clone, Default, Validate, Deserialize)]
pub struct UpdateFeedbackRequest {
    #[validate(length(min = 5, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 20))]
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub po_notes: Option<String>,
}

/// Item snapshot decorated for a specific viewer.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackItemResponse {
    #[serde(flatten)]
    pub item: FeedbackItem,
    pub comment_count: i64,
    pub user_voted: Option<VoteDirection>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemSort {
    #[default]
    Rank,
    Votes,
    Recent,
}

/// Filter, ordering and page for item listings.
#[derive(Debug, Clone)]
pub struct ItemQuery {
    pub item_type: Option<ItemType>,
    pub status: Option<ItemStatus>,
    pub sort: ItemSort,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            item_type: None,
            status: None,
            sort: ItemSort::Rank,
            limit: 50,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PlatformStats {
    pub total_items: i64,
    pub wishlist_count: i64,
    pub bug_count: i64,
    pub completed_count: i64,
    pub contributors_count: i64,
    pub total_credits_awarded: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_deserializes_offset_less_timestamps_as_utc() {
        let item: FeedbackItem = serde_json::from_value(json!({
            "id": "7f2c2a59-3c3a-4d0a-9a4f-0b6a1c0e2d11",
            "item_type": "bug",
            "title": "Crash on login",
            "description": "The app crashes every time I log in with SSO",
            "user_id": "user-1",
            "x_handle": null,
            "status": "under_review",
            "vote_count": 3,
            "rank_score": 3.5,
            "ai_feasibility_score": null,
            "ai_impact_score": 0.5,
            "ai_clarity_score": null,
            "po_notes": null,
            "credits_awarded": 10,
            "issue_url": null,
            "created_at": "2025-01-15T10:30:00",
            "updated_at": "2025-01-15T10:30:00Z"
        }))
        .unwrap();

        assert_eq!(item.status, ItemStatus::UnderReview);
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(item.ai_scores().impact, Some(0.5));
    }

    #[test]
    fn response_flattens_item_fields() {
        let now = Utc::now();
        let response = FeedbackItemResponse {
            item: FeedbackItem {
                id: Uuid::new_v4(),
                item_type: ItemType::Wishlist,
                title: "Dark mode".to_string(),
                description: "Please add a dark mode to the dashboard".to_string(),
                user_id: "u".to_string(),
                x_handle: None,
                status: ItemStatus::New,
                vote_count: 0,
                rank_score: 0.5,
                ai_feasibility_score: None,
                ai_impact_score: None,
                ai_clarity_score: None,
                po_notes: None,
                credits_awarded: 0,
                issue_url: None,
                created_at: now,
                updated_at: now,
            },
            comment_count: 2,
            user_voted: Some(VoteDirection::Up),
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["title"], "Dark mode");
        assert_eq!(value["item_type"], "wishlist");
        assert_eq!(value["comment_count"], 2);
        assert_eq!(value["user_voted"], "up");
    }

    #[test]
    fn item_type_name_matches_serde() {
        for item_type in [ItemType::Wishlist, ItemType::Bug] {
            assert_eq!(serde_json::to_value(item_type).unwrap(), item_type.as_str());
        }
    }
}
