use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "credit_transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Submission,
    TopRanked,
    Developed,
    Bonus,
    BugVerified,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCredits {
    pub id: Uuid,
    pub user_id: String,
    pub x_handle: Option<String>,
    pub credits_balance: i32,
    pub credits_earned_total: i32,
    pub items_submitted: i32,
    pub items_developed: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub item_id: Option<Uuid>,
    pub amount: i32,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One award as the store applies it: the audit record plus the counter
/// bumps that go with it.
#[derive(Debug, Clone)]
pub struct CreditAward {
    pub transaction: CreditTransaction,
    pub x_handle: Option<String>,
    pub items_submitted_delta: i32,
    pub items_developed_delta: i32,
}

impl CreditAward {
    pub fn new(
        user_id: &str,
        item_id: Option<Uuid>,
        amount: i32,
        transaction_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction: CreditTransaction {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                item_id,
                amount,
                transaction_type,
                description: Some(description.into()),
                created_at: Utc::now(),
            },
            x_handle: None,
            items_submitted_delta: 0,
            items_developed_delta: if transaction_type == TransactionType::Developed {
                1
            } else {
                0
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.transaction.user_id
    }

    pub fn amount(&self) -> i32 {
        self.transaction.amount
    }
}
