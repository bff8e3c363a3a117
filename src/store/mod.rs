//! Persistence boundary for the feedback ledger.
//!
//! The ledger owns all locking and state-transition logic; a store only has
//! to make each individual call atomic. Swap `MemoryStore` for `PgStore`
//! without touching ledger code.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        CreditAward, CreditTransaction, FeedbackComment, FeedbackItem, ItemQuery, ItemType,
        PlatformStats, RankingAlgorithm, TransactionType, UserCredits, VoteDirection,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    // Items
    async fn insert_item(&self, item: &FeedbackItem) -> Result<()>;

    async fn get_item(&self, item_id: Uuid) -> Result<Option<FeedbackItem>>;

    /// Overwrite the mutable columns of an existing item.
    async fn save_item(&self, item: &FeedbackItem) -> Result<()>;

    /// Remove an item together with its votes and comments. Returns whether it existed.
    async fn delete_item(&self, item_id: Uuid) -> Result<bool>;

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<FeedbackItem>>;

    async fn count_items(&self, query: &ItemQuery) -> Result<i64>;

    async fn item_ids(&self) -> Result<Vec<Uuid>>;

    async fn top_ranked(&self, item_type: Option<ItemType>, limit: u32)
    -> Result<Vec<FeedbackItem>>;

    // Votes
    async fn get_vote(&self, item_id: Uuid, voter_id: &str) -> Result<Option<VoteDirection>>;

    /// Persist a voter's new state and the item's recomputed counters as one unit.
    async fn apply_vote(
        &self,
        item: &FeedbackItem,
        voter_id: &str,
        new_state: Option<VoteDirection>,
    ) -> Result<()>;

    async fn viewer_votes(
        &self,
        item_ids: &[Uuid],
        voter_id: &str,
    ) -> Result<HashMap<Uuid, VoteDirection>>;

    // Comments
    async fn insert_comment(&self, comment: &FeedbackComment) -> Result<()>;

    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<FeedbackComment>>;

    async fn comment_counts(&self, item_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>>;

    // Credits
    /// Append the transaction and bump the user's counters, creating the
    /// user record on first award. Also bumps the related item's
    /// `credits_awarded` when present.
    async fn apply_credit_award(&self, award: &CreditAward) -> Result<UserCredits>;

    async fn get_user_credits(&self, user_id: &str) -> Result<Option<UserCredits>>;

    /// Whether a transaction of `kind` has ever been recorded against the item.
    async fn has_item_award(&self, item_id: Uuid, kind: TransactionType) -> Result<bool>;

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CreditTransaction>>;

    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserCredits>>;

    // Ranking algorithms
    async fn active_algorithm(&self) -> Result<Option<RankingAlgorithm>>;

    async fn algorithm_history(&self, limit: u32) -> Result<Vec<RankingAlgorithm>>;

    /// Store an algorithm; an active one deactivates every other.
    async fn insert_algorithm(&self, algorithm: &RankingAlgorithm) -> Result<()>;

    async fn stats(&self) -> Result<PlatformStats>;
}
