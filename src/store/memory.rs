use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::{cmp::Ordering, collections::HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        CreditAward, CreditTransaction, FeedbackComment, FeedbackItem, FeedbackVote, ItemQuery,
        ItemSort, ItemStatus, ItemType, PlatformStats, RankingAlgorithm, TransactionType,
        UserCredits, VoteDirection,
    },
    store::FeedbackStore,
};

/// In-process store backed by concurrent maps.
///
/// No map guard is ever held across an `.await`.
#[derive(Default)]
pub struct MemoryStore {
    items: DashMap<Uuid, FeedbackItem>,
    votes: DashMap<(Uuid, String), FeedbackVote>,
    comments: DashMap<Uuid, Vec<FeedbackComment>>,
    credits: DashMap<String, UserCredits>,
    transactions: RwLock<Vec<CreditTransaction>>,
    algorithms: RwLock<Vec<RankingAlgorithm>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(query: &ItemQuery, item: &FeedbackItem) -> bool {
        query.item_type.is_none_or(|t| item.item_type == t)
            && query.status.is_none_or(|s| item.status == s)
    }
}

/// Listing order; ties fall back to newest first, then id, so pages are stable.
pub(crate) fn compare_items(sort: ItemSort, a: &FeedbackItem, b: &FeedbackItem) -> Ordering {
    let primary = match sort {
        ItemSort::Rank => b.rank_score.total_cmp(&a.rank_score),
        ItemSort::Votes => b.vote_count.cmp(&a.vote_count),
        ItemSort::Recent => Ordering::Equal,
    };

    primary
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert_item(&self, item: &FeedbackItem) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(AppError::Conflict(format!("Item {} already exists", item.id)));
        }
        self.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<FeedbackItem>> {
        Ok(self.items.get(&item_id).map(|entry| entry.clone()))
    }

    async fn save_item(&self, item: &FeedbackItem) -> Result<()> {
        let mut entry = self
            .items
            .get_mut(&item.id)
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
        *entry = item.clone();
        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<bool> {
        let existed = self.items.remove(&item_id).is_some();
        if existed {
            self.votes.retain(|(vote_item, _), _| *vote_item != item_id);
            self.comments.remove(&item_id);
            // The audit trail outlives the item.
            self.transactions
                .write()
                .await
                .iter_mut()
                .filter(|transaction| transaction.item_id == Some(item_id))
                .for_each(|transaction| transaction.item_id = None);
        }
        Ok(existed)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<FeedbackItem>> {
        let mut items: Vec<FeedbackItem> = self
            .items
            .iter()
            .filter(|entry| Self::matches(query, entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        items.sort_by(|a, b| compare_items(query.sort, a, b));

        Ok(items
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count_items(&self, query: &ItemQuery) -> Result<i64> {
        Ok(self
            .items
            .iter()
            .filter(|entry| Self::matches(query, entry.value()))
            .count() as i64)
    }

    async fn item_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.items.iter().map(|entry| *entry.key()).collect())
    }

    async fn top_ranked(
        &self,
        item_type: Option<ItemType>,
        limit: u32,
    ) -> Result<Vec<FeedbackItem>> {
        let query = ItemQuery {
            item_type,
            limit,
            ..ItemQuery::default()
        };
        self.list_items(&query).await
    }

    async fn get_vote(&self, item_id: Uuid, voter_id: &str) -> Result<Option<VoteDirection>> {
        Ok(self
            .votes
            .get(&(item_id, voter_id.to_string()))
            .map(|vote| vote.vote_type))
    }

    async fn apply_vote(
        &self,
        item: &FeedbackItem,
        voter_id: &str,
        new_state: Option<VoteDirection>,
    ) -> Result<()> {
        // Holding the item entry keeps readers from seeing the vote row and the
        // counter out of step. Lock order is always items -> votes.
        let mut entry = self
            .items
            .get_mut(&item.id)
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        let key = (item.id, voter_id.to_string());
        match new_state {
            Some(direction) => {
                self.votes
                    .entry(key)
                    .and_modify(|vote| vote.vote_type = direction)
                    .or_insert_with(|| FeedbackVote {
                        id: Uuid::new_v4(),
                        item_id: item.id,
                        user_id: voter_id.to_string(),
                        vote_type: direction,
                        created_at: Utc::now(),
                    });
            }
            None => {
                self.votes.remove(&key);
            }
        }

        *entry = item.clone();
        Ok(())
    }

    async fn viewer_votes(
        &self,
        item_ids: &[Uuid],
        voter_id: &str,
    ) -> Result<HashMap<Uuid, VoteDirection>> {
        Ok(item_ids
            .iter()
            .filter_map(|item_id| {
                self.votes
                    .get(&(*item_id, voter_id.to_string()))
                    .map(|vote| (*item_id, vote.vote_type))
            })
            .collect())
    }

    async fn insert_comment(&self, comment: &FeedbackComment) -> Result<()> {
        self.comments
            .entry(comment.item_id)
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<FeedbackComment>> {
        let mut comments = self
            .comments
            .get(&item_id)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        comments.sort_by_key(|comment| (comment.created_at, comment.id));
        Ok(comments)
    }

    async fn comment_counts(&self, item_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        Ok(item_ids
            .iter()
            .filter_map(|item_id| {
                self.comments
                    .get(item_id)
                    .map(|comments| (*item_id, comments.len() as i64))
            })
            .collect())
    }

    async fn apply_credit_award(&self, award: &CreditAward) -> Result<UserCredits> {
        let now = Utc::now();
        let amount = award.amount();

        let credits = {
            let mut entry = self
                .credits
                .entry(award.user_id().to_string())
                .or_insert_with(|| UserCredits {
                    id: Uuid::new_v4(),
                    user_id: award.user_id().to_string(),
                    x_handle: None,
                    credits_balance: 0,
                    credits_earned_total: 0,
                    items_submitted: 0,
                    items_developed: 0,
                    created_at: now,
                    updated_at: now,
                });

            entry.credits_balance += amount;
            entry.credits_earned_total += amount;
            entry.items_submitted += award.items_submitted_delta;
            entry.items_developed += award.items_developed_delta;
            if award.x_handle.is_some() {
                entry.x_handle = award.x_handle.clone();
            }
            entry.updated_at = now;
            entry.clone()
        };

        if let Some(item_id) = award.transaction.item_id {
            if let Some(mut item) = self.items.get_mut(&item_id) {
                item.credits_awarded += amount;
            }
        }

        self.transactions
            .write()
            .await
            .push(award.transaction.clone());

        Ok(credits)
    }

    async fn get_user_credits(&self, user_id: &str) -> Result<Option<UserCredits>> {
        Ok(self.credits.get(user_id).map(|entry| entry.clone()))
    }

    async fn has_item_award(&self, item_id: Uuid, kind: TransactionType) -> Result<bool> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().any(|transaction| {
            transaction.item_id == Some(item_id) && transaction.transaction_type == kind
        }))
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CreditTransaction>> {
        let mut transactions: Vec<CreditTransaction> = self
            .transactions
            .read()
            .await
            .iter()
            .filter(|transaction| transaction.user_id == user_id)
            .cloned()
            .collect();

        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(transactions
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserCredits>> {
        let mut users: Vec<UserCredits> =
            self.credits.iter().map(|entry| entry.value().clone()).collect();

        users.sort_by(|a, b| {
            b.credits_earned_total
                .cmp(&a.credits_earned_total)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn active_algorithm(&self) -> Result<Option<RankingAlgorithm>> {
        let algorithms = self.algorithms.read().await;
        Ok(algorithms.iter().rev().find(|a| a.is_active).cloned())
    }

    async fn algorithm_history(&self, limit: u32) -> Result<Vec<RankingAlgorithm>> {
        let algorithms = self.algorithms.read().await;
        let mut history: Vec<RankingAlgorithm> = algorithms.iter().cloned().collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn insert_algorithm(&self, algorithm: &RankingAlgorithm) -> Result<()> {
        let mut algorithms = self.algorithms.write().await;
        if algorithm.is_active {
            for existing in algorithms.iter_mut() {
                existing.is_active = false;
            }
        }
        algorithms.push(algorithm.clone());
        Ok(())
    }

    async fn stats(&self) -> Result<PlatformStats> {
        let mut stats = PlatformStats::default();

        for entry in self.items.iter() {
            stats.total_items += 1;
            match entry.item_type {
                ItemType::Wishlist => stats.wishlist_count += 1,
                ItemType::Bug => stats.bug_count += 1,
            }
            if entry.status == ItemStatus::Completed {
                stats.completed_count += 1;
            }
        }

        for entry in self.credits.iter() {
            stats.contributors_count += 1;
            stats.total_credits_awarded += entry.credits_earned_total as i64;
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use chrono::{DateTime, Duration};

    fn item(title: &str, created_at: DateTime<Utc>) -> FeedbackItem {
        FeedbackItem {
            id: Uuid::new_v4(),
            item_type: ItemType::Wishlist,
            title: title.to_string(),
            description: "A reasonably long description for testing".to_string(),
            user_id: "owner".to_string(),
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
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn delete_cascades_votes_and_comments() {
        let store = MemoryStore::new();
        let mut target = item("Target", Utc::now());
        let other = item("Other", Utc::now());
        store.insert_item(&target).await.unwrap();
        store.insert_item(&other).await.unwrap();

        target.vote_count = 1;
        store
            .apply_vote(&target, "voter", Some(VoteDirection::Up))
            .await
            .unwrap();
        store
            .apply_vote(&other, "voter", Some(VoteDirection::Down))
            .await
            .unwrap();
        store
            .insert_comment(&FeedbackComment {
                id: Uuid::new_v4(),
                item_id: target.id,
                user_id: "voter".to_string(),
                x_handle: None,
                content: "+1".to_string(),
                is_product_owner: false,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        assert!(store.delete_item(target.id).await.unwrap());
        assert!(!store.delete_item(target.id).await.unwrap());

        assert!(store.get_item(target.id).await.unwrap().is_none());
        assert_eq!(store.get_vote(target.id, "voter").await.unwrap(), None);
        assert!(store.list_comments(target.id).await.unwrap().is_empty());
        assert_eq!(
            store.get_vote(other.id, "voter").await.unwrap(),
            Some(VoteDirection::Down)
        );
    }

    #[tokio::test]
    async fn delete_keeps_transactions_but_drops_the_item_link() {
        let store = MemoryStore::new();
        let target = item("Target", Utc::now());
        store.insert_item(&target).await.unwrap();
        store
            .apply_credit_award(&CreditAward::new(
                "owner",
                Some(target.id),
                10,
                TransactionType::Submission,
                "Submitted: Target",
            ))
            .await
            .unwrap();
        assert!(
            store
                .has_item_award(target.id, TransactionType::Submission)
                .await
                .unwrap()
        );

        store.delete_item(target.id).await.unwrap();

        let history = store.list_transactions("owner", 10, 0).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].item_id, None);
        assert_eq!(history[0].amount, 10);
        assert!(
            !store
                .has_item_award(target.id, TransactionType::Submission)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn transaction_ties_break_on_id() {
        let store = MemoryStore::new();
        let at = Utc::now();
        let mut awards: Vec<CreditAward> = (0..4)
            .map(|n| CreditAward::new("owner", None, n + 1, TransactionType::Bonus, "Tie"))
            .collect();
        for award in &mut awards {
            award.transaction.created_at = at;
            store.apply_credit_award(award).await.unwrap();
        }

        let mut expected: Vec<Uuid> = awards.iter().map(|a| a.transaction.id).collect();
        expected.sort_by(|a, b| b.cmp(a));
        let listed: Vec<Uuid> = store
            .list_transactions("owner", 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(listed, expected);
    }

    #[tokio::test]
    async fn list_sorts_and_pages() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut old = item("Old", now - Duration::days(3));
        old.rank_score = 4.0;
        old.vote_count = 1;
        let mut new = item("New", now);
        new.rank_score = 2.0;
        new.vote_count = 5;
        let mut bug = item("Bug", now - Duration::days(1));
        bug.item_type = ItemType::Bug;
        bug.rank_score = 3.0;
        for i in [&old, &new, &bug] {
            store.insert_item(i).await.unwrap();
        }

        let titles = |items: Vec<FeedbackItem>| -> Vec<String> {
            items.into_iter().map(|i| i.title).collect()
        };

        let by_rank = store.list_items(&ItemQuery::default()).await.unwrap();
        assert_eq!(titles(by_rank), ["Old", "Bug", "New"]);

        let by_votes = store
            .list_items(&ItemQuery {
                sort: ItemSort::Votes,
                ..ItemQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(by_votes), ["New", "Old", "Bug"]);

        let recent_page = store
            .list_items(&ItemQuery {
                sort: ItemSort::Recent,
                limit: 1,
                offset: 1,
                ..ItemQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(titles(recent_page), ["Bug"]);

        let bugs = ItemQuery {
            item_type: Some(ItemType::Bug),
            ..ItemQuery::default()
        };
        assert_eq!(store.count_items(&bugs).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_latest_active_algorithm_stays_active() {
        let store = MemoryStore::new();
        let first = RankingAlgorithm::default_active();
        let mut second = RankingAlgorithm::default_active();
        second.version = "v2.0.0".to_string();
        second.created_at = first.created_at + Duration::seconds(1);

        store.insert_algorithm(&first).await.unwrap();
        store.insert_algorithm(&second).await.unwrap();

        let active = store.active_algorithm().await.unwrap().unwrap();
        assert_eq!(active.version, "v2.0.0");

        let history = store.algorithm_history(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version, "v2.0.0");
        assert!(!history[1].is_active);
    }

    #[tokio::test]
    async fn award_tracks_item_credits_and_stats() {
        let store = MemoryStore::new();
        let target = item("Target", Utc::now());
        store.insert_item(&target).await.unwrap();

        let award = CreditAward::new(
            "owner",
            Some(target.id),
            500,
            TransactionType::Developed,
            "Shipped",
        );
        let credits = store.apply_credit_award(&award).await.unwrap();

        assert_eq!(credits.items_developed, 1);
        assert_eq!(store.get_item(target.id).await.unwrap().unwrap().credits_awarded, 500);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.contributors_count, 1);
        assert_eq!(stats.total_credits_awarded, 500);
    }
}
