//! The feedback ledger: every state change to items, votes, comments and
//! credits goes through here.
//!
//! Locking discipline:
//! - one async mutex per item and one per user (see [`KeyedLocks`]);
//! - when both are needed the item lock is taken first;
//! - collaborator calls (AI scoring, issue tracking) happen with no lock held.

use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::{
    config::CreditPolicy,
    error::{AppError, Result},
    models::{
        AiScores, CreateCommentRequest, CreateFeedbackRequest, CreditAward, CreditTransaction,
        FeedbackComment, FeedbackItem, FeedbackItemResponse, ItemQuery, ItemStatus, ItemType,
        PlatformStats, RankingAlgorithm, TransactionType, UpdateFeedbackRequest, UserCredits,
        VoteDirection, VoteResponse,
    },
    services::{
        ai_scoring_service::{AiScorer, ScoringRequest},
        issue_service::{IssueRequest, IssueTracker},
        locks::KeyedLocks,
        ranking_service::calculate_rank_score,
        vote_service::transition,
    },
    store::FeedbackStore,
};

pub struct FeedbackLedger {
    store: Arc<dyn FeedbackStore>,
    ai_scorer: Arc<dyn AiScorer>,
    issue_tracker: Arc<dyn IssueTracker>,
    credits: CreditPolicy,
    item_locks: KeyedLocks<Uuid>,
    user_locks: KeyedLocks<String>,
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found".to_string())
}

impl FeedbackLedger {
    pub fn new(
        store: Arc<dyn FeedbackStore>,
        ai_scorer: Arc<dyn AiScorer>,
        issue_tracker: Arc<dyn IssueTracker>,
        credits: CreditPolicy,
    ) -> Self {
        Self {
            store,
            ai_scorer,
            issue_tracker,
            credits,
            item_locks: KeyedLocks::new(),
            user_locks: KeyedLocks::new(),
        }
    }

    /// Seed the default ranking algorithm when none is active yet.
    pub async fn ensure_default_algorithm(&self) -> Result<()> {
        if self.store.active_algorithm().await?.is_none() {
            let algorithm = RankingAlgorithm::default_active();
            self.store.insert_algorithm(&algorithm).await?;
            tracing::info!("Seeded default ranking algorithm {}", algorithm.version);
        }
        Ok(())
    }

    /// Active algorithm, falling back to the built-in defaults.
    async fn current_algorithm(&self) -> Result<RankingAlgorithm> {
        Ok(self
            .store
            .active_algorithm()
            .await?
            .unwrap_or_else(RankingAlgorithm::default_active))
    }

    async fn decorate(
        &self,
        items: Vec<FeedbackItem>,
        viewer_id: Option<&str>,
    ) -> Result<Vec<FeedbackItemResponse>> {
        let item_ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
        let comment_counts = self.store.comment_counts(&item_ids).await?;
        let viewer_votes = match viewer_id {
            Some(viewer_id) => self.store.viewer_votes(&item_ids, viewer_id).await?,
            None => HashMap::new(),
        };

        Ok(items
            .into_iter()
            .map(|item| FeedbackItemResponse {
                comment_count: comment_counts.get(&item.id).copied().unwrap_or(0),
                user_voted: viewer_votes.get(&item.id).copied(),
                item,
            })
            .collect())
    }

    async fn decorate_one(
        &self,
        item: FeedbackItem,
        viewer_id: Option<&str>,
    ) -> Result<FeedbackItemResponse> {
        self.decorate(vec![item], viewer_id)
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Failed to decorate item".to_string()))
    }

    // ---------------------------------------------------------------------
    // Items
    // ---------------------------------------------------------------------

    pub async fn create_item(&self, request: &CreateFeedbackRequest) -> Result<FeedbackItemResponse> {
        let algorithm = self.current_algorithm().await?;

        let scoring_request = ScoringRequest {
            item_type: request.item_type.as_str().to_string(),
            title: request.title.clone(),
            description: request.description.clone(),
            algorithm_prompt: algorithm.prompt_content.clone(),
        };
        let (ai_scores, issue_url) = tokio::join!(
            self.ai_scores_for(&scoring_request),
            self.issue_for(request)
        );

        let now = Utc::now();
        let mut item = FeedbackItem {
            id: Uuid::new_v4(),
            item_type: request.item_type,
            title: request.title.clone(),
            description: request.description.clone(),
            user_id: request.user_id.clone(),
            x_handle: request.x_handle.clone(),
            status: ItemStatus::New,
            vote_count: 0,
            rank_score: 0.0,
            ai_feasibility_score: None,
            ai_impact_score: None,
            ai_clarity_score: None,
            po_notes: None,
            credits_awarded: 0,
            issue_url,
            created_at: now,
            updated_at: now,
        };
        item.set_ai_scores(ai_scores);
        item.rank_score = calculate_rank_score(&item, &algorithm.weights(), now);

        self.store.insert_item(&item).await?;
        tracing::info!(
            "Created {:?} item {} for {} (rank {:.3})",
            item.item_type,
            item.id,
            item.user_id,
            item.rank_score
        );

        let amount = match item.item_type {
            ItemType::Wishlist => self.credits.submission,
            ItemType::Bug => self.credits.bug_submission,
        };
        if amount > 0 {
            let title_excerpt: String = item.title.chars().take(50).collect();
            let mut award = CreditAward::new(
                &item.user_id,
                Some(item.id),
                amount,
                TransactionType::Submission,
                format!("Submitted: {}", title_excerpt),
            );
            award.x_handle = item.x_handle.clone();
            award.items_submitted_delta = 1;
            self.apply_award(award).await?;
        }

        let item = self.store.get_item(item.id).await?.unwrap_or(item);
        Ok(FeedbackItemResponse {
            item,
            comment_count: 0,
            user_voted: None,
        })
    }

    async fn ai_scores_for(&self, request: &ScoringRequest) -> AiScores {
        match self.ai_scorer.score(request).await {
            Ok(scores) => scores.clamped(),
            Err(e) => {
                tracing::warn!("AI scoring skipped for '{}': {}", request.title, e);
                AiScores::default()
            }
        }
    }

    async fn issue_for(&self, request: &CreateFeedbackRequest) -> Option<String> {
        if request.item_type != ItemType::Bug {
            return None;
        }

        let issue = IssueRequest {
            title: format!("[Bug] {}", request.title),
            body: format!(
                "{}\n\n---\nReported by {}",
                request.description,
                request.x_handle.as_deref().unwrap_or(&request.user_id)
            ),
            labels: vec!["bug".to_string(), "user-reported".to_string()],
        };

        match self.issue_tracker.create_issue(&issue).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Issue creation skipped for '{}': {}", request.title, e);
                None
            }
        }
    }

    pub async fn get_item(
        &self,
        item_id: Uuid,
        viewer_id: Option<&str>,
    ) -> Result<FeedbackItemResponse> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(item_not_found)?;

        self.decorate_one(item, viewer_id).await
    }

    /// A page of items plus the total matching the filter.
    pub async fn list_items(
        &self,
        query: &ItemQuery,
        viewer_id: Option<&str>,
    ) -> Result<(Vec<FeedbackItemResponse>, i64)> {
        let items = self.store.list_items(query).await?;
        let total = self.store.count_items(query).await?;

        Ok((self.decorate(items, viewer_id).await?, total))
    }

    pub async fn ranked_results(
        &self,
        item_type: Option<ItemType>,
        limit: u32,
    ) -> Result<Vec<FeedbackItemResponse>> {
        let items = self.store.top_ranked(item_type, limit).await?;
        self.decorate(items, None).await
    }

    pub async fn update_item(
        &self,
        item_id: Uuid,
        requester_id: &str,
        update: &UpdateFeedbackRequest,
    ) -> Result<FeedbackItemResponse> {
        let (item, rewarded) = {
            let _guard = self.item_locks.lock(&item_id).await;

            let mut item = self
                .store
                .get_item(item_id)
                .await?
                .ok_or_else(item_not_found)?;

            if item.user_id != requester_id {
                return Err(AppError::Forbidden("Not authorized".to_string()));
            }

            if let Some(title) = &update.title {
                item.title = title.clone();
            }
            if let Some(description) = &update.description {
                item.description = description.clone();
            }
            if let Some(status) = update.status {
                item.status = status;
            }
            if let Some(po_notes) = &update.po_notes {
                item.po_notes = Some(po_notes.clone());
            }
            item.updated_at = Utc::now();

            self.store.save_item(&item).await?;

            let rewarded = if item.status == ItemStatus::Completed {
                self.award_completion(&item).await?
            } else {
                false
            };
            (item, rewarded)
        };

        tracing::info!("Item {} updated by {}", item_id, requester_id);

        let item = if rewarded {
            self.store.get_item(item_id).await?.unwrap_or(item)
        } else {
            item
        };

        self.decorate_one(item, Some(requester_id)).await
    }

    /// Submitter reward for a completed item, paid at most once per item no
    /// matter how often its status moves back and forth. Caller holds the item
    /// lock. A zero policy amount pays nothing.
    async fn award_completion(&self, item: &FeedbackItem) -> Result<bool> {
        let (amount, kind) = match item.item_type {
            ItemType::Wishlist => (self.credits.developed, TransactionType::Developed),
            ItemType::Bug => (self.credits.bug_verified, TransactionType::BugVerified),
        };
        if amount <= 0 || self.store.has_item_award(item.id, kind).await? {
            return Ok(false);
        }

        let title_excerpt: String = item.title.chars().take(50).collect();
        let award = CreditAward::new(
            &item.user_id,
            Some(item.id),
            amount,
            kind,
            format!("Completed: {}", title_excerpt),
        );
        self.record_award(&award).await?;

        Ok(true)
    }

    pub async fn delete_item(&self, item_id: Uuid, requester_id: &str) -> Result<()> {
        let _guard = self.item_locks.lock(&item_id).await;

        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(item_not_found)?;

        if item.user_id != requester_id {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        if !self.store.delete_item(item_id).await? {
            return Err(item_not_found());
        }

        tracing::info!("Item {} deleted by {}", item_id, requester_id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Votes
    // ---------------------------------------------------------------------

    pub async fn vote(
        &self,
        item_id: Uuid,
        voter_id: &str,
        direction: VoteDirection,
    ) -> Result<VoteResponse> {
        let weights = self.current_algorithm().await?.weights();

        let _guard = self.item_locks.lock(&item_id).await;

        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(item_not_found)?;
        let current = self.store.get_vote(item_id, voter_id).await?;
        let step = transition(current, direction);

        let now = Utc::now();
        item.vote_count += step.delta;
        item.rank_score = calculate_rank_score(&item, &weights, now);
        item.updated_at = now;

        self.store.apply_vote(&item, voter_id, step.new_state).await?;

        tracing::debug!(
            "Vote {:?} by {} on {}: {:?} -> {:?} (count {})",
            direction,
            voter_id,
            item_id,
            current,
            step.new_state,
            item.vote_count
        );

        Ok(VoteResponse {
            vote_count: item.vote_count,
            user_voted: step.new_state,
        })
    }

    // ---------------------------------------------------------------------
    // Comments
    // ---------------------------------------------------------------------

    pub async fn add_comment(
        &self,
        item_id: Uuid,
        request: &CreateCommentRequest,
    ) -> Result<FeedbackComment> {
        if request.content.trim().is_empty() {
            return Err(AppError::Validation(
                "content: Comment must not be empty".to_string(),
            ));
        }

        let _guard = self.item_locks.lock(&item_id).await;

        if self.store.get_item(item_id).await?.is_none() {
            return Err(item_not_found());
        }

        let comment = FeedbackComment {
            id: Uuid::new_v4(),
            item_id,
            user_id: request.user_id.clone(),
            x_handle: request.x_handle.clone(),
            content: request.content.clone(),
            is_product_owner: request.is_product_owner,
            created_at: Utc::now(),
        };
        self.store.insert_comment(&comment).await?;

        Ok(comment)
    }

    pub async fn list_comments(&self, item_id: Uuid) -> Result<Vec<FeedbackComment>> {
        if self.store.get_item(item_id).await?.is_none() {
            return Err(item_not_found());
        }

        self.store.list_comments(item_id).await
    }

    // ---------------------------------------------------------------------
    // Credits
    // ---------------------------------------------------------------------

    /// Record an award. No deduplication: callers guard against double awards.
    pub async fn award_credits(
        &self,
        user_id: &str,
        item_id: Option<Uuid>,
        amount: i32,
        kind: TransactionType,
        description: &str,
    ) -> Result<UserCredits> {
        self.apply_award(CreditAward::new(user_id, item_id, amount, kind, description))
            .await
    }

    async fn apply_award(&self, award: CreditAward) -> Result<UserCredits> {
        if award.amount() <= 0 {
            return Err(AppError::Validation(
                "amount: Credit awards must be positive".to_string(),
            ));
        }

        let _item_guard = match award.transaction.item_id {
            Some(item_id) => {
                let guard = self.item_locks.lock(&item_id).await;
                if self.store.get_item(item_id).await?.is_none() {
                    return Err(item_not_found());
                }
                Some(guard)
            }
            None => None,
        };

        self.record_award(&award).await
    }

    /// Takes the user lock and writes the award. When the award names an
    /// item the caller already holds that item's lock.
    async fn record_award(&self, award: &CreditAward) -> Result<UserCredits> {
        let _user_guard = self.user_locks.lock(&award.user_id().to_string()).await;

        let credits = self.store.apply_credit_award(award).await?;

        tracing::info!(
            "Awarded {} credits ({:?}) to {}; balance {}",
            award.amount(),
            award.transaction.transaction_type,
            award.user_id(),
            credits.credits_balance
        );

        Ok(credits)
    }

    pub async fn get_balance(&self, user_id: &str) -> Result<UserCredits> {
        self.store
            .get_user_credits(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn credit_history(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CreditTransaction>> {
        self.store.list_transactions(user_id, limit, offset).await
    }

    pub async fn leaderboard(&self, limit: u32) -> Result<Vec<UserCredits>> {
        self.store.leaderboard(limit).await
    }

    // ---------------------------------------------------------------------
    // Ranking
    // ---------------------------------------------------------------------

    /// Recompute every item's rank score, one item lock at a time.
    /// Returns the number of items processed.
    pub async fn rerank_all(&self) -> Result<usize> {
        let weights = self.current_algorithm().await?.weights();
        let item_ids = self.store.item_ids().await?;
        let mut processed = 0;

        for item_id in item_ids {
            let _guard = self.item_locks.lock(&item_id).await;

            // Deleted since the id snapshot was taken.
            let Some(mut item) = self.store.get_item(item_id).await? else {
                continue;
            };

            item.rank_score = calculate_rank_score(&item, &weights, Utc::now());
            self.store.save_item(&item).await?;
            processed += 1;
        }

        tracing::info!("Re-ranked {} items", processed);
        Ok(processed)
    }

    /// Ask the AI collaborator for fresh scores. When it is unavailable the
    /// item keeps whatever scores it already had.
    pub async fn rescore_item(&self, item_id: Uuid) -> Result<FeedbackItemResponse> {
        let algorithm = self.current_algorithm().await?;
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or_else(item_not_found)?;

        let request = ScoringRequest {
            item_type: item.item_type.as_str().to_string(),
            title: item.title.clone(),
            description: item.description.clone(),
            algorithm_prompt: algorithm.prompt_content.clone(),
        };

        let scores = match self.ai_scorer.score(&request).await {
            Ok(scores) => scores.clamped(),
            Err(e) => {
                tracing::warn!("Rescore of {} skipped: {}", item_id, e);
                return self.decorate_one(item, None).await;
            }
        };

        let item = {
            let _guard = self.item_locks.lock(&item_id).await;

            let mut item = self
                .store
                .get_item(item_id)
                .await?
                .ok_or_else(item_not_found)?;

            let now = Utc::now();
            item.set_ai_scores(scores);
            item.rank_score = calculate_rank_score(&item, &algorithm.weights(), now);
            item.updated_at = now;
            self.store.save_item(&item).await?;
            item
        };

        self.decorate_one(item, None).await
    }

    pub async fn active_algorithm(&self) -> Result<RankingAlgorithm> {
        self.store
            .active_algorithm()
            .await?
            .ok_or_else(|| AppError::NotFound("No active algorithm found".to_string()))
    }

    pub async fn algorithm_history(&self, limit: u32) -> Result<Vec<RankingAlgorithm>> {
        self.store.algorithm_history(limit).await
    }

    pub async fn stats(&self) -> Result<PlatformStats> {
        self.store.stats().await
    }
}
