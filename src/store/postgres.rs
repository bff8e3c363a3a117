use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        CreditAward, CreditTransaction, FeedbackComment, FeedbackItem, ItemQuery, ItemSort,
        ItemType, PlatformStats, RankingAlgorithm, TransactionType, UserCredits, VoteDirection,
    },
    store::FeedbackStore,
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn order_clause(sort: ItemSort) -> &'static str {
    match sort {
        ItemSort::Rank => "rank_score DESC, created_at DESC, id",
        ItemSort::Votes => "vote_count DESC, created_at DESC, id",
        ItemSort::Recent => "created_at DESC, id",
    }
}

/// Appends the item filters as `$n` placeholders starting after `param_count`.
fn push_filters(sql: &mut String, query: &ItemQuery, param_count: &mut usize) {
    if query.item_type.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND item_type = ${}", param_count));
    }
    if query.status.is_some() {
        *param_count += 1;
        sql.push_str(&format!(" AND status = ${}", param_count));
    }
}

#[async_trait]
impl FeedbackStore for PgStore {
    async fn insert_item(&self, item: &FeedbackItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_items (
                id, item_type, title, description, user_id, x_handle, status,
                vote_count, rank_score, ai_feasibility_score, ai_impact_score,
                ai_clarity_score, po_notes, credits_awarded, issue_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(item.id)
        .bind(item.item_type)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.user_id)
        .bind(&item.x_handle)
        .bind(item.status)
        .bind(item.vote_count)
        .bind(item.rank_score)
        .bind(item.ai_feasibility_score)
        .bind(item.ai_impact_score)
        .bind(item.ai_clarity_score)
        .bind(&item.po_notes)
        .bind(item.credits_awarded)
        .bind(&item.issue_url)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get_item(&self, item_id: Uuid) -> Result<Option<FeedbackItem>> {
        let item = sqlx::query_as::<_, FeedbackItem>("SELECT * FROM feedback_items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?;

        Ok(item)
    }

    async fn save_item(&self, item: &FeedbackItem) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE feedback_items
            SET title = $1, description = $2, status = $3, vote_count = $4,
                rank_score = $5, ai_feasibility_score = $6, ai_impact_score = $7,
                ai_clarity_score = $8, po_notes = $9, credits_awarded = $10,
                issue_url = $11, updated_at = $12
            WHERE id = $13
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(item.status)
        .bind(item.vote_count)
        .bind(item.rank_score)
        .bind(item.ai_feasibility_score)
        .bind(item.ai_impact_score)
        .bind(item.ai_clarity_score)
        .bind(&item.po_notes)
        .bind(item.credits_awarded)
        .bind(&item.issue_url)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<bool> {
        // Votes and comments go with the item via ON DELETE CASCADE; transactions
        // keep their row with item_id nulled (ON DELETE SET NULL).
        let result = sqlx::query("DELETE FROM feedback_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, query: &ItemQuery) -> Result<Vec<FeedbackItem>> {
        let mut sql = "SELECT * FROM feedback_items WHERE TRUE".to_string();
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);

        sql.push_str(&format!(
            " ORDER BY {} LIMIT ${} OFFSET ${}",
            order_clause(query.sort),
            param_count + 1,
            param_count + 2
        ));

        let mut query_builder = sqlx::query_as::<_, FeedbackItem>(&sql);
        if let Some(item_type) = query.item_type {
            query_builder = query_builder.bind(item_type);
        }
        if let Some(status) = query.status {
            query_builder = query_builder.bind(status);
        }
        query_builder = query_builder
            .bind(query.limit as i64)
            .bind(query.offset as i64);

        Ok(query_builder.fetch_all(&self.db).await?)
    }

    async fn count_items(&self, query: &ItemQuery) -> Result<i64> {
        let mut sql = "SELECT COUNT(*) AS count FROM feedback_items WHERE TRUE".to_string();
        let mut param_count = 0;
        push_filters(&mut sql, query, &mut param_count);

        let mut query_builder = sqlx::query(&sql);
        if let Some(item_type) = query.item_type {
            query_builder = query_builder.bind(item_type);
        }
        if let Some(status) = query.status {
            query_builder = query_builder.bind(status);
        }

        let row = query_builder.fetch_one(&self.db).await?;
        Ok(row.get::<i64, _>("count"))
    }

    async fn item_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM feedback_items")
            .fetch_all(&self.db)
            .await?;

        Ok(ids)
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
        let vote = sqlx::query_scalar::<_, VoteDirection>(
            "SELECT vote_type FROM feedback_votes WHERE item_id = $1 AND user_id = $2",
        )
        .bind(item_id)
        .bind(voter_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(vote)
    }

    async fn apply_vote(
        &self,
        item: &FeedbackItem,
        voter_id: &str,
        new_state: Option<VoteDirection>,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        match new_state {
            Some(direction) => {
                sqlx::query(
                    r#"
                    INSERT INTO feedback_votes (id, item_id, user_id, vote_type, created_at)
                    VALUES ($1, $2, $3, $4, NOW())
                    ON CONFLICT (item_id, user_id)
                    DO UPDATE SET vote_type = $4
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(item.id)
                .bind(voter_id)
                .bind(direction)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM feedback_votes WHERE item_id = $1 AND user_id = $2")
                    .bind(item.id)
                    .bind(voter_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query(
            "UPDATE feedback_items SET vote_count = $1, rank_score = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(item.vote_count)
        .bind(item.rank_score)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn viewer_votes(
        &self,
        item_ids: &[Uuid],
        voter_id: &str,
    ) -> Result<HashMap<Uuid, VoteDirection>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT item_id, vote_type FROM feedback_votes WHERE item_id = ANY($1) AND user_id = $2",
        )
        .bind(item_ids)
        .bind(voter_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("item_id"), row.get("vote_type")))
            .collect())
    }

    async fn insert_comment(&self, comment: &FeedbackComment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feedback_comments (
                id, item_id, user_id, x_handle, content, is_product_owner, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(comment.item_id)
        .bind(&comment.user_id)
        .bind(&comment.x_handle)
        .bind(&comment.content)
        .bind(comment.is_product_owner)
        .bind(comment.created_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn list_comments(&self, item_id: Uuid) -> Result<Vec<FeedbackComment>> {
        let comments = sqlx::query_as::<_, FeedbackComment>(
            "SELECT * FROM feedback_comments WHERE item_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        Ok(comments)
    }

    async fn comment_counts(&self, item_ids: &[Uuid]) -> Result<HashMap<Uuid, i64>> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT item_id, COUNT(*) AS count
            FROM feedback_comments
            WHERE item_id = ANY($1)
            GROUP BY item_id
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("item_id"), row.get("count")))
            .collect())
    }

    async fn apply_credit_award(&self, award: &CreditAward) -> Result<UserCredits> {
        let transaction = &award.transaction;
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO credit_transactions (
                id, user_id, item_id, amount, transaction_type, description, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(transaction.id)
        .bind(&transaction.user_id)
        .bind(transaction.item_id)
        .bind(transaction.amount)
        .bind(transaction.transaction_type)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await?;

        let credits = sqlx::query_as::<_, UserCredits>(
            r#"
            INSERT INTO user_credits (
                id, user_id, x_handle, credits_balance, credits_earned_total,
                items_submitted, items_developed, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                credits_balance = user_credits.credits_balance + EXCLUDED.credits_balance,
                credits_earned_total = user_credits.credits_earned_total + EXCLUDED.credits_earned_total,
                items_submitted = user_credits.items_submitted + EXCLUDED.items_submitted,
                items_developed = user_credits.items_developed + EXCLUDED.items_developed,
                x_handle = COALESCE(EXCLUDED.x_handle, user_credits.x_handle),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&transaction.user_id)
        .bind(&award.x_handle)
        .bind(transaction.amount)
        .bind(award.items_submitted_delta)
        .bind(award.items_developed_delta)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(item_id) = transaction.item_id {
            sqlx::query(
                "UPDATE feedback_items SET credits_awarded = credits_awarded + $1 WHERE id = $2",
            )
            .bind(transaction.amount)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(credits)
    }

    async fn get_user_credits(&self, user_id: &str) -> Result<Option<UserCredits>> {
        let credits =
            sqlx::query_as::<_, UserCredits>("SELECT * FROM user_credits WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;

        Ok(credits)
    }

    async fn has_item_award(&self, item_id: Uuid, kind: TransactionType) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM credit_transactions
                WHERE item_id = $1 AND transaction_type = $2
            )
            "#,
        )
        .bind(item_id)
        .bind(kind)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CreditTransaction>> {
        let transactions = sqlx::query_as::<_, CreditTransaction>(
            r#"
            SELECT * FROM credit_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<UserCredits>> {
        let users = sqlx::query_as::<_, UserCredits>(
            "SELECT * FROM user_credits ORDER BY credits_earned_total DESC, user_id ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    async fn active_algorithm(&self) -> Result<Option<RankingAlgorithm>> {
        let algorithm = sqlx::query_as::<_, RankingAlgorithm>(
            "SELECT * FROM ranking_algorithms WHERE is_active = TRUE ORDER BY created_at DESC LIMIT 1",
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(algorithm)
    }

    async fn algorithm_history(&self, limit: u32) -> Result<Vec<RankingAlgorithm>> {
        let algorithms = sqlx::query_as::<_, RankingAlgorithm>(
            "SELECT * FROM ranking_algorithms ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;

        Ok(algorithms)
    }

    async fn insert_algorithm(&self, algorithm: &RankingAlgorithm) -> Result<()> {
        let mut tx = self.db.begin().await?;

        if algorithm.is_active {
            sqlx::query("UPDATE ranking_algorithms SET is_active = FALSE WHERE is_active = TRUE")
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO ranking_algorithms (
                id, version, prompt_content, weight_votes, weight_recency,
                weight_feasibility, weight_impact, weight_clarity, is_active,
                github_url, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(algorithm.id)
        .bind(&algorithm.version)
        .bind(&algorithm.prompt_content)
        .bind(algorithm.weight_votes)
        .bind(algorithm.weight_recency)
        .bind(algorithm.weight_feasibility)
        .bind(algorithm.weight_impact)
        .bind(algorithm.weight_clarity)
        .bind(algorithm.is_active)
        .bind(&algorithm.github_url)
        .bind(algorithm.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn stats(&self) -> Result<PlatformStats> {
        let items = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_items,
                COUNT(*) FILTER (WHERE item_type = 'wishlist') AS wishlist_count,
                COUNT(*) FILTER (WHERE item_type = 'bug') AS bug_count,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_count
            FROM feedback_items
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let credits = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS contributors_count,
                COALESCE(SUM(credits_earned_total), 0)::BIGINT AS total_credits_awarded
            FROM user_credits
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(PlatformStats {
            total_items: items.get("total_items"),
            wishlist_count: items.get("wishlist_count"),
            bug_count: items.get("bug_count"),
            completed_count: items.get("completed_count"),
            contributors_count: credits.get("contributors_count"),
            total_credits_awarded: credits.get("total_credits_awarded"),
        })
    }
}
