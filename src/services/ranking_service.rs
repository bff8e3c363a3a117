//! Rank score calculation.
//!
//! `score = votes*W_v + recency*W_r + feasibility*W_f + impact*W_i + clarity*W_c`
//! where absent AI dimensions contribute nothing and recency decays by 0.1 per
//! elapsed week, bottoming out at 0 after 70 days.

use chrono::{DateTime, Utc};

use crate::models::{FeedbackItem, RankingWeights};

const RECENCY_DECAY_PER_WEEK: f64 = 0.1;

/// Whole days elapsed since `created_at`. Negative when the timestamp is in the future.
pub fn days_old(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - created_at).num_days()
}

pub fn recency_factor(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = days_old(created_at, now).max(0) as f64;
    (1.0 - days * RECENCY_DECAY_PER_WEEK / 7.0).max(0.0)
}

pub fn calculate_rank_score(
    item: &FeedbackItem,
    weights: &RankingWeights,
    now: DateTime<Utc>,
) -> f64 {
    let ai = item.ai_scores();

    item.vote_count as f64 * weights.votes
        + recency_factor(item.created_at, now) * weights.recency
        + ai.feasibility.unwrap_or(0.0) * weights.feasibility
        + ai.impact.unwrap_or(0.0) * weights.impact
        + ai.clarity.unwrap_or(0.0) * weights.clarity
}
