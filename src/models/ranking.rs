use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Weights consulted by the score calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingWeights {
    pub votes: f64,
    pub recency: f64,
    pub feasibility: f64,
    pub impact: f64,
    pub clarity: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            votes: 1.0,
            recency: 0.5,
            feasibility: 0.3,
            impact: 0.4,
            clarity: 0.2,
        }
    }
}

/// AI-assessed dimensions, each in [0, 1] when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AiScores {
    pub feasibility: Option<f64>,
    pub impact: Option<f64>,
    pub clarity: Option<f64>,
}

impl AiScores {
    /// Clamp each dimension into [0, 1]; non-finite values become absent.
    pub fn clamped(self) -> Self {
        fn clamp(value: Option<f64>) -> Option<f64> {
            value
                .filter(|v| v.is_finite())
                .map(|v| v.clamp(0.0, 1.0))
        }

        Self {
            feasibility: clamp(self.feasibility),
            impact: clamp(self.impact),
            clarity: clamp(self.clarity),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.feasibility.is_none() && self.impact.is_none() && self.clarity.is_none()
    }
}

pub const DEFAULT_ALGORITHM_VERSION: &str = "v1.0.0";

pub const DEFAULT_ALGORITHM_PROMPT: &str = "Score = (votes * 1.0) + (recency_factor * 0.5) + (feasibility * 0.3) + (impact * 0.4) + (clarity * 0.2)

Where:
- votes: Total upvotes minus downvotes
- recency_factor: 1.0 for new items, decays by 0.1 per week, never below 0
- feasibility, impact, clarity: AI-assessed in [0, 1]; absent dimensions contribute 0";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RankingAlgorithm {
    pub id: Uuid,
    pub version: String,
    pub prompt_content: String,
    pub weight_votes: f64,
    pub weight_recency: f64,
    pub weight_feasibility: f64,
    pub weight_impact: f64,
    pub weight_clarity: f64,
    pub is_active: bool,
    pub github_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RankingAlgorithm {
    /// The algorithm seeded when no configuration has been persisted yet.
    pub fn default_active() -> Self {
        let weights = RankingWeights::default();
        Self {
            id: Uuid::new_v4(),
            version: DEFAULT_ALGORITHM_VERSION.to_string(),
            prompt_content: DEFAULT_ALGORITHM_PROMPT.to_string(),
            weight_votes: weights.votes,
            weight_recency: weights.recency,
            weight_feasibility: weights.feasibility,
            weight_impact: weights.impact,
            weight_clarity: weights.clarity,
            is_active: true,
            github_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn weights(&self) -> RankingWeights {
        RankingWeights {
            votes: self.weight_votes,
            recency: self.weight_recency,
            feasibility: self.weight_feasibility,
            impact: self.weight_impact,
            clarity: self.weight_clarity,
        }
    }
}
