use std::{env, str::FromStr};

/// Credit amounts awarded per contribution kind.
#[derive(Debug, Clone)]
pub struct CreditPolicy {
    pub submission: i32,
    pub bug_submission: i32,
    pub developed: i32,
    pub bug_verified: i32,
}

impl Default for CreditPolicy {
    fn default() -> Self {
        Self {
            submission: 10,
            bug_submission: 10,
            developed: 500,
            bug_verified: 25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub allowed_origins: Vec<String>,

    // AI scoring
    pub anthropic_api_key: Option<String>,
    pub ai_scoring_model: String,

    // Issue tracking
    pub github_token: Option<String>,
    pub github_repo: Option<String>,

    // Ranking
    pub rerank_interval_secs: u64,

    // Credits
    pub credits: CreditPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            redis_url: None,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            anthropic_api_key: None,
            ai_scoring_model: "claude-3-haiku-20240307".to_string(),
            github_token: None,
            github_repo: None,
            rerank_interval_secs: 3600,
            credits: CreditPolicy::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let credit_defaults = CreditPolicy::default();

        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", defaults.port),
            database_url: non_empty("DATABASE_URL"),
            redis_url: non_empty("REDIS_URL"),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),

            anthropic_api_key: non_empty("ANTHROPIC_API_KEY"),
            ai_scoring_model: env::var("AI_SCORING_MODEL").unwrap_or(defaults.ai_scoring_model),

            github_token: non_empty("GITHUB_TOKEN"),
            github_repo: non_empty("GITHUB_REPO"),

            rerank_interval_secs: parse_or("RERANK_INTERVAL_SECS", defaults.rerank_interval_secs),

            credits: CreditPolicy {
                submission: parse_or("CREDITS_SUBMISSION", credit_defaults.submission),
                bug_submission: parse_or("CREDITS_BUG_SUBMISSION", credit_defaults.bug_submission),
                developed: parse_or("CREDITS_DEVELOPED", credit_defaults.developed),
                bug_verified: parse_or("CREDITS_BUG_VERIFIED", credit_defaults.bug_verified),
            },
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
