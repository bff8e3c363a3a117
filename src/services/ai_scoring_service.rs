use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{config::Config, error::CollaboratorError, models::AiScores};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// What the scorer gets to see of an item.
#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub item_type: String,
    pub title: String,
    pub description: String,
    /// Prompt text of the active ranking algorithm.
    pub algorithm_prompt: String,
}

#[async_trait]
pub trait AiScorer: Send + Sync {
    async fn score(&self, request: &ScoringRequest) -> Result<AiScores, CollaboratorError>;
}

/// Scorer used when no API key is configured.
pub struct DisabledScorer;

#[async_trait]
impl AiScorer for DisabledScorer {
    async fn score(&self, _request: &ScoringRequest) -> Result<AiScores, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "AI scoring is not configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct AnthropicScorer {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicScorer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn user_prompt(request: &ScoringRequest) -> String {
        format!(
            "Assess this {} submission.\n\nTitle: {}\n\nDescription:\n{}\n\n\
             Respond with only a JSON object of the form \
             {{\"feasibility\": <0..1>, \"impact\": <0..1>, \"clarity\": <0..1>}}.",
            request.item_type, request.title, request.description
        )
    }
}

#[async_trait]
impl AiScorer for AnthropicScorer {
    async fn score(&self, request: &ScoringRequest) -> Result<AiScores, CollaboratorError> {
        tracing::debug!("Requesting AI scores for '{}'", request.title);

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: 256,
            system: request.algorithm_prompt.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::user_prompt(request),
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Unavailable(format!(
                "Anthropic API error {}: {}",
                status, error_text
            )));
        }

        let payload: MessagesResponse = response.json().await?;
        let text: String = payload
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        parse_scores(&text)
    }
}

/// Pull the first JSON object out of a model reply and read the three dimensions.
pub fn parse_scores(text: &str) -> Result<AiScores, CollaboratorError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(CollaboratorError::Unavailable(
                "No JSON object in AI response".to_string(),
            ));
        }
    };

    let scores: AiScores = serde_json::from_str(json)
        .map_err(|e| CollaboratorError::Unavailable(format!("Malformed AI scores: {}", e)))?;

    Ok(scores.clamped())
}

pub fn from_config(config: &Config) -> Arc<dyn AiScorer> {
    match &config.anthropic_api_key {
        Some(api_key) => Arc::new(AnthropicScorer::new(
            api_key.clone(),
            config.ai_scoring_model.clone(),
        )),
        None => Arc::new(DisabledScorer),
    }
}
