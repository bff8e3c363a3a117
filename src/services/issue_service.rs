use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{config::Config, error::CollaboratorError};

#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// External issue tracker that bug reports are mirrored to.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Returns the URL of the created issue.
    async fn create_issue(&self, request: &IssueRequest) -> Result<String, CollaboratorError>;
}

pub struct DisabledIssueTracker;

#[async_trait]
impl IssueTracker for DisabledIssueTracker {
    async fn create_issue(&self, _request: &IssueRequest) -> Result<String, CollaboratorError> {
        Err(CollaboratorError::Unavailable(
            "Issue tracking is not configured".to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct GitHubIssueTracker {
    client: Client,
    token: String,
    repo: String,
}

#[derive(Debug, Serialize)]
struct CreateIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
}

impl GitHubIssueTracker {
    /// `repo` is `owner/name`.
    pub fn new(token: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            repo: repo.into(),
        }
    }
}

#[async_trait]
impl IssueTracker for GitHubIssueTracker {
    async fn create_issue(&self, request: &IssueRequest) -> Result<String, CollaboratorError> {
        tracing::info!("Creating GitHub issue in {}", self.repo);

        let response = self
            .client
            .post(format!("https://api.github.com/repos/{}/issues", self.repo))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "appfeedback")
            .json(&CreateIssue {
                title: &request.title,
                body: &request.body,
                labels: &request.labels,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Unavailable(format!(
                "GitHub API error {}: {}",
                status, error_text
            )));
        }

        let issue: CreatedIssue = response.json().await?;
        tracing::info!("GitHub issue created: {}", issue.html_url);

        Ok(issue.html_url)
    }
}

pub fn from_config(config: &Config) -> Arc<dyn IssueTracker> {
    match (&config.github_token, &config.github_repo) {
        (Some(token), Some(repo)) => Arc::new(GitHubIssueTracker::new(token.clone(), repo.clone())),
        _ => Arc::new(DisabledIssueTracker),
    }
}
