use std::sync::Arc;
use tokio::{
    task::JoinHandle,
    time::{Duration, MissedTickBehavior, interval},
};

use crate::{error::Result, services::ledger::FeedbackLedger};

#[derive(Clone)]
pub struct BackgroundJobsService {
    ledger: Arc<FeedbackLedger>,
    rerank_interval: Duration,
}

impl BackgroundJobsService {
    pub fn new(ledger: Arc<FeedbackLedger>, rerank_interval_secs: u64) -> Self {
        Self {
            ledger,
            rerank_interval: Duration::from_secs(rerank_interval_secs),
        }
    }

    /// Start all background jobs. A zero interval disables the periodic re-rank.
    pub fn start_all_jobs(&self) -> Option<JoinHandle<()>> {
        if self.rerank_interval.is_zero() {
            tracing::info!("Periodic re-rank disabled");
            return None;
        }

        let jobs_service = self.clone();

        // Recompute rank scores so recency decay is reflected without votes
        let handle = tokio::spawn(async move {
            let mut interval = interval(jobs_service.rerank_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; startup already has fresh scores.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = jobs_service.rerank().await {
                    tracing::error!("Failed to re-rank items: {}", e);
                }
            }
        });

        tracing::info!(
            "Background jobs started (re-rank every {}s)",
            self.rerank_interval.as_secs()
        );
        Some(handle)
    }

    async fn rerank(&self) -> Result<()> {
        let processed = self.ledger.rerank_all().await?;
        tracing::debug!("Periodic re-rank touched {} items", processed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CreditPolicy,
        services::{ai_scoring_service::DisabledScorer, issue_service::DisabledIssueTracker},
        store::MemoryStore,
    };

    fn ledger() -> Arc<FeedbackLedger> {
        Arc::new(FeedbackLedger::new(
            Arc::new(MemoryStore::new()),
            Arc::new(DisabledScorer),
            Arc::new(DisabledIssueTracker),
            CreditPolicy::default(),
        ))
    }

    #[tokio::test]
    async fn zero_interval_starts_nothing() {
        let jobs = BackgroundJobsService::new(ledger(), 0);
        assert!(jobs.start_all_jobs().is_none());
    }

    #[tokio::test]
    async fn rerank_job_runs_until_aborted() {
        let jobs = BackgroundJobsService::new(ledger(), 3600);
        let handle = jobs.start_all_jobs().unwrap();
        assert!(!handle.is_finished());
        handle.abort();
    }
}
