pub mod ai_scoring_service;
pub mod background_jobs;
pub mod issue_service;
pub mod ledger;
pub mod locks;
pub mod ranking_service;
pub mod vote_service;
