pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, CONTENT_TYPE},
    },
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, redis::RedisClient, services::ledger::FeedbackLedger};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<FeedbackLedger>,
    pub redis: Option<Arc<RedisClient>>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([ACCEPT, CONTENT_TYPE]);

    let feedback_routes = Router::new()
        .route(
            "/api/feedback",
            post(handlers::feedback::create_feedback).get(handlers::feedback::list_feedback),
        )
        .route(
            "/api/feedback/{item_id}",
            get(handlers::feedback::get_feedback)
                .put(handlers::feedback::update_feedback)
                .delete(handlers::feedback::delete_feedback),
        )
        .route(
            "/api/feedback/{item_id}/vote",
            post(handlers::feedback::vote_feedback),
        )
        .route(
            "/api/feedback/{item_id}/comments",
            get(handlers::comments::get_comments).post(handlers::comments::create_comment),
        );

    let credit_routes = Router::new()
        .route("/api/credits/balance", get(handlers::credits::get_balance))
        .route("/api/credits/history", get(handlers::credits::get_history))
        .route(
            "/api/credits/leaderboard",
            get(handlers::credits::get_leaderboard),
        );

    let ranking_routes = Router::new()
        .route("/api/ranking/results", get(handlers::ranking::get_results))
        .route("/api/ranking/run", post(handlers::ranking::run_ranking))
        .route(
            "/api/ranking/algorithm",
            get(handlers::ranking::get_algorithm),
        )
        .route(
            "/api/ranking/algorithm/history",
            get(handlers::ranking::get_algorithm_history),
        )
        .route(
            "/api/ranking/rescore/{item_id}",
            post(handlers::ranking::rescore_item),
        );

    Router::new()
        .route("/api/health", get(handlers::stats::health))
        .route("/api/stats", get(handlers::stats::get_stats))
        .merge(feedback_routes)
        .merge(credit_routes)
        .merge(ranking_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
