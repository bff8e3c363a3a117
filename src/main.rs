use appfeedback::config::Config;
use appfeedback::database::{create_pool, run_migrations};
use appfeedback::redis::RedisClient;
use appfeedback::services::{
    ai_scoring_service, background_jobs::BackgroundJobsService, issue_service,
    ledger::FeedbackLedger,
};
use appfeedback::store::{FeedbackStore, MemoryStore, PgStore};
use appfeedback::{AppState, create_app};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "appfeedback=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Configuration loaded successfully");

    // Postgres when configured, otherwise everything lives in memory
    let store: Arc<dyn FeedbackStore> = match &config.database_url {
        Some(database_url) => {
            let db = create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            run_migrations(&db).await?;
            tracing::info!("Database migrations completed");

            Arc::new(PgStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let redis = match &config.redis_url {
        Some(redis_url) => {
            let client = RedisClient::new(redis_url).await?;
            tracing::info!("Redis client created");
            Some(Arc::new(client))
        }
        None => {
            tracing::info!("REDIS_URL not set; rate limiting disabled");
            None
        }
    };

    let ledger = Arc::new(FeedbackLedger::new(
        store,
        ai_scoring_service::from_config(&config),
        issue_service::from_config(&config),
        config.credits.clone(),
    ));
    ledger.ensure_default_algorithm().await?;

    let jobs = BackgroundJobsService::new(ledger.clone(), config.rerank_interval_secs);
    jobs.start_all_jobs();

    let state = AppState {
        ledger,
        redis,
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    let listener = TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;
    tracing::info!("Server listening on {}:{}", config.host, config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
