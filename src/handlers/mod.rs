pub mod comments;
pub mod credits;
pub mod feedback;
pub mod ranking;
pub mod stats;

use axum::extract::{FromRequest, FromRequestParts};

use crate::{
    AppState,
    error::{AppError, Result},
};

// Extractors whose rejections render as `AppError` bodies instead of axum's
// plain-text defaults.

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Per-user rate limit. A no-op when Redis is not configured.
pub(crate) async fn enforce_rate_limit(
    state: &AppState,
    key: &str,
    limit: u32,
    window_seconds: usize,
) -> Result<()> {
    let Some(redis) = &state.redis else {
        return Ok(());
    };

    if !redis.check_rate_limit(key, limit, window_seconds).await? {
        tracing::debug!("Rate limit hit for {}", key);
        return Err(AppError::RateLimit);
    }

    Ok(())
}
