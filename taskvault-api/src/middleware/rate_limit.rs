/// Rate limiting for authentication endpoints
///
/// A fixed-window limiter with Redis-backed state, keyed per client, applied
/// to the public auth routes to slow down registration abuse and credential
/// stuffing. Rate limiting is a boundary concern: the core task service
/// never sees it.
///
/// # Algorithm
///
/// One counter per client per window: `INCR` on each request, `EXPIRE` set
/// when the counter is created. When the counter passes the limit the
/// request is rejected with 429 and a `Retry-After` header carrying the
/// window's remaining TTL.
///
/// # Storage
///
/// Keys: `ratelimit:auth:{client}` with a 60 second TTL, so stale state
/// cleans itself up.

use axum::{extract::Request, extract::State, http::HeaderMap, middleware::Next, response::Response};
use redis::AsyncCommands;

use crate::app::AppState;
use crate::error::ApiError;

/// Requests allowed per client per window on auth endpoints
pub const AUTH_LIMIT_PER_WINDOW: i64 = 10;

/// Window length in seconds
pub const WINDOW_SECONDS: i64 = 60;

/// Rate limiting middleware for the auth router
///
/// If Redis is unavailable the request is allowed through: losing the
/// limiter must not take login down with it.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = format!("ratelimit:auth:{}", client_key(req.headers()));
    let mut conn = state.redis.connection();

    let count: i64 = match conn.incr(&key, 1).await {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            return Ok(next.run(req).await);
        }
    };

    if count == 1 {
        let _: Result<(), _> = conn.expire(&key, WINDOW_SECONDS).await;
    }

    if count > AUTH_LIMIT_PER_WINDOW {
        let retry_after: i64 = conn.ttl(&key).await.unwrap_or(WINDOW_SECONDS as i64);

        return Err(ApiError::RateLimitExceeded {
            retry_after: retry_after.max(1) as u64,
            message: "Too many authentication attempts, slow down".to_string(),
        });
    }

    Ok(next.run(req).await)
}

/// Derives the rate-limit key for a client
///
/// Uses the first hop of `X-Forwarded-For` when present (the server normally
/// sits behind a proxy); falls back to a shared bucket otherwise.
fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
