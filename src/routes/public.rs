use crate::AppState;
use axum::{Router, routing::get};

/// Health Router Module
///
/// Endpoints meant for infrastructure rather than users. They sit behind the access gate
/// like everything else, but `ExclusionMatcher::default()` lists them as exact
/// exclusions, so the session resolver is never consulted.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer and uptime check. Answers "ok" without looking at the session.
        .route("/health", get(|| async { "ok" }))
}
