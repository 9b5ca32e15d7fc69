use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Gated Router Module
///
/// API endpoints that live next to the dashboard pages and therefore run through the
/// access gate. None of these paths are public, so anonymous callers are redirected to
/// the login page before a handler runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /api/me
        // The signed-in user, consumed by the dashboard header and profile menu.
        .route("/api/me", get(handlers::get_me))
        // POST /logout
        // Expires the session cookie and returns the browser to the login page.
        .route("/logout", post(handlers::logout))
}
