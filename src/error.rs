use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ResolveError
///
/// Failures of the session backend itself. A missing or rejected credential is NOT an
/// error: resolvers report it as an anonymous `Resolution`. These variants mean the
/// backend could not answer at all, so the gate cannot tell whether a session exists.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The backend answered, but not with a verdict on the credential (5xx, bad payload).
    #[error("session backend unavailable: {0}")]
    Unavailable(String),
    /// The backend could not be reached.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "session resolution failed");

        (
            StatusCode::SERVICE_UNAVAILABLE,
            "Session service is temporarily unavailable",
        )
            .into_response()
    }
}
