use axum::{
    extract::{Request, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    middleware::Next,
};

use crate::{AppState, policy::Decision, session::Resolution};

/// access_gate
///
/// Middleware in front of every dashboard page. One linear pass per request:
///
/// 1. Paths matched by the exclusion matcher go straight to the inner service; the
///    session resolver is never consulted for them.
/// 2. The resolver reports whether a session exists. A resolver outage answers
///    503 here rather than being treated as "signed out".
/// 3. `GateConfig::decide` picks exactly one of `Allow` / `RedirectTo`.
/// 4. On `Allow` the identity is stored in the request extensions for `CurrentUser`,
///    and the resolver's passthrough headers (refreshed cookies) are forwarded.
///    Redirects carry the passthrough as well.
pub async fn access_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let gate = &state.config.gate;
    let path = request.uri().path().to_owned();

    if gate.exclusions.is_excluded(&path) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let Resolution {
        identity,
        passthrough,
    } = match state.sessions.resolve(&parts).await {
        Ok(resolution) => resolution,
        Err(e) => return e.into_response(),
    };

    let decision = gate.decide(&path, identity.is_some());
    tracing::debug!(%path, ?decision, has_session = identity.is_some(), "access decision");

    let mut response = match decision {
        Decision::RedirectTo(target) => Redirect::temporary(&target).into_response(),
        Decision::Allow => {
            if let Some(identity) = identity {
                parts.extensions.insert(identity);
            }
            next.run(Request::from_parts(parts, body)).await
        }
    };

    forward_passthrough(passthrough, &mut response);
    response
}

/// Puts the passthrough headers in front of the response's own headers, so a header the
/// inner service set itself (logout expiring the cookie) is the one the browser applies last.
fn forward_passthrough(mut passthrough: HeaderMap, response: &mut Response) {
    if passthrough.is_empty() {
        return;
    }

    for (name, value) in response.headers() {
        passthrough.append(name.clone(), value.clone());
    }
    *response.headers_mut() = passthrough;
}
