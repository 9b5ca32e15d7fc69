use crate::AppState;
use axum::{
    Router,
    body::Body,
    http::{Request, Uri},
};
use std::path::Path;
use tower::{service_fn, util::ServiceExt};
use tower_http::services::ServeDir;

/// Dashboard Router Module
///
/// Serves the exported dashboard as the gated router's fallback. A static export writes
/// one `<page>.html` per client route, so a missing `/dashboard` is retried as
/// `/dashboard.html` before answering 404. Directory paths resolve to `index.html`.
pub fn dashboard_routes(dir: impl AsRef<Path>) -> Router<AppState> {
    let dir = dir.as_ref().to_path_buf();
    let pages = ServeDir::new(&dir);

    // Second attempt for client routes: same directory, `.html` appended to the path.
    let html_pages = service_fn(move |mut request: Request<Body>| {
        let pages = pages.clone();
        async move {
            let path = request.uri().path().trim_end_matches('/');
            if !path.is_empty() && !path.ends_with(".html") {
                if let Ok(uri) = format!("{path}.html").parse::<Uri>() {
                    *request.uri_mut() = uri;
                }
            }
            pages.oneshot(request).await
        }
    });

    Router::new().fallback_service(ServeDir::new(dir).fallback(html_pages))
}
