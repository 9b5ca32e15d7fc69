use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod policy;
pub mod session;

pub mod routes;
use routes::{authenticated, dashboard, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use policy::{Decision, GateConfig, RouteClass};
pub use session::{JwtCookieResolver, MockSessionResolver, SessionState, SupabaseResolver};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_me, handlers::logout),
    components(schemas(models::SessionUser)),
    tags(
        (name = "property-portal", description = "Property management dashboard API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable per-process state: the session resolver and the loaded config.
#[derive(Clone)]
pub struct AppState {
    /// Answers "is there a session?" for the access gate.
    pub sessions: SessionState,
    /// Configuration, including the gate's route policy.
    pub config: AppConfig,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the full HTTP surface. Every route, the API docs and the dashboard fallback
/// sit behind `access_gate`; the health check passes through it via the exclusion matcher.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI and the OpenAPI JSON. Protected like any other page.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health check: excluded from evaluation by the matcher, never redirected.
        .merge(public::public_routes())
        // JSON endpoints next to the dashboard pages.
        .merge(authenticated::authenticated_routes())
        // Dashboard export as fallback, with `.html` retry for client routes.
        .merge(dashboard::dashboard_routes(&state.config.dashboard_dir))
        // 3. Access Gate: wraps every route above and the fallback, so unmatched page
        // paths are gated like routed ones.
        .layer(middleware::from_fn_with_state(state.clone(), gate::access_gate))
        // Apply the shared state to all routes.
        .with_state(state);

    // 4. Observability and Correlation Layers (outermost, see every request)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a UUID per incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer (applied last)
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, URI and the `x-request-id` set by `SetRequestIdLayer`,
/// so the gate's decision logs correlate with the request that produced them.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
