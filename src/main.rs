use property_portal::{
    AppState, JwtCookieResolver, SessionState, SupabaseResolver,
    config::{AppConfig, Env, SessionBackend},
    create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initialises logging, picks the session resolver and serves the
/// gated dashboard.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    // Loads .env before reading; AppConfig::load() panics on missing production secrets.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins, otherwise debug for this crate (gate decisions) and info for tower_http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "property_portal=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for reading gate decisions by eye.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Session Resolver Selection
    // Local JWT verification by default; the Supabase auth server when configured.
    let sessions: SessionState = match config.session_backend {
        SessionBackend::Jwt => Arc::new(JwtCookieResolver::from_config(&config)),
        SessionBackend::Supabase => Arc::new(SupabaseResolver::from_config(&config)),
    };
    tracing::info!(
        backend = ?config.session_backend,
        cookie = %config.session_cookie,
        "session resolver ready"
    );

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let dashboard_dir = config.dashboard_dir.clone();
    let app = create_router(AppState { sessions, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("Serving dashboard from {}", dashboard_dir);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
