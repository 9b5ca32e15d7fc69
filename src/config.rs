use std::env;

use crate::policy::GateConfig;

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and pulled
/// into handlers and middleware via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and cookie hardening.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Directory holding the exported dashboard (HTML, JS, images).
    pub dashboard_dir: String,
    // Which resolver answers "is there a session?".
    pub session_backend: SessionBackend,
    // Shared secret used to verify and re-sign access tokens.
    pub jwt_secret: String,
    // Expected `aud` claim of access tokens.
    pub jwt_audience: String,
    // Supabase project URL and anon key, only read by the remote resolver.
    pub supabase_url: String,
    pub supabase_anon_key: String,
    // Name of the cookie carrying the access token.
    pub session_cookie: String,
    // Lifetime given to a refreshed token.
    pub session_ttl_secs: i64,
    // A token with less remaining lifetime than this is refreshed on the next request.
    pub session_refresh_window_secs: i64,
    // Route policy of the access gate.
    pub gate: GateConfig,
}

/// Env
///
/// Runtime context. Production switches logs to JSON, marks cookies `Secure` and makes
/// secrets mandatory.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// SessionBackend
///
/// `Jwt` verifies the access token locally; `Supabase` asks the auth server.
#[derive(Clone, PartialEq, Debug)]
pub enum SessionBackend {
    Jwt,
    Supabase,
}

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for tests and local scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "0.0.0.0:3000".to_string(),
            dashboard_dir: "dashboard/dist".to_string(),
            session_backend: SessionBackend::Jwt,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_audience: "authenticated".to_string(),
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            session_cookie: "sb-access-token".to_string(),
            session_ttl_secs: 3600,
            session_refresh_window_secs: 300,
            gate: GateConfig::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup, falling back to
    /// `AppConfig::default()` values where a variable is optional.
    ///
    /// # Panics
    /// Panics when a variable required by the current environment or session backend is
    /// missing, so the server never starts with an incomplete auth setup:
    /// - `SUPABASE_JWT_SECRET` in production;
    /// - `SUPABASE_URL` and `SUPABASE_ANON_KEY` when `SESSION_BACKEND=supabase`.
    pub fn load() -> Self {
        let defaults = Self::default();

        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("SUPABASE_JWT_SECRET")
                .expect("FATAL: SUPABASE_JWT_SECRET must be set in production."),
            Env::Local => env::var("SUPABASE_JWT_SECRET").unwrap_or(defaults.jwt_secret),
        };

        let session_backend = match env::var("SESSION_BACKEND").as_deref() {
            Ok("supabase") => SessionBackend::Supabase,
            _ => SessionBackend::Jwt,
        };

        let (supabase_url, supabase_anon_key) = match session_backend {
            SessionBackend::Supabase => (
                env::var("SUPABASE_URL").expect("FATAL: SUPABASE_URL required for the supabase session backend"),
                env::var("SUPABASE_ANON_KEY")
                    .expect("FATAL: SUPABASE_ANON_KEY required for the supabase session backend"),
            ),
            SessionBackend::Jwt => (
                env::var("SUPABASE_URL").unwrap_or_default(),
                env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            ),
        };

        let (session_ttl_secs, session_refresh_window_secs) = session_lifetimes(
            secs_var("SESSION_TTL_SECS", defaults.session_ttl_secs),
            secs_var("SESSION_REFRESH_WINDOW_SECS", defaults.session_refresh_window_secs),
            (defaults.session_ttl_secs, defaults.session_refresh_window_secs),
        );

        Self {
            env,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            dashboard_dir: env::var("DASHBOARD_DIR").unwrap_or(defaults.dashboard_dir),
            session_backend,
            jwt_secret,
            jwt_audience: defaults.jwt_audience,
            supabase_url,
            supabase_anon_key,
            session_cookie: env::var("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            session_ttl_secs,
            session_refresh_window_secs,
            gate: defaults.gate,
        }
    }

    /// Session cookies are only marked `Secure` outside local development.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}

/// Reads a strictly positive number of seconds, falling back on anything else.
fn secs_var(key: &str, fallback: i64) -> i64 {
    let Ok(raw) = env::var(key) else {
        return fallback;
    };

    match raw.parse::<i64>() {
        Ok(secs) if secs > 0 => secs,
        Ok(_) => {
            tracing::warn!(%key, %raw, "seconds must be positive, using {fallback}");
            fallback
        }
        Err(_) => {
            tracing::warn!(%key, %raw, "ignoring non-numeric value, using {fallback}");
            fallback
        }
    }
}

/// The refresh window must be shorter than the lifetime it renews, otherwise every
/// request would re-sign the token. Both fall back together.
fn session_lifetimes(ttl_secs: i64, window_secs: i64, defaults: (i64, i64)) -> (i64, i64) {
    if window_secs < ttl_secs {
        return (ttl_secs, window_secs);
    }

    tracing::warn!(
        ttl_secs,
        window_secs,
        "SESSION_REFRESH_WINDOW_SECS must be below SESSION_TTL_SECS, using defaults"
    );
    defaults
}
