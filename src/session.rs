use async_trait::async_trait;
use axum::http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{COOKIE, SET_COOKIE},
    request::Parts,
};
use chrono::Utc;
use cookie::{Cookie, CookieBuilder, SameSite, time::Duration};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Deserialize;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use uuid::Uuid;

use crate::{
    auth::{Claims, Identity},
    config::AppConfig,
    error::ResolveError,
};

/// Resolution
///
/// What a resolver found for one request: an identity (or none), plus any headers the
/// resolver needs sent back to the browser (a renewed session cookie, for example).
/// The access gate forwards `passthrough` without inspecting it.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub identity: Option<Identity>,
    pub passthrough: HeaderMap,
}

impl Resolution {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            passthrough: HeaderMap::new(),
        }
    }
}

// 1. SessionResolver Contract
/// SessionResolver
///
/// The external capability the access gate consults once per request. Implementations
/// own the credential format and any refresh behaviour; the gate only reads whether
/// `identity` is present.
///
/// Return `Ok(Resolution::anonymous())` for missing, expired or rejected credentials.
/// Reserve `Err` for a backend that could not give an answer.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, parts: &Parts) -> Result<Resolution, ResolveError>;
}

/// SessionState
///
/// The concrete type used to share the resolver across the application state.
pub type SessionState = Arc<dyn SessionResolver>;

// 2. Local JWT verification
/// JwtCookieResolver
///
/// Verifies the HS256 access token from the session cookie with the shared project
/// secret. When the token is close to expiry it re-signs the same claims with a fresh
/// lifetime and hands back a `Set-Cookie` in the passthrough, which is how sessions
/// stay alive while the dashboard is in use.
pub struct JwtCookieResolver {
    cookie_name: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
    refresh_window_secs: i64,
    secure: bool,
}

impl JwtCookieResolver {
    pub fn new(
        secret: &str,
        audience: &str,
        cookie_name: &str,
        ttl_secs: i64,
        refresh_window_secs: i64,
        secure: bool,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        validation.validate_exp = true;

        Self {
            cookie_name: cookie_name.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
            refresh_window_secs,
            secure,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_audience,
            &config.session_cookie,
            config.session_ttl_secs,
            config.session_refresh_window_secs,
            config.secure_cookies(),
        )
    }

    /// Re-signs `claims` when they expire within the refresh window. A signing failure
    /// leaves the current session untouched.
    fn refreshed_cookie(&self, claims: &Claims) -> Option<HeaderValue> {
        let now = Utc::now().timestamp();
        if claims.exp as i64 - now > self.refresh_window_secs {
            return None;
        }

        let (Ok(iat), Some(Ok(exp))) = (
            usize::try_from(now),
            now.checked_add(self.ttl_secs).map(usize::try_from),
        ) else {
            tracing::warn!(ttl_secs = self.ttl_secs, "session lifetime out of range, not refreshing");
            return None;
        };

        let renewed = Claims {
            iat,
            exp,
            ..claims.clone()
        };

        match encode(&Header::new(Algorithm::HS256), &renewed, &self.encoding_key) {
            Ok(token) => session_cookie(&self.cookie_name, &token, self.ttl_secs, self.secure),
            Err(e) => {
                tracing::warn!(user_id = %claims.sub, error = %e, "could not re-sign session token");
                None
            }
        }
    }
}

#[async_trait]
impl SessionResolver for JwtCookieResolver {
    async fn resolve(&self, parts: &Parts) -> Result<Resolution, ResolveError> {
        let Some(token) = read_cookie(&parts.headers, &self.cookie_name) else {
            return Ok(Resolution::anonymous());
        };

        let claims = match decode::<Claims>(&token, &self.decoding_key, &self.validation) {
            Ok(data) => data.claims,
            Err(e) => {
                // Expired, tampered or foreign tokens all mean "no session".
                tracing::debug!(error = %e, "rejected session token");
                return Ok(Resolution::anonymous());
            }
        };

        let mut resolution = Resolution::authenticated(Identity::from(&claims));
        if let Some(cookie) = self.refreshed_cookie(&claims) {
            tracing::debug!(user_id = %claims.sub, "session token refreshed");
            resolution.passthrough.append(SET_COOKIE, cookie);
        }

        Ok(resolution)
    }
}

// 3. Remote verification against the Supabase auth server
/// SupabaseResolver
///
/// Asks `GET {SUPABASE_URL}/auth/v1/user` who owns the access token. The auth server is
/// the only authority here, so unlike the local resolver a network failure or 5xx is a
/// `ResolveError` and never silently becomes "signed out".
pub struct SupabaseResolver {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    cookie_name: String,
}

/// Minimal shape of the auth server's user object.
#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
    role: Option<String>,
}

impl SupabaseResolver {
    pub fn new(base_url: &str, anon_key: &str, cookie_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            cookie_name: cookie_name.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.supabase_url,
            &config.supabase_anon_key,
            &config.session_cookie,
        )
    }
}

#[async_trait]
impl SessionResolver for SupabaseResolver {
    async fn resolve(&self, parts: &Parts) -> Result<Resolution, ResolveError> {
        let Some(token) = read_cookie(&parts.headers, &self.cookie_name) else {
            return Ok(Resolution::anonymous());
        };

        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&token)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::OK => {
                let user: SupabaseUser = response
                    .json()
                    .await
                    .map_err(|e| ResolveError::Unavailable(format!("malformed user payload: {e}")))?;

                Ok(Resolution::authenticated(Identity {
                    id: user.id,
                    email: user.email,
                    role: user.role.unwrap_or_else(|| "authenticated".to_string()),
                }))
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Ok(Resolution::anonymous())
            }
            status => Err(ResolveError::Unavailable(format!(
                "auth server answered {status}"
            ))),
        }
    }
}

// 4. The Mock Implementation (For Tests)
/// MockSessionResolver
///
/// Returns a fixed outcome for every request and counts how often it was asked, so tests
/// can check that excluded paths never reach the resolver.
#[derive(Clone)]
pub struct MockSessionResolver {
    outcome: MockOutcome,
    passthrough: HeaderMap,
    calls: Arc<AtomicUsize>,
}

#[derive(Clone)]
enum MockOutcome {
    Anonymous,
    Authenticated(Identity),
    Unavailable,
}

impl MockSessionResolver {
    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            passthrough: HeaderMap::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn new_anonymous() -> Self {
        Self::with_outcome(MockOutcome::Anonymous)
    }

    pub fn new_authenticated(identity: Identity) -> Self {
        Self::with_outcome(MockOutcome::Authenticated(identity))
    }

    pub fn new_unavailable() -> Self {
        Self::with_outcome(MockOutcome::Unavailable)
    }

    /// Adds a header every successful resolution hands back as passthrough.
    pub fn with_passthrough(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.passthrough.append(name, value);
        self
    }

    /// How many times `resolve` has run, across all clones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionResolver for MockSessionResolver {
    async fn resolve(&self, _parts: &Parts) -> Result<Resolution, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let identity = match &self.outcome {
            MockOutcome::Anonymous => None,
            MockOutcome::Authenticated(identity) => Some(identity.clone()),
            MockOutcome::Unavailable => {
                return Err(ResolveError::Unavailable(
                    "Mock Session Error: Simulation requested".to_string(),
                ));
            }
        };

        Ok(Resolution {
            identity,
            passthrough: self.passthrough.clone(),
        })
    }
}

// --- Cookie helpers ---

/// read_cookie
///
/// Finds a cookie value by name across every `Cookie` header of the request. Values
/// wrapped in double quotes are returned without them.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name && !cookie.value_trimmed().is_empty())
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// session_cookie
///
/// Builds the `Set-Cookie` value for the access token. `HttpOnly` and `SameSite=Lax`
/// always, `Secure` when requested.
pub fn session_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> Option<HeaderValue> {
    let cookie = base_cookie(name, value, secure)
        .max_age(Duration::seconds(max_age_secs))
        .build();

    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// A `Set-Cookie` value that makes the browser drop the access token.
pub fn expired_cookie(name: &str, secure: bool) -> Option<HeaderValue> {
    let mut cookie = base_cookie(name, "", secure).build();
    cookie.make_removal();

    HeaderValue::from_str(&cookie.to_string()).ok()
}

fn base_cookie(name: &str, value: &str, secure: bool) -> CookieBuilder<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
}
