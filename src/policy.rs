use crate::matcher::ExclusionMatcher;

/// RouteClass
///
/// The access class of a request path. Every path maps to exactly one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a session (the login page and public listings).
    Public,
    /// Requires an active session.
    Protected,
}

/// Decision
///
/// The single outcome the access gate produces for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to the inner service unchanged.
    Allow,
    /// Answer with a redirect to the given path instead of running the inner service.
    RedirectTo(String),
}

/// GateConfig
///
/// The immutable route policy of the dashboard. Loaded once at startup as part of
/// `AppConfig` and shared read-only across every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    // Exact path of the login page.
    pub login_path: String,
    // Any path starting with this prefix is public (property listings).
    pub public_prefix: String,
    // Where a signed-in user lands when they revisit the login page.
    pub home_path: String,
    // Paths the gate never evaluates (static assets, images, manifest).
    pub exclusions: ExclusionMatcher,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            public_prefix: "/listings".to_string(),
            home_path: "/".to_string(),
            exclusions: ExclusionMatcher::default(),
        }
    }
}

impl GateConfig {
    /// classify
    ///
    /// Pure, total classification of a path. A path is public when it is exactly the
    /// login path or starts with the public prefix; everything else is protected.
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == self.login_path || path.starts_with(&self.public_prefix) {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }

    /// decide
    ///
    /// Maps (path, session presence) to exactly one `Decision`. Rules are evaluated in
    /// order and the first match wins:
    /// 1. no session on a protected path redirects to the login page;
    /// 2. a session on the login page redirects home;
    /// 3. anything else is allowed.
    pub fn decide(&self, path: &str, has_session: bool) -> Decision {
        match (self.classify(path), has_session) {
            (RouteClass::Protected, false) => Decision::RedirectTo(self.login_path.clone()),
            (_, true) if path == self.login_path => Decision::RedirectTo(self.home_path.clone()),
            _ => Decision::Allow,
        }
    }
}
