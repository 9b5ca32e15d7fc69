/// ExclusionMatcher
///
/// The earlier-stage filter that decides whether the access gate runs at all.
/// Matching paths (build output, image optimisation, the favicon, the web manifest,
/// plain image files, the health check) skip session resolution entirely and go
/// straight to the inner service. Kept apart from `GateConfig::classify` so auth rules
/// never see asset traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionMatcher {
    exact: Vec<String>,
    prefixes: Vec<String>,
    extensions: Vec<String>,
}

const DEFAULT_PREFIXES: &[&str] = &["/_next/static", "/_next/image", "/favicon.ico", "/manifest.json"];
const DEFAULT_EXACT: &[&str] = &["/health"];
const DEFAULT_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp"];

impl Default for ExclusionMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        )
        .with_exact_paths(DEFAULT_EXACT.iter().map(|p| p.to_string()).collect())
    }
}

impl ExclusionMatcher {
    /// Builds a matcher from path prefixes and file extensions (without the leading dot).
    pub fn new(prefixes: Vec<String>, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self {
            exact: Vec::new(),
            prefixes,
            extensions,
        }
    }

    /// Adds paths that are skipped only on an exact match (`/health`, not `/healthcheck`).
    pub fn with_exact_paths(mut self, paths: Vec<String>) -> Self {
        self.exact.extend(paths);
        self
    }

    /// is_excluded
    ///
    /// True when the path is one of the exact paths, starts with one of the prefixes or
    /// ends in `.<ext>` for one of the configured extensions. Matching is case-sensitive.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.exact.iter().any(|exact| exact == path) {
            return true;
        }

        if self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str())) {
            return true;
        }

        match path.rsplit_once('.') {
            Some((_, ext)) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }
}
