//! Navigation allow-list for the main webview

use url::Url;

/// Origins the packaged app is served from by the webview runtime
pub const PACKAGED_APP_ORIGINS: &[&str] = &[
    "tauri://localhost",
    "http://tauri.localhost",
    "https://tauri.localhost",
];

/// Development origins (frontend dev server and local backend)
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://localhost:8000"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Deny,
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

/// Scheme, host and effective port of an allowed origin.
///
/// Custom schemes such as `tauri:` have opaque origins in the URL standard,
/// so the triple is compared directly instead.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OriginKey {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
}

impl OriginKey {
    fn of(url: &Url) -> Self {
        Self {
            scheme: url.scheme().to_ascii_lowercase(),
            host: url.host_str().map(|h| h.to_ascii_lowercase()),
            port: url.port_or_known_default(),
        }
    }
}

/// Stateless decision over a navigation target
#[derive(Debug, Clone)]
pub struct NavigationPolicy {
    allowed: Vec<OriginKey>,
}

impl NavigationPolicy {
    /// Build the policy from configured origins plus the packaged-app origins.
    /// Entries that do not parse as URLs are skipped with a warning.
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Self {
        let mut allowed = Vec::new();
        let configured = origins.iter().map(|o| o.as_ref());
        for origin in configured.chain(PACKAGED_APP_ORIGINS.iter().copied()) {
            match Url::parse(origin) {
                Ok(url) => {
                    let key = OriginKey::of(&url);
                    if !allowed.contains(&key) {
                        allowed.push(key);
                    }
                }
                Err(e) => tracing::warn!(origin = %origin, error = %e, "Ignoring unparseable allowed origin"),
            }
        }
        Self { allowed }
    }

    pub fn decide(&self, target: &str) -> NavigationDecision {
        match Url::parse(target) {
            Ok(url) => self.decide_url(&url),
            Err(_) => NavigationDecision::Deny,
        }
    }

    pub fn decide_url(&self, url: &Url) -> NavigationDecision {
        if url.scheme() == "file" {
            return NavigationDecision::Allow;
        }
        if self.allowed.contains(&OriginKey::of(url)) {
            NavigationDecision::Allow
        } else {
            NavigationDecision::Deny
        }
    }
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS)
    }
}
