//! Isolation boundary policies
//!
//! Each policy is a pure function from a request to a decision. The hosting
//! runtime calls it, applies the decision and logs any refusal through
//! [`PolicyViolation::log`].

mod content_policy;
mod navigation;

use url::Url;

pub use content_policy::ContentPolicy;
pub use navigation::{
    NavigationDecision, NavigationPolicy, DEFAULT_ALLOWED_ORIGINS, PACKAGED_APP_ORIGINS,
};

const SECURITY_TARGET: &str = "sge_shell_lib::security";

/// A refused security-sensitive action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyViolation {
    NavigationBlocked { url: String },
    WindowOpenBlocked { url: String },
    CertificateRejected { url: String, error: String },
}

impl PolicyViolation {
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyViolation::NavigationBlocked { .. } => "navigation_blocked",
            PolicyViolation::WindowOpenBlocked { .. } => "window_open_blocked",
            PolicyViolation::CertificateRejected { .. } => "certificate_rejected",
        }
    }

    pub fn log(&self) {
        match self {
            PolicyViolation::NavigationBlocked { url } => {
                tracing::warn!(target: SECURITY_TARGET, kind = self.kind(), url = %url, "Blocked navigation");
            }
            PolicyViolation::WindowOpenBlocked { url } => {
                tracing::warn!(target: SECURITY_TARGET, kind = self.kind(), url = %url, "Blocked new window");
            }
            PolicyViolation::CertificateRejected { url, error } => {
                tracing::error!(target: SECURITY_TARGET, kind = self.kind(), url = %url, error = %error, "Rejected certificate");
            }
        }
    }
}

// ============================================================================
// Window-open policy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOpenDecision {
    Deny,
}

/// The UI can never spawn windows of its own.
pub struct WindowOpenPolicy;

impl WindowOpenPolicy {
    pub fn decide(_url: &str) -> WindowOpenDecision {
        WindowOpenDecision::Deny
    }
}

// ============================================================================
// Certificate policy
// ============================================================================

/// A TLS certificate validation failure reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateErrorEvent {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateDecision {
    Reject,
}

/// Invalid certificates are rejected whatever the error or its severity.
pub struct CertificatePolicy;

impl CertificatePolicy {
    pub fn decide(_event: &CertificateErrorEvent) -> CertificateDecision {
        CertificateDecision::Reject
    }
}

// ============================================================================
// Host-side enforcement
// ============================================================================

/// Gate a pending webview navigation. `false` cancels it, so the window stays
/// on its current document; refusals are logged.
pub fn enforce_navigation(policy: &NavigationPolicy, target: &Url) -> bool {
    let decision = policy.decide_url(target);
    if !decision.is_allowed() {
        PolicyViolation::NavigationBlocked { url: target.to_string() }.log();
    }
    decision.is_allowed()
}

/// Gate a UI request to open a new window. Always refused and logged.
pub fn enforce_window_open(target: &str) -> bool {
    match WindowOpenPolicy::decide(target) {
        WindowOpenDecision::Deny => {
            PolicyViolation::WindowOpenBlocked { url: target.to_string() }.log();
            false
        }
    }
}
