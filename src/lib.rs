//! SGE shell - trust boundary for the offline grades desktop app
//!
//! The untrusted UI never touches the OS credential store. It reaches the
//! privileged side only through the bridge's closed set of vault operations,
//! while navigation, window-open, content and certificate policies keep that
//! bridge the sole escalation path. The authenticated API client consumes
//! the bridge to attach bearer tokens and to drop them on a 401.
//!
//! Everything is organized around trait-based dependency injection; the
//! webview runtime itself sits behind the `desktop` feature.

pub mod api_client;
pub mod bridge;
pub mod config;
pub mod logging;
pub mod mocks;
pub mod production;
pub mod sanitize;
pub mod security;
pub mod traits;
pub mod windows;

mod state;

#[cfg(feature = "desktop")]
pub mod commands;
#[cfg(feature = "desktop")]
pub mod desktop;

pub use api_client::ApiClient;
pub use bridge::PrivilegedBridge;
pub use sanitize::sanitize_input;
pub use state::AppState;
