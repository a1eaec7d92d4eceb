//! Trait definitions for dependency injection
//!
//! Everything that touches the OS, the network or the hosting webview sits
//! behind a trait so the trust boundary can be exercised in tests.

mod http_transport;
mod secret_bridge;
mod secret_vault;
mod ui_host;

pub use http_transport::{ApiError, ApiRequest, ApiResponse, HttpMethod, HttpTransport};
pub use secret_bridge::SecretBridge;
pub use secret_vault::{validate_account, SecretVault, VaultError};
pub use ui_host::Navigator;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
#[cfg(test)]
pub use secret_bridge::MockSecretBridge;
#[cfg(test)]
pub use secret_vault::MockSecretVault;
#[cfg(test)]
pub use ui_host::MockNavigator;
