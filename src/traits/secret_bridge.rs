//! UI-side view of the privileged bridge

use crate::bridge::{BridgeResponse, Environment};

/// The narrow surface the untrusted UI may call
///
/// Exactly three vault calls plus the read-only environment descriptor.
/// Responses are envelopes, never errors: the bridge does not throw across
/// the boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SecretBridge: Send + Sync {
    async fn set_secret(&self, account: &str, token: &str) -> BridgeResponse<()>;

    async fn get_secret(&self, account: &str) -> BridgeResponse<String>;

    async fn delete_secret(&self, account: &str) -> BridgeResponse<()>;

    fn environment(&self) -> Environment;
}
