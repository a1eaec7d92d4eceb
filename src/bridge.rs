//! Privileged bridge: the only code allowed to touch the secret vault
//!
//! The UI reaches this module through a closed set of requests. Every handler
//! calls the vault, writes one audit line naming the account (never the
//! secret) and folds the outcome into a [`BridgeResponse`] envelope, so no
//! error crosses the boundary as anything but data.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::{SecretBridge, SecretVault, VaultError};

/// Service identifier every account is namespaced under
pub const SERVICE_NAME: &str = "sge-grades-mvp";

/// Account holding the backend bearer token
pub const AUTH_TOKEN_ACCOUNT: &str = "auth-token";

const AUDIT_TARGET: &str = "sge_shell_lib::audit";

// ============================================================================
// Requests
// ============================================================================

/// Every operation the UI can ask the bridge for
///
/// The wire form is `{"channel": "vault:get", "args": {...}}`. A channel
/// outside this enum fails to deserialize, so it never reaches a handler.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "args")]
pub enum BridgeRequest {
    #[serde(rename = "vault:set")]
    SetSecret { account: String, token: String },
    #[serde(rename = "vault:get")]
    GetSecret { account: String },
    #[serde(rename = "vault:delete")]
    DeleteSecret { account: String },
}

impl BridgeRequest {
    pub fn channel(&self) -> &'static str {
        match self {
            BridgeRequest::SetSecret { .. } => "vault:set",
            BridgeRequest::GetSecret { .. } => "vault:get",
            BridgeRequest::DeleteSecret { .. } => "vault:delete",
        }
    }

    pub fn account(&self) -> &str {
        match self {
            BridgeRequest::SetSecret { account, .. }
            | BridgeRequest::GetSecret { account }
            | BridgeRequest::DeleteSecret { account } => account,
        }
    }
}

impl fmt::Debug for BridgeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRequest")
            .field("channel", &self.channel())
            .field("account", &self.account())
            .finish()
    }
}

// ============================================================================
// Responses
// ============================================================================

/// `{ success, value?, error? }` envelope returned across the boundary
///
/// A failure never carries a value and always carries an error. A successful
/// read may still have no value: a missing secret is not an error.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeResponse<T> {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> BridgeResponse<T> {
    pub fn ok(value: Option<T>) -> Self {
        Self { success: true, value, error: None }
    }

    pub fn ok_empty() -> Self {
        Self::ok(None)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, value: None, error: Some(error.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.value)
        } else {
            Err(self.error.unwrap_or_else(|| "unknown bridge error".to_string()))
        }
    }
}

impl<T> fmt::Debug for BridgeResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeResponse")
            .field("success", &self.success)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .field("error", &self.error)
            .finish()
    }
}

/// Result of dispatching a [`BridgeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeReply {
    Ack(BridgeResponse<()>),
    Secret(BridgeResponse<String>),
}

impl BridgeReply {
    pub fn is_success(&self) -> bool {
        match self {
            BridgeReply::Ack(r) => r.is_success(),
            BridgeReply::Secret(r) => r.is_success(),
        }
    }
}

// ============================================================================
// Environment descriptor
// ============================================================================

/// Read-only facts about the host exposed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub platform: String,
    pub is_production: bool,
}

impl Environment {
    pub fn detect(is_production: bool) -> Self {
        Self {
            platform: platform_tag(std::env::consts::OS).to_string(),
            is_production,
        }
    }
}

/// Map a Rust OS name onto the platform tags the UI expects.
pub fn platform_tag(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

// ============================================================================
// PrivilegedBridge
// ============================================================================

pub struct PrivilegedBridge {
    vault: Arc<dyn SecretVault>,
    environment: Environment,
}

impl PrivilegedBridge {
    pub fn new(vault: Arc<dyn SecretVault>, environment: Environment) -> Self {
        Self { vault, environment }
    }

    pub async fn dispatch(&self, request: BridgeRequest) -> BridgeReply {
        match request {
            BridgeRequest::SetSecret { account, token } => {
                BridgeReply::Ack(self.handle_set(&account, &token).await)
            }
            BridgeRequest::GetSecret { account } => {
                BridgeReply::Secret(self.handle_get(&account).await)
            }
            BridgeRequest::DeleteSecret { account } => {
                BridgeReply::Ack(self.handle_delete(&account).await)
            }
        }
    }

    pub fn environment_descriptor(&self) -> &Environment {
        &self.environment
    }

    async fn handle_set(&self, account: &str, token: &str) -> BridgeResponse<()> {
        let result = self.vault.set(account, token).await;
        audit("set", account, result.as_ref().err());
        match result {
            Ok(()) => BridgeResponse::ok_empty(),
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }

    async fn handle_get(&self, account: &str) -> BridgeResponse<String> {
        let result = self.vault.get(account).await;
        audit("get", account, result.as_ref().err());
        match result {
            Ok(token) => BridgeResponse::ok(token),
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }

    async fn handle_delete(&self, account: &str) -> BridgeResponse<()> {
        let result = self.vault.delete(account).await;
        audit("delete", account, result.as_ref().err());
        match result {
            Ok(()) => BridgeResponse::ok_empty(),
            Err(e) => BridgeResponse::failure(e.to_string()),
        }
    }
}

fn audit(operation: &'static str, account: &str, error: Option<&VaultError>) {
    match error {
        None => tracing::info!(target: AUDIT_TARGET, operation, account = %account, outcome = "ok", "Vault operation"),
        Some(e) => tracing::error!(target: AUDIT_TARGET, operation, account = %account, outcome = "error", error = %e, "Vault operation failed"),
    }
}

#[async_trait::async_trait]
impl SecretBridge for PrivilegedBridge {
    async fn set_secret(&self, account: &str, token: &str) -> BridgeResponse<()> {
        self.handle_set(account, token).await
    }

    async fn get_secret(&self, account: &str) -> BridgeResponse<String> {
        self.handle_get(account).await
    }

    async fn delete_secret(&self, account: &str) -> BridgeResponse<()> {
        self.handle_delete(account).await
    }

    fn environment(&self) -> Environment {
        self.environment.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::InMemoryVault;
    use crate::traits::MockSecretVault;

    fn bridge_with(vault: Arc<dyn SecretVault>) -> PrivilegedBridge {
        PrivilegedBridge::new(vault, Environment { platform: "linux".to_string(), is_production: false })
    }

    #[tokio::test]
    async fn test_set_get_delete_roundtrip() {
        let bridge = bridge_with(Arc::new(InMemoryVault::new()));

        assert!(bridge.set_secret(AUTH_TOKEN_ACCOUNT, "abc123").await.is_success());

        let read = bridge.get_secret(AUTH_TOKEN_ACCOUNT).await;
        assert!(read.is_success());
        assert_eq!(read.value().map(String::as_str), Some("abc123"));

        assert!(bridge.delete_secret(AUTH_TOKEN_ACCOUNT).await.is_success());

        let read = bridge.get_secret(AUTH_TOKEN_ACCOUNT).await;
        assert!(read.is_success(), "absent secret is not an error");
        assert!(read.value().is_none());
        assert!(read.error().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let bridge = bridge_with(Arc::new(InMemoryVault::new()));
        bridge.set_secret("auth-token", "first").await;
        bridge.set_secret("auth-token", "second").await;

        let read = bridge.get_secret("auth-token").await.into_result().unwrap();
        assert_eq!(read.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_vault_failure_becomes_failure_envelope() {
        let mut vault = MockSecretVault::new();
        vault
            .expect_get()
            .returning(|_| Err(VaultError::Backend("keychain locked".to_string())));
        let bridge = bridge_with(Arc::new(vault));

        let response = bridge.get_secret("auth-token").await;
        assert!(!response.is_success());
        assert!(response.value().is_none());
        assert_eq!(response.error(), Some("Credential store error: keychain locked"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let bridge = bridge_with(Arc::new(InMemoryVault::new()));
        assert!(bridge.delete_secret("auth-token").await.is_success());
        assert!(bridge.delete_secret("auth-token").await.is_success());
    }

    #[tokio::test]
    async fn test_dispatch_routes_each_variant() {
        let vault = Arc::new(InMemoryVault::new());
        let bridge = bridge_with(vault.clone());

        let reply = bridge
            .dispatch(BridgeRequest::SetSecret {
                account: "auth-token".to_string(),
                token: "t0k".to_string(),
            })
            .await;
        assert_eq!(reply, BridgeReply::Ack(BridgeResponse::ok_empty()));

        let reply = bridge
            .dispatch(BridgeRequest::GetSecret { account: "auth-token".to_string() })
            .await;
        assert_eq!(reply, BridgeReply::Secret(BridgeResponse::ok(Some("t0k".to_string()))));

        let reply = bridge
            .dispatch(BridgeRequest::DeleteSecret { account: "auth-token".to_string() })
            .await;
        assert!(reply.is_success());
        assert!(vault.keys().is_empty());
    }

    #[test]
    fn test_request_wire_format() {
        let request: BridgeRequest = serde_json::from_value(serde_json::json!({
            "channel": "vault:get",
            "args": { "account": "auth-token" }
        }))
        .unwrap();
        assert_eq!(request, BridgeRequest::GetSecret { account: "auth-token".to_string() });
        assert_eq!(request.channel(), "vault:get");
    }

    #[test]
    fn test_unknown_channel_cannot_be_constructed() {
        let result = serde_json::from_value::<BridgeRequest>(serde_json::json!({
            "channel": "shell:exec",
            "args": { "command": "rm -rf /" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_response_wire_format() {
        let ok = serde_json::to_value(BridgeResponse::ok(Some("abc".to_string()))).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "value": "abc" }));

        let missing = serde_json::to_value(BridgeResponse::<String>::ok(None)).unwrap();
        assert_eq!(missing, serde_json::json!({ "success": true }));

        let failed = serde_json::to_value(BridgeResponse::<String>::failure("denied")).unwrap();
        assert_eq!(failed, serde_json::json!({ "success": false, "error": "denied" }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let request = BridgeRequest::SetSecret {
            account: "auth-token".to_string(),
            token: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", request).contains("hunter2"));

        let response = BridgeResponse::ok(Some("hunter2".to_string()));
        assert!(!format!("{:?}", response).contains("hunter2"));
    }

    #[test]
    fn test_environment_descriptor() {
        assert_eq!(platform_tag("macos"), "darwin");
        assert_eq!(platform_tag("windows"), "win32");
        assert_eq!(platform_tag("linux"), "linux");

        let env = Environment::detect(true);
        assert!(env.is_production);
        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("isProduction").is_some());
    }
}
