//! Secret vault trait for the OS credential store

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("Invalid account name: {0:?}")]
    InvalidAccount(String),
    #[error("Access to the credential store was denied: {0}")]
    AccessDenied(String),
    #[error("Credential store error: {0}")]
    Backend(String),
}

/// Trait for the single-secret OS vault
///
/// Production: OS keychain via `keyring` crate
/// Testing: In-memory HashMap
///
/// Every account is namespaced under one application service identifier.
/// Failures are returned as `VaultError`, never retried here.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SecretVault: Send + Sync {
    /// Store (or overwrite) the secret for an account
    async fn set(&self, account: &str, token: &str) -> Result<(), VaultError>;

    /// Read the secret for an account; `None` when absent
    async fn get(&self, account: &str) -> Result<Option<String>, VaultError>;

    /// Remove the secret for an account; removing an absent secret succeeds
    async fn delete(&self, account: &str) -> Result<(), VaultError>;
}

/// Reject account names the OS stores cannot key on.
pub fn validate_account(account: &str) -> Result<(), VaultError> {
    if account.trim().is_empty() {
        return Err(VaultError::InvalidAccount(account.to_string()));
    }
    Ok(())
}
