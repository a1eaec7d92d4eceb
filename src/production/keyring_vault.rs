//! OS credential store implementation via the `keyring` crate.
//!
//! One keyring entry per account, all under the application service name.
//! Keychain / Credential Manager / kernel keyring calls can block on OS IPC,
//! so each one runs on the blocking pool.

use keyring::Entry;

use crate::traits::{validate_account, SecretVault, VaultError};

pub struct KeyringVault {
    service: String,
}

impl KeyringVault {
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        tracing::debug!(service = %service, "Using OS keyring vault");
        Self { service }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(service: &str, account: &str) -> Result<Entry, VaultError> {
        Entry::new(service, account).map_err(map_keyring_error)
    }
}

fn map_keyring_error(e: keyring::Error) -> VaultError {
    match e {
        keyring::Error::NoStorageAccess(inner) => VaultError::AccessDenied(inner.to_string()),
        other => VaultError::Backend(other.to_string()),
    }
}

async fn run_blocking<T, F>(op: F) -> Result<T, VaultError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, VaultError> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| VaultError::Backend(format!("credential store task failed: {}", e)))?
}

#[async_trait::async_trait]
impl SecretVault for KeyringVault {
    async fn set(&self, account: &str, token: &str) -> Result<(), VaultError> {
        validate_account(account)?;
        let service = self.service.clone();
        let account = account.to_string();
        let token = token.to_string();
        run_blocking(move || {
            Self::entry(&service, &account)?
                .set_password(&token)
                .map_err(map_keyring_error)
        })
        .await
    }

    async fn get(&self, account: &str) -> Result<Option<String>, VaultError> {
        validate_account(account)?;
        let service = self.service.clone();
        let account = account.to_string();
        run_blocking(move || match Self::entry(&service, &account)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(map_keyring_error(e)),
        })
        .await
    }

    async fn delete(&self, account: &str) -> Result<(), VaultError> {
        validate_account(account)?;
        let service = self.service.clone();
        let account = account.to_string();
        run_blocking(move || match Self::entry(&service, &account)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(map_keyring_error(e)),
        })
        .await
    }
}
