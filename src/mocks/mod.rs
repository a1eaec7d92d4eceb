//! Test doubles for dependency injection
//!
//! Provides in-memory implementations of the OS vault, the HTTP transport and
//! the UI host for isolated testing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::traits::{
    validate_account, ApiError, ApiRequest, ApiResponse, HttpTransport, Navigator, SecretVault,
    VaultError,
};

// ============================================================================
// InMemoryVault
// ============================================================================

/// In-memory secret vault for testing
///
/// Thread-safe storage backed by HashMap. No actual keychain interaction.
/// `fail_with` makes every subsequent call fail, for exercising error envelopes.
#[derive(Clone)]
pub struct InMemoryVault {
    secrets: Arc<Mutex<HashMap<String, String>>>,
    failure: Arc<Mutex<Option<VaultError>>>,
    delete_calls: Arc<Mutex<usize>>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(Mutex::new(HashMap::new())),
            failure: Arc::new(Mutex::new(None)),
            delete_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Create vault with pre-populated secrets
    pub fn with_entries(entries: Vec<(&str, &str)>) -> Self {
        let vault = Self::new();
        {
            let mut map = vault.secrets.lock().unwrap();
            for (account, token) in entries {
                map.insert(account.to_string(), token.to_string());
            }
        }
        vault
    }

    /// Make every subsequent call fail with `error`
    pub fn fail_with(&self, error: VaultError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Get all stored accounts (for assertions)
    pub fn keys(&self) -> Vec<String> {
        self.secrets.lock().unwrap().keys().cloned().collect()
    }

    /// Read a secret without going through the trait (for assertions)
    pub fn peek(&self, account: &str) -> Option<String> {
        self.secrets.lock().unwrap().get(account).cloned()
    }

    /// Number of delete calls received
    pub fn delete_calls(&self) -> usize {
        *self.delete_calls.lock().unwrap()
    }

    fn check_failure(&self) -> Result<(), VaultError> {
        match self.failure.lock().unwrap().as_ref() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretVault for InMemoryVault {
    async fn set(&self, account: &str, token: &str) -> Result<(), VaultError> {
        validate_account(account)?;
        self.check_failure()?;
        self.secrets.lock().unwrap().insert(account.to_string(), token.to_string());
        Ok(())
    }

    async fn get(&self, account: &str) -> Result<Option<String>, VaultError> {
        validate_account(account)?;
        self.check_failure()?;
        Ok(self.secrets.lock().unwrap().get(account).cloned())
    }

    async fn delete(&self, account: &str) -> Result<(), VaultError> {
        validate_account(account)?;
        *self.delete_calls.lock().unwrap() += 1;
        self.check_failure()?;
        self.secrets.lock().unwrap().remove(account);
        Ok(())
    }
}

// ============================================================================
// RecordedTransport
// ============================================================================

/// Response configuration for the recorded transport
#[derive(Clone)]
pub enum TransportBehavior {
    /// Always answer with the given status and body
    Respond { status: u16, body: Option<String> },
    /// Always fail with given error
    AlwaysFail(ApiError),
    /// Never answer (for timeout tests)
    Stall,
    /// Custom response based on request
    Custom(Arc<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>),
}

/// Recorded HTTP transport for testing
///
/// Records all requests and provides configurable responses.
#[derive(Clone)]
pub struct RecordedTransport {
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    behavior: Arc<Mutex<TransportBehavior>>,
}

impl RecordedTransport {
    pub fn new() -> Self {
        Self::responding(200, Some(r#"{"status":"healthy"}"#))
    }

    /// Always answer with `status` and `body`
    pub fn responding(status: u16, body: Option<&str>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            behavior: Arc::new(Mutex::new(TransportBehavior::Respond {
                status,
                body: body.map(str::to_string),
            })),
        }
    }

    /// Always answer 401
    pub fn unauthorized() -> Self {
        Self::responding(401, Some(r#"{"detail":"Could not validate credentials"}"#))
    }

    pub fn always_fail(error: ApiError) -> Self {
        let client = Self::new();
        client.set_behavior(TransportBehavior::AlwaysFail(error));
        client
    }

    pub fn stalled() -> Self {
        let client = Self::new();
        client.set_behavior(TransportBehavior::Stall);
        client
    }

    pub fn custom(
        func: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Self {
        let client = Self::new();
        client.set_behavior(TransportBehavior::Custom(Arc::new(func)));
        client
    }

    /// Set the behavior for subsequent calls
    pub fn set_behavior(&self, behavior: TransportBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Get all recorded requests
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Clear recorded requests
    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl Default for RecordedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for RecordedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            TransportBehavior::Respond { status, body } => Ok(ApiResponse {
                status,
                body,
                duration_ms: 1,
            }),
            TransportBehavior::AlwaysFail(error) => Err(error),
            TransportBehavior::Stall => futures::future::pending().await,
            TransportBehavior::Custom(func) => func(&request),
        }
    }
}

// ============================================================================
// RecordingNavigator
// ============================================================================

/// UI host stand-in that records forced navigations
#[derive(Clone)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::starting_at("/")
    }

    pub fn starting_at(route: &str) -> Self {
        Self {
            history: Arc::new(Mutex::new(vec![route.to_string()])),
        }
    }

    /// All routes visited, including the starting one
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }

    /// Number of forced navigations (excludes the starting route)
    pub fn navigation_count(&self) -> usize {
        self.history.lock().unwrap().len().saturating_sub(1)
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to(&self, route: &str) {
        self.history.lock().unwrap().push(route.to_string());
    }

    fn current_route(&self) -> String {
        self.history
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
