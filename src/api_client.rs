//! Authenticated client for the backend API
//!
//! Every request looks the bearer token up through the secret bridge right
//! before dispatch; nothing is cached between requests. A 401 purges the
//! token, sends the UI to the login route and still fails the call so the
//! caller can react. Without a bridge (plain browser tab) requests go out
//! anonymously and the purge step is skipped.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::bridge::AUTH_TOKEN_ACCOUNT;
use crate::config::ShellSettings;
use crate::traits::{ApiError, ApiRequest, ApiResponse, HttpTransport, Navigator, SecretBridge};

pub const HEALTH_PATH: &str = "/health";
pub const LOGIN_PATH: &str = "/auth/login";
pub const CURRENT_USER_PATH: &str = "/auth/me";

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: u64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// What a successful login reports back; the token itself stays in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub token_type: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: String,
}

pub struct ApiClient {
    base_url: Url,
    timeout: Duration,
    login_route: String,
    account: String,
    transport: Arc<dyn HttpTransport>,
    bridge: Option<Arc<dyn SecretBridge>>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        settings: &ShellSettings,
        transport: Arc<dyn HttpTransport>,
        bridge: Option<Arc<dyn SecretBridge>>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&settings.api_base_url)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        if bridge.is_none() {
            tracing::info!("No secret bridge available; API requests will be anonymous");
        }

        Ok(Self {
            base_url,
            timeout: settings.request_timeout,
            login_route: settings.login_route.clone(),
            account: AUTH_TOKEN_ACCOUNT.to_string(),
            transport,
            bridge,
            navigator,
        })
    }

    /// Use a different vault account for the token
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    /// Absolute URL for an API path, relative to the base URL.
    /// Paths that resolve to another origin are refused.
    pub fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if url.origin() != self.base_url.origin() {
            return Err(ApiError::InvalidUrl(format!(
                "{} is outside the API origin {}",
                url,
                self.base_url.origin().ascii_serialization()
            )));
        }
        Ok(url.into())
    }

    /// Whether `url` points at the backend this client authenticates against
    fn is_backend_url(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| u.origin() == self.base_url.origin())
            .unwrap_or(false)
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(self.endpoint(path)?)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.send(ApiRequest::post_json(self.endpoint(path)?, body)).await
    }

    /// Attach the stored token, dispatch, and handle authentication failure
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        // The token only ever travels to the backend origin
        let request = if self.is_backend_url(&request.url) {
            match self.stored_token().await {
                Some(token) => request.with_bearer(&token),
                None => request,
            }
        } else {
            tracing::warn!(url = %request.url, "Request outside the API origin; sending without token");
            request
        };

        let url = request.url.clone();
        let response = match tokio::time::timeout(self.timeout, self.transport.execute(request)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(url = %url, timeout_secs = self.timeout.as_secs(), "API request timed out");
                return Err(ApiError::Timeout);
            }
        };

        if response.status == 401 {
            self.handle_authentication_failure().await;
            return Err(ApiError::AuthenticationExpired);
        }

        if !response.is_success() {
            tracing::debug!(url = %url, status = response.status, "API error response");
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }

    async fn stored_token(&self) -> Option<String> {
        let bridge = self.bridge.as_ref()?;
        match bridge.get_secret(&self.account).await.into_result() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(account = %self.account, error = %e, "Token lookup failed; sending anonymously");
                None
            }
        }
    }

    async fn purge_token(&self) -> Result<(), ApiError> {
        let Some(bridge) = self.bridge.as_ref() else {
            return Ok(());
        };
        bridge
            .delete_secret(&self.account)
            .await
            .into_result()
            .map(|_| ())
            .map_err(ApiError::Bridge)
    }

    async fn handle_authentication_failure(&self) {
        tracing::info!(account = %self.account, "Authentication expired; returning to login");
        if let Err(e) = self.purge_token().await {
            tracing::error!(account = %self.account, error = %e, "Failed to purge expired token");
        }
        self.navigator.navigate_to(&self.login_route);
    }

    /// `GET /health`; returns the backend's payload untouched
    pub async fn check_health(&self) -> Result<serde_json::Value, ApiError> {
        self.get(HEALTH_PATH).await?.json()
    }

    /// Exchange credentials for a token and store it in the vault
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let bridge = self
            .bridge
            .as_ref()
            .ok_or_else(|| ApiError::Bridge("secret bridge unavailable; cannot store token".to_string()))?;

        let response = self
            .post_json(LOGIN_PATH, &Credentials { username, password })
            .await?;
        let grant: TokenResponse = response.json()?;

        bridge
            .set_secret(&self.account, &grant.access_token)
            .await
            .into_result()
            .map_err(ApiError::Bridge)?;

        tracing::info!(username = %username, expires_in = grant.expires_in, "Logged in");
        Ok(LoginOutcome {
            token_type: grant.token_type,
            expires_in: grant.expires_in,
        })
    }

    /// Forget the token and return to the login route
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.purge_token().await;
        self.navigator.navigate_to(&self.login_route);
        tracing::info!(account = %self.account, purged = result.is_ok(), "Logged out");
        result
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get(CURRENT_USER_PATH).await?.json()
    }
}
