//! Application state management

use std::path::Path;
use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::bridge::{Environment, PrivilegedBridge, SERVICE_NAME};
use crate::config::{AppConfig, ConfigError, ShellSettings};
use crate::production::KeyringVault;
use crate::security::{ContentPolicy, NavigationPolicy};
use crate::traits::{ApiError, HttpTransport, Navigator, SecretBridge, SecretVault};

/// Everything the privileged side needs for the lifetime of the app
pub struct AppState {
    pub settings: ShellSettings,
    pub config: Arc<AppConfig>,
    pub bridge: Arc<PrivilegedBridge>,
    pub navigation: NavigationPolicy,
    pub content_policy: ContentPolicy,
}

impl AppState {
    /// Create a new AppState backed by the OS keyring and an on-disk config
    pub fn new_production(data_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        tracing::info!("Initializing AppState");

        std::fs::create_dir_all(data_dir)?;
        let config_path = data_dir.join("config.sqlite");
        tracing::info!(path = %config_path.display(), "Opening config database");
        let config = Arc::new(AppConfig::open(&config_path)?);
        let settings = ShellSettings::load(&config)?;

        let vault: Arc<dyn SecretVault> = Arc::new(KeyringVault::new(SERVICE_NAME));
        Ok(Self::with_vault(config, settings, vault)?)
    }

    /// Assemble state around any vault (tests use the in-memory one)
    pub fn with_vault(
        config: Arc<AppConfig>,
        settings: ShellSettings,
        vault: Arc<dyn SecretVault>,
    ) -> Result<Self, ConfigError> {
        let content_policy = ContentPolicy::build(&settings.api_base_url)?;
        let navigation = NavigationPolicy::new(&settings.allowed_origins);
        let bridge = Arc::new(PrivilegedBridge::new(
            vault,
            Environment::detect(settings.is_production),
        ));

        Ok(Self {
            settings,
            config,
            bridge,
            navigation,
            content_policy,
        })
    }

    /// API client whose token lookups go through this state's bridge
    pub fn api_client(
        &self,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<ApiClient, ApiError> {
        let bridge: Arc<dyn SecretBridge> = self.bridge.clone();
        ApiClient::new(&self.settings, transport, Some(bridge), navigator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{InMemoryVault, RecordedTransport, RecordingNavigator};

    fn test_state(vault: InMemoryVault) -> AppState {
        let config = Arc::new(AppConfig::open_in_memory().unwrap());
        AppState::with_vault(config, ShellSettings::default(), Arc::new(vault)).unwrap()
    }

    #[test]
    fn test_state_builds_policies_from_settings() {
        let state = test_state(InMemoryVault::new());

        assert_eq!(
            state.content_policy.directive("connect-src"),
            Some("'self' http://localhost:8000")
        );
        assert!(state.navigation.decide("http://localhost:3000/").is_allowed());
        assert!(!state.navigation.decide("https://example.com/").is_allowed());
        assert_eq!(
            state.bridge.environment_descriptor().is_production,
            state.settings.is_production
        );
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let config = Arc::new(AppConfig::open_in_memory().unwrap());
        let settings = ShellSettings {
            api_base_url: "nope".to_string(),
            ..ShellSettings::default()
        };
        assert!(AppState::with_vault(config, settings, Arc::new(InMemoryVault::new())).is_err());
    }

    #[tokio::test]
    async fn test_api_client_uses_state_bridge() {
        let vault = InMemoryVault::with_entries(vec![("auth-token", "abc123")]);
        let state = test_state(vault);
        let transport = RecordedTransport::new();

        let client = state
            .api_client(Arc::new(transport.clone()), Arc::new(RecordingNavigator::new()))
            .unwrap();
        client.check_health().await.unwrap();

        assert_eq!(transport.requests()[0].bearer_token(), Some("abc123"));
    }
}
