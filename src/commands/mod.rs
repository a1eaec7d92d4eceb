//! Tauri commands exposed to the frontend
//!
//! This is the whole privileged surface the webview can reach: three vault
//! calls and the environment descriptor. Each vault command builds a
//! `BridgeRequest` and goes through the bridge's exhaustive dispatch.

use tauri::State;

use crate::bridge::{BridgeReply, BridgeRequest, Environment};
use crate::state::AppState;

/// Store the token for an account
#[tauri::command]
pub async fn vault_set(
    state: State<'_, AppState>,
    account: String,
    token: String,
) -> Result<BridgeReply, String> {
    Ok(state.bridge.dispatch(BridgeRequest::SetSecret { account, token }).await)
}

/// Read the token for an account
#[tauri::command]
pub async fn vault_get(state: State<'_, AppState>, account: String) -> Result<BridgeReply, String> {
    Ok(state.bridge.dispatch(BridgeRequest::GetSecret { account }).await)
}

/// Remove the token for an account
#[tauri::command]
pub async fn vault_delete(
    state: State<'_, AppState>,
    account: String,
) -> Result<BridgeReply, String> {
    Ok(state.bridge.dispatch(BridgeRequest::DeleteSecret { account }).await)
}

/// Platform tag and production flag
#[tauri::command]
pub fn environment(state: State<'_, AppState>) -> Environment {
    state.bridge.environment_descriptor().clone()
}
