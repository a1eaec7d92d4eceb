//! Webview runtime wiring
//!
//! Creates the main window with every isolation policy attached and registers
//! the bridge commands. Policies stay pure; this module applies their
//! decisions and logs refusals.

use std::sync::Arc;

use tauri::utils::config::Csp;
use tauri::{AppHandle, Manager, RunEvent, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tracing_appender::non_blocking::WorkerGuard;

use crate::commands;
use crate::config::{AppConfig, ShellSettings};
use crate::logging::init_logging;
use crate::production::ReqwestTransport;
use crate::security::{enforce_navigation, enforce_window_open, ContentPolicy};
use crate::state::AppState;
use crate::traits::Navigator;
use crate::windows::{WindowId, WindowManager, MAIN_WINDOW};

const WINDOW_TITLE: &str = "SGE Calificaciones";

/// Live window handles, keyed by label
pub struct ShellWindows(pub Arc<WindowManager<WebviewWindow>>);

/// Keeps the log file writer alive
struct LogGuard(#[allow(dead_code)] WorkerGuard);

/// Route control for a webview, used by the API client on 401
pub struct WebviewNavigator {
    window: WebviewWindow,
}

impl WebviewNavigator {
    pub fn new(window: WebviewWindow) -> Self {
        Self { window }
    }
}

impl Navigator for WebviewNavigator {
    fn navigate_to(&self, route: &str) {
        let target = serde_json::Value::String(route.to_string());
        if let Err(e) = self.window.eval(&format!("window.location.assign({})", target)) {
            tracing::error!(route = %route, error = %e, "Failed to navigate webview");
        }
    }

    fn current_route(&self) -> String {
        self.window
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }
}

/// Policy the runtime attaches to the assets it serves itself. The stored
/// config is not open yet, so defaults and the environment pick the API origin;
/// `create_main_window` re-applies the fully resolved policy per response.
fn install_runtime_policy(context: &mut tauri::Context) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ShellSettings::from_sources(&AppConfig::open_in_memory()?, |name| {
        std::env::var(name).ok()
    })?;
    let policy = ContentPolicy::build(&settings.api_base_url)?;
    context.config_mut().app.security.csp = Some(Csp::Policy(policy.as_str().to_string()));
    Ok(())
}

/// Build the Tauri application and run it until exit
pub fn run() {
    let mut context = tauri::generate_context!();
    if let Err(e) = install_runtime_policy(&mut context) {
        eprintln!("error while resolving content security policy: {}", e);
        std::process::exit(1);
    }

    let app = tauri::Builder::default()
        .setup(|app| {
            setup_app(app.handle())?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::vault_set,
            commands::vault_get,
            commands::vault_delete,
            commands::environment,
        ])
        .build(context);

    let app = match app {
        Ok(app) => app,
        Err(e) => {
            eprintln!("error while building tauri application: {}", e);
            std::process::exit(1);
        }
    };

    app.run(|_app_handle, event| match event {
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { has_visible_windows: false, .. } => {
            if _app_handle.state::<ShellWindows>().0.is_empty() {
                if let Err(e) = create_main_window(_app_handle) {
                    tracing::error!(error = %e, "Failed to recreate main window");
                }
            }
        }
        RunEvent::ExitRequested { api, code: None, .. } => {
            // macOS apps stay alive with no windows open
            if cfg!(target_os = "macos") {
                api.prevent_exit();
            }
        }
        _ => {}
    });
}

/// Initialize logging, state and the main window
pub fn setup_app(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = app.path().app_log_dir()?;
    let guard = init_logging(&log_dir)?;
    app.manage(LogGuard(guard));

    tracing::info!("SGE shell starting up");

    let state = AppState::new_production(&app.path().app_data_dir()?)?;
    app.manage(state);
    app.manage(ShellWindows(Arc::new(WindowManager::new())));

    let window = create_main_window(app)?;
    spawn_health_check(app, window);

    tracing::info!("SGE shell initialized");
    Ok(())
}

fn create_main_window(app: &AppHandle) -> Result<WebviewWindow, Box<dyn std::error::Error>> {
    let state = app.state::<AppState>();
    let windows = app.state::<ShellWindows>().0.clone();

    let navigation = state.navigation.clone();
    let content_policy = state.content_policy.clone();

    let url = match &state.settings.start_url {
        Some(dev_url) => WebviewUrl::External(dev_url.parse()?),
        None => WebviewUrl::App("index.html".into()),
    };
    let serves_externally = matches!(url, WebviewUrl::External(_));

    let mut builder = WebviewWindowBuilder::new(app, MAIN_WINDOW, url).title(WINDOW_TITLE);
    if serves_externally {
        // Dev server responses never pass through the runtime, so the
        // header hook below cannot reach them
        builder = builder.initialization_script(&content_policy.meta_installer_script());
    }

    let window = builder
        .inner_size(1280.0, 800.0)
        .min_inner_size(1024.0, 768.0)
        .on_navigation(move |url| enforce_navigation(&navigation, url))
        .on_new_window(|url, _features| {
            enforce_window_open(url.as_str());
            tauri::webview::NewWindowResponse::Deny
        })
        .on_web_resource_request(move |_request, response| {
            content_policy.apply(response.headers_mut());
        })
        .build()?;

    #[cfg(debug_assertions)]
    {
        if !state.settings.is_production {
            window.open_devtools();
        }
    }

    windows.create(WindowId::main(), window.clone())?;
    let registry = windows.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::Destroyed = event {
            registry.destroy(&WindowId::main());
        }
    });

    tracing::info!(window = MAIN_WINDOW, "Main window created");
    Ok(window)
}

fn spawn_health_check(app: &AppHandle, window: WebviewWindow) {
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let state = app.state::<AppState>();
        let transport = match ReqwestTransport::new(state.settings.request_timeout) {
            Ok(t) => Arc::new(t),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build API transport");
                return;
            }
        };
        let client = match state.api_client(transport, Arc::new(WebviewNavigator::new(window))) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to build API client");
                return;
            }
        };
        match client.check_health().await {
            Ok(payload) => tracing::info!(status = %payload["status"], "Backend health check"),
            Err(e) => tracing::warn!(error = %e, "Backend health check failed"),
        }
    });
}
