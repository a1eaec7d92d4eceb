//! Hooks into the hosting UI that the API client drives

/// Route control for the untrusted UI
///
/// Production: webview location change
/// Testing: Recorded routes
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Force the UI onto a route (e.g. `/login`)
    fn navigate_to(&self, route: &str);

    /// The route currently shown
    fn current_route(&self) -> String;
}
