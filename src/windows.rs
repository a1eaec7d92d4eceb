//! Window registry
//!
//! Owns every live window handle by id. Windows are registered when the
//! runtime creates them and removed when the runtime reports them destroyed.

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

pub const MAIN_WINDOW: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn main() -> Self {
        Self::new(MAIN_WINDOW)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Window already exists: {0}")]
    AlreadyExists(WindowId),
    #[error("Window registry unavailable")]
    Poisoned,
}

pub struct WindowManager<W> {
    windows: Mutex<HashMap<WindowId, W>>,
}

impl<W: Clone> WindowManager<W> {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly created window. Ids are unique while the window lives.
    pub fn create(&self, id: WindowId, handle: W) -> Result<(), WindowError> {
        let mut windows = self.windows.lock().map_err(|_| WindowError::Poisoned)?;
        if windows.contains_key(&id) {
            return Err(WindowError::AlreadyExists(id));
        }
        tracing::debug!(window = %id, "Window registered");
        windows.insert(id, handle);
        Ok(())
    }

    /// Drop a window; returns its handle if it was registered
    pub fn destroy(&self, id: &WindowId) -> Option<W> {
        let removed = self.windows.lock().ok()?.remove(id);
        if removed.is_some() {
            tracing::debug!(window = %id, "Window destroyed");
        }
        removed
    }

    pub fn get(&self, id: &WindowId) -> Option<W> {
        self.windows.lock().ok()?.get(id).cloned()
    }

    pub fn main(&self) -> Option<W> {
        self.get(&WindowId::main())
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows
            .lock()
            .map(|w| w.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<W: Clone> Default for WindowManager<W> {
    fn default() -> Self {
        Self::new()
    }
}
