//! Library entry for metatune exposing the runtime for integration tests.

pub mod app;
pub mod args;
pub mod error;
pub mod events;
pub mod import;
pub mod locator;
pub mod paths;
pub mod picker;
pub mod session;
pub mod settings;
pub mod state;
pub mod store;
pub mod theme;
pub mod ui;

/// Serialize tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn test_mutex() -> &'static std::sync::Mutex<()> {
    static M: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    M.get_or_init(|| std::sync::Mutex::new(()))
}
