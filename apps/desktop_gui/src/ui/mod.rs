//! UI layer for desktop GUI: app shell, panels and forms.

pub mod app;

pub use app::{AppPaths, NumberSocialApp, StartupConfig};
