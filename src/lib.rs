pub mod aggregate;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod render;

/// Application name for XDG paths
pub const APP_NAME: &str = "streamdash";
