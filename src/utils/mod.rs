//! Utility modules for error handling, configuration and platform conventions

pub mod config;
pub mod error;
pub mod platform;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{Result, TubeloaderError};
pub use platform::AssetPlatform;
