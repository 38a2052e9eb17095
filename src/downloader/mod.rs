//! Download orchestration and progress parsing

pub mod orchestrator;
pub mod progress;
pub mod request;

// Re-export for convenience
pub use orchestrator::{DownloadCompletion, DownloadOrchestrator, DownloadTask};
pub use progress::{ProgressEvent, ProgressParser, UNKNOWN};
pub use request::{DownloadOptions, DownloadRequest, OutputContainer, DEFAULT_OUTPUT_TEMPLATE};
