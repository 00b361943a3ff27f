//! Error types for the frame loop
use holdlight_core::CoreError;
use holdlight_render::RenderError;
use thiserror::Error;

/// Control errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Render failure that ended the loop
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Data model error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A runner is already active
    #[error("Runner '{0}' is already running")]
    AlreadyStarted(String),

    /// The renderer was lost with a runner that could not be recovered
    #[error("No renderer available")]
    RendererUnavailable,

    /// Runner thread could not be created
    #[error("Failed to spawn runner thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Transport kept failing
    #[error("Stopped after {count} consecutive failed frames, last: {last}")]
    TooManyFailures { count: u32, last: RenderError },

    /// Runner thread panicked
    #[error("Runner thread panicked")]
    Poisoned,
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
