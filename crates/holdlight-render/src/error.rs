//! Error types for the render transports
use holdlight_core::{CoreError, Location};
use thiserror::Error;

/// Renderer errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// I/O failure on the wire (socket send, serial write). The frame is lost.
    #[error("{transport} transport error: {source}")]
    Transport {
        transport: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Failure reported by a GPIO/PWM hardware driver. The frame is lost.
    #[error("{transport} hardware error: {message}")]
    Hardware {
        transport: &'static str,
        message: String,
    },

    /// Pixel addressed to a universe the transport cannot drive
    #[error("Pixel at {location} is on universe {universe}, transport only drives universe 0")]
    InvalidUniverseAccess { universe: u16, location: Location },

    /// Pixel addressed to an output the transport does not have
    #[error("Channel {channel} is not available (transport has {available} outputs)")]
    ChannelOutOfRange { channel: u16, available: usize },

    /// Invalid renderer construction parameter
    #[error("Invalid renderer configuration: {0}")]
    Validation(String),

    /// Data model error
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RenderError {
    pub fn transport(transport: &'static str, source: std::io::Error) -> Self {
        Self::Transport { transport, source }
    }

    pub fn hardware(transport: &'static str, err: impl std::fmt::Debug) -> Self {
        Self::Hardware {
            transport,
            message: format!("{:?}", err),
        }
    }

    /// True for per-frame wire/hardware failures; false for precondition
    /// violations that will fail again on every frame.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Hardware { .. })
    }
}

/// Result type for render operations
pub type Result<T> = std::result::Result<T, RenderError>;
