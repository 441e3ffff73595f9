//! Error types for sdplay-ap
//!
//! Every failure is detected locally and ends the playback session early.
//! Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for sdplay-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Storage path missing or unreadable; no audio emitted
    #[error("Failed to open {path:?}: {source}")]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header tags or layout do not describe a canonical WAV file
    #[error("Invalid WAV format: {0}")]
    InvalidFormat(String),

    /// Well-formed header describing an encoding we do not play
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Channel count outside {1, 2}
    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    /// Valid header followed by no audio data
    #[error("No audio data to play")]
    EmptyStream,

    /// Slot or scratch buffers could not be allocated
    #[error("Failed to allocate {requested} bytes of playback buffers")]
    AllocationFailure { requested: usize },

    /// Storage read failed after playback started
    #[error("Read failure: {0}")]
    ReadFailure(#[source] std::io::Error),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Producer tried to write a slot the sink still holds
    #[error("Slot {0} is still owned by the sink")]
    SlotInUse(usize),

    /// Heartbeat requested that playback stop
    #[error("Playback cancelled")]
    Cancelled,

    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using sdplay-ap Error
pub type Result<T> = std::result::Result<T, Error>;
