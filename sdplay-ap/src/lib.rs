//! # sdplay Audio Player Library (sdplay-ap)
//!
//! Streaming WAV playback with bounded memory.
//!
//! **Purpose:** Read 16-bit PCM WAV from storage in fixed-size chunks,
//! downmix to mono in-flight and keep an asynchronous sink fed without gaps,
//! using exactly two alternating mono slots.
//!
//! **Architecture:** header validator → chunk reader → downmix → double-buffer
//! scheduler → [`audio::PlaybackSink`]

pub mod audio;
pub mod config;
pub mod error;
pub mod playback;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use playback::{PlaybackEngine, PlaybackReport};
