//! Playback engine configuration

use crate::error::{Error, Result};
use sdplay_common::config::{
    PlayerSettings, DEFAULT_CHUNK_SAMPLES, DEFAULT_POLL_INTERVAL_MS, DEFAULT_VOLUME,
};
use std::time::Duration;

/// Settings fixed for the lifetime of a [`crate::PlaybackEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Frames per chunk; also the capacity of each mono slot
    pub chunk_samples: usize,

    /// Sink volume applied when the output is acquired (0-255)
    pub volume: u8,

    /// Sleep between busy polls of the sink
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_samples: DEFAULT_CHUNK_SAMPLES,
            volume: DEFAULT_VOLUME,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl EngineConfig {
    /// Build from resolved player settings
    pub fn from_settings(settings: &PlayerSettings) -> Self {
        Self {
            chunk_samples: settings.chunk_samples,
            volume: settings.volume,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }

    pub fn with_chunk_samples(mut self, chunk_samples: usize) -> Self {
        self.chunk_samples = chunk_samples;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_samples == 0 {
            return Err(Error::Config("chunk_samples must be greater than zero".to_string()));
        }
        Ok(())
    }
}
