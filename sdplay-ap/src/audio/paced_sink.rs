//! Simulated real-time sink
//!
//! Holds each submitted buffer for exactly as long as the hardware would need
//! to play it (`sample_count / sample_rate` seconds) and then releases it.
//! Used when no device backend is compiled in, and as a timing-faithful
//! stand-in for a speaker.

use crate::audio::sink::{PlaybackSink, SlotBuffer};
use crate::error::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info};

struct InFlight {
    _buffer: SlotBuffer,
    deadline: Instant,
}

/// Sink that consumes audio at the nominal sample rate without producing sound
#[derive(Default)]
pub struct PacedSink {
    active: bool,
    volume: u8,
    in_flight: Option<InFlight>,
    submitted_samples: u64,
}

impl PacedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback time of `sample_count` samples at `sample_rate`
    /// (zero for a zero rate)
    pub fn play_duration(sample_count: usize, sample_rate: u32) -> Duration {
        if sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(sample_count as f64 / sample_rate as f64)
    }

    /// Total samples accepted since construction
    pub fn submitted_samples(&self) -> u64 {
        self.submitted_samples
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }
}

impl PlaybackSink for PacedSink {
    fn begin(&mut self) -> Result<()> {
        self.active = true;
        info!("Simulated output acquired");
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.active = false;
        self.in_flight = None;
        info!("Simulated output released");
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume = volume;
        debug!("Volume set to {}", volume);
    }

    fn submit(&mut self, buffer: SlotBuffer, sample_count: usize, sample_rate: u32) -> Result<()> {
        if !self.active {
            return Err(Error::AudioOutput("submit before begin".to_string()));
        }
        if sample_rate == 0 || sample_count > buffer.len() {
            return Err(Error::AudioOutput(format!(
                "invalid submission: {} samples of {} at {} Hz",
                sample_count,
                buffer.len(),
                sample_rate
            )));
        }

        self.in_flight = Some(InFlight {
            _buffer: buffer,
            deadline: Instant::now() + Self::play_duration(sample_count, sample_rate),
        });
        self.submitted_samples += sample_count as u64;
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        match &self.in_flight {
            Some(flight) if Instant::now() < flight.deadline => true,
            Some(_) => {
                self.in_flight = None;
                false
            }
            None => false,
        }
    }
}
