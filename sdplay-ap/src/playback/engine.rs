//! Playback engine
//!
//! Owns the sink, the microphone handle and the playback buffers (two mono
//! slots plus the raw scratch chunk). Buffers are allocated once at
//! construction, so an allocation failure surfaces from [`PlaybackEngine::new`]
//! rather than mid-playback.
//!
//! Per play call:
//! 1. open the file ([`Error::OpenFailure`] on failure)
//! 2. validate the header; rejected streams never touch the hardware
//! 3. disable the microphone, acquire the sink, set the volume
//! 4. run a [`PlaybackSession`]
//! 5. release the sink and re-enable the microphone, on every outcome

use crate::audio::chunk_reader::{ChunkReader, RawChunk};
use crate::audio::sink::{Heartbeat, Microphone, NoHeartbeat, NoMicrophone, PlaybackSink};
use crate::audio::wav::WavHeader;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::playback::scheduler::{PlaybackSession, SessionStats};
use crate::playback::slots::SlotPair;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Outcome of a completed playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub header: WavHeader,
    pub chunks_submitted: usize,
    pub samples_submitted: u64,
    pub busy_polls: u64,
    /// Wall time from hardware acquisition to release
    pub elapsed: Duration,
}

impl PlaybackReport {
    fn new(header: WavHeader, stats: SessionStats, elapsed: Duration) -> Self {
        Self {
            header,
            chunks_submitted: stats.chunks_submitted,
            samples_submitted: stats.samples_submitted,
            busy_polls: stats.busy_polls,
            elapsed,
        }
    }

    /// Audio duration of the submitted samples
    pub fn audio_duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples_submitted as f64 / self.header.sample_rate as f64)
    }
}

/// Streaming WAV player over a [`PlaybackSink`]
pub struct PlaybackEngine<S, M = NoMicrophone> {
    sink: S,
    microphone: M,
    config: EngineConfig,
    slots: SlotPair,
    scratch: RawChunk,
}

impl<S: PlaybackSink> PlaybackEngine<S, NoMicrophone> {
    /// Create an engine for hosts without a microphone
    pub fn new(sink: S, config: EngineConfig) -> Result<Self> {
        Self::with_microphone(sink, NoMicrophone, config)
    }
}

impl<S: PlaybackSink, M: Microphone> PlaybackEngine<S, M> {
    /// Create an engine, allocating both slots and the scratch chunk
    pub fn with_microphone(sink: S, microphone: M, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let slots = SlotPair::new(config.chunk_samples)?;
        let scratch = RawChunk::with_capacity(config.chunk_samples)?;

        info!("Buffer allocated: {} samples x 2", config.chunk_samples);

        Ok(Self {
            sink,
            microphone,
            config,
            slots,
            scratch,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn microphone(&self) -> &M {
        &self.microphone
    }

    /// Take back the sink and microphone
    pub fn into_parts(self) -> (S, M) {
        (self.sink, self.microphone)
    }

    /// Play a WAV file without a heartbeat
    pub fn play(&mut self, path: impl AsRef<Path>) -> Result<PlaybackReport> {
        self.play_file(path, &mut NoHeartbeat)
    }

    /// Play a WAV file, ticking `heartbeat` while waiting on the sink
    pub fn play_file<H>(&mut self, path: impl AsRef<Path>, heartbeat: &mut H) -> Result<PlaybackReport>
    where
        H: Heartbeat + ?Sized,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            error!("Failed to open {}: {}", path.display(), source);
            Error::OpenFailure {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!("Playing {}", path.display());
        self.play_reader(BufReader::new(file), heartbeat)
    }

    /// Play a WAV stream positioned at its first header byte
    pub fn play_reader<R, H>(&mut self, mut reader: R, heartbeat: &mut H) -> Result<PlaybackReport>
    where
        R: Read,
        H: Heartbeat + ?Sized,
    {
        let header = WavHeader::read_from(&mut reader).map_err(|e| {
            warn!("Invalid WAV file: {}", e);
            e
        })?;
        let channels = header.channels()?;

        info!(
            "SampleRate: {} Hz, Bits: {}, Channels: {}",
            header.sample_rate, header.bits_per_sample, header.num_channels
        );

        self.acquire_output()?;
        let started = Instant::now();

        let outcome = {
            let mut chunks = ChunkReader::new(reader, channels, self.config.chunk_samples);
            let mut session = PlaybackSession::new(
                &mut self.sink,
                heartbeat,
                &mut self.slots,
                &mut self.scratch,
                header.sample_rate,
                self.config.poll_interval,
            );
            session.run(&mut chunks)
        };

        let released = self.release_output();
        let elapsed = started.elapsed();

        let stats = match outcome {
            Ok(stats) => stats,
            Err(Error::EmptyStream) => {
                warn!("No data to play");
                return Err(Error::EmptyStream);
            }
            Err(e) => {
                error!("Playback failed: {}", e);
                return Err(e);
            }
        };
        released?;

        let report = PlaybackReport::new(header, stats, elapsed);
        info!(
            "Playback done: {} chunks, {} samples ({:.2}s of audio)",
            report.chunks_submitted,
            report.samples_submitted,
            report.audio_duration().as_secs_f64()
        );
        Ok(report)
    }

    /// Hand the audio hardware from the microphone to the sink
    fn acquire_output(&mut self) -> Result<()> {
        self.microphone.disable();
        if let Err(e) = self.sink.begin() {
            error!("Failed to acquire audio output: {}", e);
            self.microphone.enable();
            return Err(e);
        }
        self.sink.set_volume(self.config.volume);
        Ok(())
    }

    /// Hand the audio hardware back to the microphone
    fn release_output(&mut self) -> Result<()> {
        let result = self.sink.end();
        if let Err(e) = &result {
            error!("Failed to release audio output: {}", e);
        }
        self.microphone.enable();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::paced_sink::PacedSink;
    use std::io::Cursor;

    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        let mut bytes = WavHeader::pcm16(channels, sample_rate, data.len() as u32)
            .to_bytes()
            .to_vec();
        bytes.extend_from_slice(&data);
        bytes
    }

    #[test]
    fn test_plays_through_paced_sink() {
        let config = EngineConfig::default()
            .with_chunk_samples(64)
            .with_poll_interval(Duration::ZERO);
        let mut engine = PlaybackEngine::new(PacedSink::new(), config).unwrap();

        let samples = vec![100i16; 400];
        let report = engine
            .play_reader(Cursor::new(wav_bytes(1, 48000, &samples)), &mut NoHeartbeat)
            .unwrap();

        assert_eq!(report.chunks_submitted, 7);
        assert_eq!(report.samples_submitted, 400);
        assert_eq!(engine.sink().submitted_samples(), 400);
        assert_eq!(engine.sink().volume(), 200);
    }

    #[test]
    fn test_open_failure() {
        let mut engine = PlaybackEngine::new(PacedSink::new(), EngineConfig::default()).unwrap();
        let result = engine.play("/nonexistent/sdplay/test.wav");
        assert!(matches!(result, Err(Error::OpenFailure { .. })));
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let config = EngineConfig::default().with_chunk_samples(0);
        assert!(matches!(
            PlaybackEngine::new(PacedSink::new(), config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_allocation_failure_at_construction() {
        let config = EngineConfig::default().with_chunk_samples(usize::MAX / 2);
        assert!(matches!(
            PlaybackEngine::new(PacedSink::new(), config),
            Err(Error::AllocationFailure { .. })
        ));
    }

    #[test]
    fn test_audio_duration() {
        let report = PlaybackReport {
            header: WavHeader::pcm16(1, 16000, 0),
            chunks_submitted: 2,
            samples_submitted: 8000,
            busy_polls: 0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(report.audio_duration(), Duration::from_millis(500));
    }
}
