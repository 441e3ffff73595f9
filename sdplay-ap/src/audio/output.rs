//! Audio output using cpal
//!
//! [`CpalSink`] implements [`PlaybackSink`] on top of a cpal output stream.
//! The mono slot is duplicated to every device channel. The stream is opened
//! at the sample rate of the submitted buffer; no resampling is done, so a
//! device that cannot run at that rate is reported as an error.

use crate::audio::sink::{PlaybackSink, SlotBuffer};
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Buffer currently being consumed by the audio callback
#[derive(Default)]
struct Playhead {
    buffer: Option<SlotBuffer>,
    len: usize,
    pos: usize,
}

impl Playhead {
    /// Next sample, releasing the buffer after the last one
    fn next_sample(&mut self, busy: &AtomicBool) -> i16 {
        let Some(buffer) = self.buffer.as_ref() else {
            return 0;
        };
        let sample = buffer[self.pos];
        self.pos += 1;
        if self.pos >= self.len {
            self.buffer = None;
            busy.store(false, Ordering::Release);
        }
        sample
    }
}

/// Audio output sink using cpal
pub struct CpalSink {
    requested_device: Option<String>,
    device: Option<Device>,
    stream: Option<Stream>,
    stream_rate: Option<u32>,
    playhead: Arc<Mutex<Playhead>>,
    busy: Arc<AtomicBool>,
    volume: Arc<Mutex<f32>>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
}

impl CpalSink {
    /// List available audio output devices
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .output_devices()
            .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} output devices", devices.len());
        Ok(devices)
    }

    /// Create a sink for `device_name` (None = default device).
    ///
    /// The device is opened by [`PlaybackSink::begin`].
    pub fn new(device_name: Option<String>) -> Self {
        Self {
            requested_device: device_name,
            device: None,
            stream: None,
            stream_rate: None,
            playhead: Arc::new(Mutex::new(Playhead::default())),
            busy: Arc::new(AtomicBool::new(false)),
            volume: Arc::new(Mutex::new(1.0)),
            error_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Find the requested device, falling back to the default device
    fn open_device(&self) -> Result<Device> {
        let host = cpal::default_host();

        if let Some(name) = self.requested_device.as_ref() {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;

            if let Some(dev) = devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                info!("Found requested audio device: {}", name);
                return Ok(dev);
            }
            warn!("Requested device '{}' not found, falling back to default device", name);
        }

        let dev = host
            .default_output_device()
            .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;
        info!(
            "Using default audio device: {}",
            dev.name().unwrap_or_else(|_| "Unknown".to_string())
        );
        Ok(dev)
    }

    /// Pick a device configuration running at `sample_rate`.
    ///
    /// Prefers fewer channels and i16 samples, matching the source format.
    fn config_for_rate(device: &Device, sample_rate: u32) -> Result<(StreamConfig, SampleFormat)> {
        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let best = supported
            .filter(|c| {
                c.min_sample_rate().0 <= sample_rate && c.max_sample_rate().0 >= sample_rate
            })
            .filter(|c| {
                matches!(
                    c.sample_format(),
                    SampleFormat::I16 | SampleFormat::F32 | SampleFormat::U16
                )
            })
            .min_by_key(|c| (c.channels(), c.sample_format() != SampleFormat::I16))
            .ok_or_else(|| {
                Error::AudioOutput(format!("Device cannot play at {} Hz", sample_rate))
            })?;

        let sample_format = best.sample_format();
        let config = best.with_sample_rate(cpal::SampleRate(sample_rate)).config();
        Ok((config, sample_format))
    }

    /// (Re)build the stream if the sample rate changed
    fn ensure_stream(&mut self, sample_rate: u32) -> Result<()> {
        if self.stream.is_some() && self.stream_rate == Some(sample_rate) {
            return Ok(());
        }

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| Error::AudioOutput("submit before begin".to_string()))?;
        let (config, sample_format) = Self::config_for_rate(device, sample_rate)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        let stream = match sample_format {
            SampleFormat::I16 => self.build_stream::<i16>(device, &config)?,
            SampleFormat::F32 => self.build_stream::<f32>(device, &config)?,
            SampleFormat::U16 => self.build_stream::<u16>(device, &config)?,
            other => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        self.stream_rate = Some(sample_rate);
        info!("Audio stream started at {} Hz", sample_rate);
        Ok(())
    }

    fn build_stream<T>(&self, device: &Device, config: &StreamConfig) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels as usize;
        let playhead = Arc::clone(&self.playhead);
        let busy = Arc::clone(&self.busy);
        let volume = Arc::clone(&self.volume);
        let error_flag = Arc::clone(&self.error_flag);
        let error_busy = Arc::clone(&self.busy);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let gain = volume.lock().map(|v| *v).unwrap_or(0.0);
                    let Ok(mut head) = playhead.lock() else {
                        return;
                    };

                    for frame in data.chunks_mut(channels) {
                        let sample = head.next_sample(&busy) as f32 / 32768.0 * gain;
                        let value = T::from_sample(sample.clamp(-1.0, 1.0));
                        for out in frame.iter_mut() {
                            *out = value;
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                    error_busy.store(false, Ordering::Release);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }
}

impl PlaybackSink for CpalSink {
    fn begin(&mut self) -> Result<()> {
        self.device = Some(self.open_device()?);
        self.error_flag.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        info!("Stopping audio stream");

        if let Some(stream) = self.stream.take() {
            stream
                .pause()
                .map_err(|e| Error::AudioOutput(format!("Failed to pause stream: {}", e)))?;
        }
        self.stream_rate = None;
        self.device = None;
        if let Ok(mut head) = self.playhead.lock() {
            *head = Playhead::default();
        }
        self.busy.store(false, Ordering::Release);
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) {
        let gain = volume as f32 / u8::MAX as f32;
        if let Ok(mut v) = self.volume.lock() {
            *v = gain;
        }
        debug!("Volume set to {:.2}", gain);
    }

    fn submit(&mut self, buffer: SlotBuffer, sample_count: usize, sample_rate: u32) -> Result<()> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput("audio stream reported an error".to_string()));
        }
        if sample_count == 0 || sample_count > buffer.len() {
            return Err(Error::AudioOutput(format!(
                "invalid submission: {} samples of {}",
                sample_count,
                buffer.len()
            )));
        }

        self.ensure_stream(sample_rate)?;

        let mut head = self
            .playhead
            .lock()
            .map_err(|_| Error::AudioOutput("playhead lock poisoned".to_string()))?;
        *head = Playhead {
            buffer: Some(buffer),
            len: sample_count,
            pos: 0,
        };
        self.busy.store(true, Ordering::Release);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        let _ = self.end();
    }
}
