//! WAV header validation
//!
//! Parses the canonical 44-byte RIFF/WAVE/fmt/data header. Only 16-bit PCM
//! with one or two channels is accepted; anything else is rejected with a
//! defined error before any audio hardware is touched.

use crate::error::{Error, Result};
use std::io::{self, Read};

/// Size of the canonical header in bytes
pub const HEADER_LEN: usize = 44;

/// PCM audio format code
pub const FORMAT_PCM: u16 = 1;

/// Bytes per sample for 16-bit PCM
pub const BYTES_PER_SAMPLE: usize = 2;

/// Channel layout of the source stream.
///
/// Only mono and stereo are playable; the downmix relies on this type to make
/// other counts unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Number of interleaved samples per frame
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }

    /// Bytes per interleaved frame
    pub fn frame_bytes(self) -> usize {
        self.count() * BYTES_PER_SAMPLE
    }
}

impl TryFrom<u16> for Channels {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        match value {
            1 => Ok(Channels::Mono),
            2 => Ok(Channels::Stereo),
            other => Err(Error::UnsupportedChannels(other)),
        }
    }
}

/// Parsed WAV header. Immutable once read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    pub riff_tag: [u8; 4],
    pub file_size: u32,
    pub wave_tag: [u8; 4],
    pub fmt_tag: [u8; 4],
    pub fmt_size: u32,
    pub audio_format: u16,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_tag: [u8; 4],
    pub data_size: u32,
}

impl WavHeader {
    /// Read and validate the header, leaving `reader` at the first data byte.
    ///
    /// Tag checks run first so that a foreign container is always reported as
    /// [`Error::InvalidFormat`], whatever the remaining fields hold.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; HEADER_LEN];
        reader.read_exact(&mut raw).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                Error::InvalidFormat("truncated header (shorter than 44 bytes)".to_string())
            }
            _ => Error::ReadFailure(e),
        })?;

        let header = Self::parse(&raw);
        header.validate()?;
        Ok(header)
    }

    /// Decode the fixed layout without validating it
    pub fn parse(raw: &[u8; HEADER_LEN]) -> Self {
        let tag = |at: usize| [raw[at], raw[at + 1], raw[at + 2], raw[at + 3]];
        let u32_at = |at: usize| u32::from_le_bytes(tag(at));
        let u16_at = |at: usize| u16::from_le_bytes([raw[at], raw[at + 1]]);

        Self {
            riff_tag: tag(0),
            file_size: u32_at(4),
            wave_tag: tag(8),
            fmt_tag: tag(12),
            fmt_size: u32_at(16),
            audio_format: u16_at(20),
            num_channels: u16_at(22),
            sample_rate: u32_at(24),
            byte_rate: u32_at(28),
            block_align: u16_at(32),
            bits_per_sample: u16_at(34),
            data_tag: tag(36),
            data_size: u32_at(40),
        }
    }

    /// Check tags, layout and encoding
    pub fn validate(&self) -> Result<()> {
        if &self.riff_tag != b"RIFF" {
            return Err(Error::InvalidFormat(format!(
                "container tag {:?}, expected \"RIFF\"",
                String::from_utf8_lossy(&self.riff_tag)
            )));
        }
        if &self.wave_tag != b"WAVE" {
            return Err(Error::InvalidFormat(format!(
                "format tag {:?}, expected \"WAVE\"",
                String::from_utf8_lossy(&self.wave_tag)
            )));
        }
        if &self.fmt_tag != b"fmt " {
            return Err(Error::InvalidFormat(format!(
                "sub-chunk tag {:?} at offset 12, expected \"fmt \"",
                String::from_utf8_lossy(&self.fmt_tag)
            )));
        }
        if &self.data_tag != b"data" {
            return Err(Error::InvalidFormat(format!(
                "chunk tag {:?} at offset 36, expected \"data\" (non-canonical header)",
                String::from_utf8_lossy(&self.data_tag)
            )));
        }
        if self.audio_format != FORMAT_PCM {
            return Err(Error::UnsupportedFormat(format!(
                "audio format code {} (only PCM is supported)",
                self.audio_format
            )));
        }
        if self.bits_per_sample != 16 {
            return Err(Error::UnsupportedFormat(format!(
                "{} bits per sample (only 16 is supported)",
                self.bits_per_sample
            )));
        }
        Channels::try_from(self.num_channels)?;
        if self.sample_rate == 0 {
            return Err(Error::InvalidFormat("sample rate is zero".to_string()));
        }
        Ok(())
    }

    /// Channel layout. Only valid on a validated header.
    pub fn channels(&self) -> Result<Channels> {
        Channels::try_from(self.num_channels)
    }

    /// Encode as the canonical 44-byte layout
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut raw = [0u8; HEADER_LEN];
        raw[0..4].copy_from_slice(&self.riff_tag);
        raw[4..8].copy_from_slice(&self.file_size.to_le_bytes());
        raw[8..12].copy_from_slice(&self.wave_tag);
        raw[12..16].copy_from_slice(&self.fmt_tag);
        raw[16..20].copy_from_slice(&self.fmt_size.to_le_bytes());
        raw[20..22].copy_from_slice(&self.audio_format.to_le_bytes());
        raw[22..24].copy_from_slice(&self.num_channels.to_le_bytes());
        raw[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        raw[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        raw[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        raw[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        raw[36..40].copy_from_slice(&self.data_tag);
        raw[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        raw
    }

    /// Canonical 16-bit PCM header for `data_size` bytes of audio
    pub fn pcm16(num_channels: u16, sample_rate: u32, data_size: u32) -> Self {
        let block_align = num_channels.saturating_mul(BYTES_PER_SAMPLE as u16);
        Self {
            riff_tag: *b"RIFF",
            file_size: data_size.saturating_add(36),
            wave_tag: *b"WAVE",
            fmt_tag: *b"fmt ",
            fmt_size: 16,
            audio_format: FORMAT_PCM,
            num_channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(block_align as u32),
            block_align,
            bits_per_sample: 16,
            data_tag: *b"data",
            data_size,
        }
    }
}
