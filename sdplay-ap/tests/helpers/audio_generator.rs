//! Audio test fixture generation
//!
//! In-memory WAV streams are built from the canonical header so individual
//! fields can be corrupted; on-disk files are written with hound.

use hound::{WavSpec, WavWriter};
use sdplay_ap::audio::WavHeader;
use std::io::{self, Read};
use std::path::Path;

/// Header plus little-endian sample data
pub fn wav_bytes(header: &WavHeader, samples: &[i16]) -> Vec<u8> {
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend(samples.iter().flat_map(|s| s.to_le_bytes()));
    bytes
}

/// Canonical mono WAV stream
pub fn mono_wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
    let header = WavHeader::pcm16(1, sample_rate, (samples.len() * 2) as u32);
    wav_bytes(&header, samples)
}

/// Canonical stereo WAV stream from separate channels
pub fn stereo_wav_bytes(sample_rate: u32, left: &[i16], right: &[i16]) -> Vec<u8> {
    let interleaved = interleave(left, right);
    let header = WavHeader::pcm16(2, sample_rate, (interleaved.len() * 2) as u32);
    wav_bytes(&header, &interleaved)
}

pub fn interleave(left: &[i16], right: &[i16]) -> Vec<i16> {
    assert_eq!(left.len(), right.len(), "channels must have equal length");
    left.iter()
        .zip(right)
        .flat_map(|(&l, &r)| [l, r])
        .collect()
}

/// Deterministic pseudo-random samples covering the full i16 range
pub fn lcg_samples(seed: u32, count: usize) -> Vec<i16> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 16) as u16 as i16
        })
        .collect()
}

/// Write a 16-bit PCM WAV file with hound
pub fn generate_wav_file<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    interleaved: &[i16],
) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in interleaved {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Reader that serves `data` and then fails instead of reporting EOF
pub struct FailingReader {
    data: Vec<u8>,
    pos: usize,
}

impl FailingReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Err(io::Error::new(io::ErrorKind::Other, "card removed"));
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
