//! Stereo-to-mono downmix
//!
//! Stereo frames are averaged in `i32` and truncated toward zero; mono
//! frames are copied unchanged. No dithering, no rounding to nearest.

use crate::audio::chunk_reader::RawChunk;
use crate::audio::wav::Channels;
use crate::error::{Error, Result};

/// Average of one stereo frame, truncated toward zero
#[inline]
pub fn mix_pair(left: i16, right: i16) -> i16 {
    ((left as i32 + right as i32) / 2) as i16
}

/// Downmix interleaved `samples` into `dst`, returning the frame count.
///
/// A trailing partial frame is ignored.
pub fn downmix_interleaved(samples: &[i16], channels: Channels, dst: &mut [i16]) -> Result<usize> {
    let frames = samples.len() / channels.count();
    if frames > dst.len() {
        return Err(Error::Internal(format!(
            "{} frames do not fit a slot of {} samples",
            frames,
            dst.len()
        )));
    }

    match channels {
        Channels::Mono => dst[..frames].copy_from_slice(&samples[..frames]),
        Channels::Stereo => {
            for (out, frame) in dst.iter_mut().zip(samples.chunks_exact(2)) {
                *out = mix_pair(frame[0], frame[1]);
            }
        }
    }

    Ok(frames)
}

/// Downmix a raw chunk into a mono slot, returning the frame count
pub fn downmix_chunk(chunk: &RawChunk, dst: &mut [i16]) -> Result<usize> {
    let frames = chunk.frames();
    if frames > dst.len() {
        return Err(Error::Internal(format!(
            "{} frames do not fit a slot of {} samples",
            frames,
            dst.len()
        )));
    }

    let mut samples = chunk.samples();
    match chunk.channels() {
        Channels::Mono => {
            for (out, sample) in dst.iter_mut().zip(samples) {
                *out = sample;
            }
        }
        Channels::Stereo => {
            for out in dst[..frames].iter_mut() {
                // frames() only counts whole frames, so both halves exist
                let left = samples.next().unwrap_or(0);
                let right = samples.next().unwrap_or(0);
                *out = mix_pair(left, right);
            }
        }
    }

    Ok(frames)
}
