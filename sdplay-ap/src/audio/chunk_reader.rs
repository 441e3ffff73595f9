//! Chunked PCM reader
//!
//! Pulls raw interleaved 16-bit PCM bytes from storage into a reusable
//! scratch buffer, one chunk per call. A zero-byte chunk is the only
//! end-of-stream signal; a short non-zero chunk is a valid final chunk.

use crate::audio::wav::{Channels, BYTES_PER_SAMPLE};
use crate::error::{Error, Result};
use std::io::{self, ErrorKind, Read};
use tracing::{trace, warn};

/// Scratch buffer of interleaved little-endian 16-bit samples.
///
/// Overwritten by every [`ChunkReader::read_chunk`] call; contents are only
/// meaningful until the next read.
#[derive(Debug)]
pub struct RawChunk {
    bytes: Vec<u8>,
    len: usize,
    channels: Channels,
}

impl RawChunk {
    /// Allocate scratch space for `frames` frames of stereo audio
    /// (mono chunks use the first half).
    pub fn with_capacity(frames: usize) -> Result<Self> {
        let capacity = frames
            .checked_mul(Channels::Stereo.frame_bytes())
            .ok_or(Error::AllocationFailure { requested: usize::MAX })?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure { requested: capacity })?;
        bytes.resize(capacity, 0);

        Ok(Self {
            bytes,
            len: 0,
            channels: Channels::Stereo,
        })
    }

    /// Capacity in bytes
    pub fn capacity_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes filled by the last read
    pub fn len_bytes(&self) -> usize {
        self.len
    }

    /// Channel layout of the last read
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Whole frames held; a trailing partial frame is ignored
    pub fn frames(&self) -> usize {
        self.len / self.channels.frame_bytes()
    }

    /// Interleaved samples of the whole frames held
    pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
        let whole = self.frames() * self.channels.frame_bytes();
        self.bytes[..whole]
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
    }

    /// Replace the contents with interleaved samples (used to build chunks
    /// without a storage source)
    pub fn fill_from_samples(&mut self, samples: &[i16], channels: Channels) -> Result<()> {
        let needed = samples.len() * BYTES_PER_SAMPLE;
        if needed > self.bytes.len() {
            return Err(Error::Internal(format!(
                "{} bytes exceed scratch capacity {}",
                needed,
                self.bytes.len()
            )));
        }
        for (dst, sample) in self.bytes.chunks_exact_mut(BYTES_PER_SAMPLE).zip(samples) {
            dst.copy_from_slice(&sample.to_le_bytes());
        }
        self.len = needed;
        self.channels = channels;
        Ok(())
    }
}

/// Sequential chunk reader over a storage stream
pub struct ChunkReader<R> {
    reader: R,
    channels: Channels,
    frames_per_chunk: usize,
    total_bytes: u64,
    end_of_stream: bool,
    /// Error hit after part of a chunk was read; reported by the next call
    deferred_error: Option<io::Error>,
}

impl<R: Read> ChunkReader<R> {
    /// `reader` must be positioned at the first byte of audio data
    pub fn new(reader: R, channels: Channels, frames_per_chunk: usize) -> Self {
        Self {
            reader,
            channels,
            frames_per_chunk,
            total_bytes: 0,
            end_of_stream: false,
            deferred_error: None,
        }
    }

    /// Bytes requested per chunk
    pub fn request_bytes(&self) -> usize {
        self.frames_per_chunk * self.channels.frame_bytes()
    }

    /// Total bytes read so far
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Whether the source has reported end of stream
    pub fn is_end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Read the next chunk into `chunk`, returning the number of bytes read.
    ///
    /// Partial reads are retried until the request is satisfied or the source
    /// reports end of stream, so only the final chunk can be short. Returns 0
    /// once the stream is exhausted.
    ///
    /// A read error after at least one whole frame of the chunk arrived
    /// returns those bytes first; the error is reported by the following call.
    pub fn read_chunk(&mut self, chunk: &mut RawChunk) -> Result<usize> {
        let request = self.request_bytes();
        if request > chunk.capacity_bytes() {
            return Err(Error::Internal(format!(
                "chunk request of {} bytes exceeds scratch capacity {}",
                request,
                chunk.capacity_bytes()
            )));
        }

        chunk.channels = self.channels;
        chunk.len = 0;

        if let Some(e) = self.deferred_error.take() {
            self.end_of_stream = true;
            return Err(Error::ReadFailure(e));
        }
        if self.end_of_stream {
            return Ok(0);
        }

        let mut filled = 0;
        while filled < request {
            match self.reader.read(&mut chunk.bytes[filled..request]) {
                Ok(0) => {
                    self.end_of_stream = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // Nothing playable was read
                Err(e) if filled < self.channels.frame_bytes() => {
                    return Err(Error::ReadFailure(e))
                }
                Err(e) => {
                    warn!("Read failed after {} of {} bytes: {}", filled, request, e);
                    self.deferred_error = Some(e);
                    break;
                }
            }
        }

        chunk.len = filled;
        self.total_bytes += filled as u64;
        trace!("Read chunk: {} of {} bytes", filled, request);
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `step` bytes per call
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.step).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_full_then_short_then_empty() {
        // 10 stereo frames, chunk of 4 frames
        let data: Vec<u8> = (0..40u8).collect();
        let mut reader = ChunkReader::new(Cursor::new(data), Channels::Stereo, 4);
        let mut chunk = RawChunk::with_capacity(4).unwrap();

        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 16);
        assert_eq!(chunk.frames(), 4);
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 16);
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 8);
        assert_eq!(chunk.frames(), 2);
        assert!(reader.is_end_of_stream());
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 0);
        assert_eq!(reader.total_bytes(), 40);
    }

    #[test]
    fn test_partial_reads_are_coalesced() {
        let source = Trickle {
            data: vec![0u8; 32],
            pos: 0,
            step: 3,
        };
        let mut reader = ChunkReader::new(source, Channels::Mono, 8);
        let mut chunk = RawChunk::with_capacity(8).unwrap();

        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 16);
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 16);
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 0);
    }

    #[test]
    fn test_trailing_partial_frame_ignored() {
        // One stereo frame plus one stray byte
        let data = vec![1, 0, 2, 0, 9];
        let mut reader = ChunkReader::new(Cursor::new(data), Channels::Stereo, 4);
        let mut chunk = RawChunk::with_capacity(4).unwrap();

        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 5);
        assert_eq!(chunk.frames(), 1);
        assert_eq!(chunk.samples().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_samples_are_little_endian() {
        let data = vec![0x34, 0x12, 0xff, 0xff];
        let mut reader = ChunkReader::new(Cursor::new(data), Channels::Mono, 4);
        let mut chunk = RawChunk::with_capacity(4).unwrap();

        reader.read_chunk(&mut chunk).unwrap();
        assert_eq!(chunk.samples().collect::<Vec<_>>(), vec![0x1234, -1]);
    }

    #[test]
    fn test_read_error_surfaces() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::Other, "bad sector"))
            }
        }

        let mut reader = ChunkReader::new(Broken, Channels::Mono, 4);
        let mut chunk = RawChunk::with_capacity(4).unwrap();
        assert!(matches!(
            reader.read_chunk(&mut chunk),
            Err(Error::ReadFailure(_))
        ));
    }

    #[test]
    fn test_bytes_before_read_error_are_kept() {
        /// Three mono samples, then a failing card
        struct ThreeThenFail {
            served: bool,
        }
        impl Read for ThreeThenFail {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.served {
                    return Err(std::io::Error::new(ErrorKind::Other, "card removed"));
                }
                self.served = true;
                let data = [1, 0, 2, 0, 3, 0];
                buf[..data.len()].copy_from_slice(&data);
                Ok(data.len())
            }
        }

        let mut reader = ChunkReader::new(ThreeThenFail { served: false }, Channels::Mono, 4);
        let mut chunk = RawChunk::with_capacity(4).unwrap();

        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 6);
        assert_eq!(chunk.samples().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(reader.total_bytes(), 6);

        assert!(matches!(
            reader.read_chunk(&mut chunk),
            Err(Error::ReadFailure(_))
        ));
        assert_eq!(chunk.len_bytes(), 0);
        assert_eq!(reader.read_chunk(&mut chunk).unwrap(), 0);
    }

    #[test]
    fn test_capacity_overflow_is_allocation_failure() {
        assert!(matches!(
            RawChunk::with_capacity(usize::MAX),
            Err(Error::AllocationFailure { .. })
        ));
    }
}
