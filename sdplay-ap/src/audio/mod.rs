//! Audio I/O: WAV header parsing, chunked reading, downmix and output sinks

pub mod chunk_reader;
pub mod downmix;
#[cfg(feature = "cpal")]
pub mod output;
pub mod paced_sink;
pub mod sink;
pub mod wav;

pub use chunk_reader::{ChunkReader, RawChunk};
pub use downmix::{downmix_chunk, downmix_interleaved, mix_pair};
#[cfg(feature = "cpal")]
pub use output::CpalSink;
pub use paced_sink::PacedSink;
pub use sink::{Heartbeat, Microphone, NoHeartbeat, NoMicrophone, PlaybackSink, SlotBuffer};
pub use wav::{Channels, WavHeader};
