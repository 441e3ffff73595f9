//! Playback sink adapter and surrounding collaborators
//!
//! The engine talks to audio hardware only through [`PlaybackSink`]. A sink
//! plays a submitted mono buffer asynchronously and reports via
//! [`PlaybackSink::is_busy`] when it is done. Completion is always polled;
//! no callback or blocking call is assumed.

use crate::error::Result;
use std::ops::ControlFlow;
use std::sync::Arc;

/// Mono sample buffer shared between the engine and a sink.
///
/// A sink keeps its clone for as long as the buffer is playing and drops it
/// once playback completes. The engine writes through `Arc::get_mut`, which
/// therefore fails while the sink still holds the buffer.
pub type SlotBuffer = Arc<[i16]>;

/// Audio output device abstraction
pub trait PlaybackSink {
    /// Acquire the output path
    fn begin(&mut self) -> Result<()>;

    /// Release the output path. Any playback still in progress is abandoned.
    fn end(&mut self) -> Result<()>;

    /// Device volume, 0 (silent) to 255 (full)
    fn set_volume(&mut self, volume: u8);

    /// Start playing the first `sample_count` samples of `buffer` at
    /// `sample_rate` and return immediately
    fn submit(&mut self, buffer: SlotBuffer, sample_count: usize, sample_rate: u32) -> Result<()>;

    /// True until the last submitted buffer has been fully consumed
    fn is_busy(&mut self) -> bool;
}

impl<S: PlaybackSink + ?Sized> PlaybackSink for Box<S> {
    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn set_volume(&mut self, volume: u8) {
        (**self).set_volume(volume)
    }

    fn submit(&mut self, buffer: SlotBuffer, sample_count: usize, sample_rate: u32) -> Result<()> {
        (**self).submit(buffer, sample_count, sample_rate)
    }

    fn is_busy(&mut self) -> bool {
        (**self).is_busy()
    }
}

/// Microphone input sharing the audio hardware with the sink.
///
/// Disabled before the sink is acquired and re-enabled after it is released.
pub trait Microphone {
    fn disable(&mut self);
    fn enable(&mut self);
}

/// Microphone stand-in for hosts without audio input
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMicrophone;

impl Microphone for NoMicrophone {
    fn disable(&mut self) {}
    fn enable(&mut self) {}
}

/// Periodic maintenance hook run while waiting on the sink.
///
/// Returning `ControlFlow::Break(())` cancels the session.
pub trait Heartbeat {
    fn tick(&mut self) -> ControlFlow<()>;
}

impl<F> Heartbeat for F
where
    F: FnMut() -> ControlFlow<()>,
{
    fn tick(&mut self) -> ControlFlow<()> {
        self()
    }
}

/// Heartbeat that never cancels
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeartbeat;

impl Heartbeat for NoHeartbeat {
    fn tick(&mut self) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}
