//! Double-buffer scheduler
//!
//! Drives chunk reader → downmix → sink with two alternating mono slots:
//!
//! ```text
//! Idle → Priming → Streaming → Draining → Idle
//! ```
//!
//! - **Priming**: fill slot 0 and submit it. A first read of zero bytes (or
//!   less than one whole frame) ends the session with [`Error::EmptyStream`].
//! - **Streaming**: fill the slot the sink is not playing, wait until the sink
//!   is idle, submit, flip. Filling overlaps with playback of the other slot.
//! - **Draining**: no more data; wait until the last submission finishes.
//!
//! A read error while streaming stops reading, drains the in-flight slot and
//! is then reported as [`Error::ReadFailure`].

use crate::audio::chunk_reader::{ChunkReader, RawChunk};
use crate::audio::downmix::downmix_chunk;
use crate::audio::sink::{Heartbeat, PlaybackSink};
use crate::error::{Error, Result};
use crate::playback::slots::{SlotPair, SLOT_COUNT};
use std::io::Read;
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Priming,
    Streaming,
    Draining,
}

/// Counters collected over one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Number of `submit` calls
    pub chunks_submitted: usize,
    /// Sum of submitted sample counts
    pub samples_submitted: u64,
    /// Number of `is_busy` polls
    pub busy_polls: u64,
}

/// State of one play call. Borrows the engine's buffers for its lifetime.
pub struct PlaybackSession<'a, S: ?Sized, H: ?Sized> {
    sink: &'a mut S,
    heartbeat: &'a mut H,
    slots: &'a mut SlotPair,
    scratch: &'a mut RawChunk,
    poll_interval: Duration,
    sample_rate: u32,
    /// Next slot to fill
    current: usize,
    state: SchedulerState,
    stats: SessionStats,
}

impl<'a, S, H> PlaybackSession<'a, S, H>
where
    S: PlaybackSink + ?Sized,
    H: Heartbeat + ?Sized,
{
    pub fn new(
        sink: &'a mut S,
        heartbeat: &'a mut H,
        slots: &'a mut SlotPair,
        scratch: &'a mut RawChunk,
        sample_rate: u32,
        poll_interval: Duration,
    ) -> Self {
        Self {
            sink,
            heartbeat,
            slots,
            scratch,
            poll_interval,
            sample_rate,
            current: 0,
            state: SchedulerState::Idle,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Play everything `reader` yields. Returns to `Idle` on every path.
    pub fn run<R: Read>(&mut self, reader: &mut ChunkReader<R>) -> Result<SessionStats> {
        let result = self.run_states(reader);
        self.transition(SchedulerState::Idle);
        result.map(|()| self.stats)
    }

    fn run_states<R: Read>(&mut self, reader: &mut ChunkReader<R>) -> Result<()> {
        self.transition(SchedulerState::Priming);
        self.current = 0;
        let frames = self.fill(reader, 0)?;
        if frames == 0 {
            return Err(Error::EmptyStream);
        }
        self.wait_until_idle()?;
        self.submit(0, frames)?;
        self.current = 1;

        self.transition(SchedulerState::Streaming);
        let mut read_failure = None;
        loop {
            match self.fill(reader, self.current) {
                Ok(0) => break,
                Ok(frames) => {
                    self.wait_until_idle()?;
                    self.submit(self.current, frames)?;
                    self.current = (self.current + 1) % SLOT_COUNT;
                }
                Err(Error::ReadFailure(e)) => {
                    warn!("Read failed mid-stream, draining last chunk: {}", e);
                    read_failure = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        self.transition(SchedulerState::Draining);
        self.wait_until_idle()?;

        match read_failure {
            Some(e) => Err(Error::ReadFailure(e)),
            None => Ok(()),
        }
    }

    /// Read the next chunk and downmix it into slot `index`.
    /// Returns the number of mono frames produced.
    fn fill<R: Read>(&mut self, reader: &mut ChunkReader<R>, index: usize) -> Result<usize> {
        let bytes = reader.read_chunk(self.scratch)?;
        if bytes == 0 {
            return Ok(0);
        }
        let dst = self.slots.fill_target(index)?;
        downmix_chunk(self.scratch, dst)
    }

    /// Poll the sink until it reports idle, sleeping and ticking the
    /// heartbeat between polls
    fn wait_until_idle(&mut self) -> Result<()> {
        loop {
            self.stats.busy_polls += 1;
            if !self.sink.is_busy() {
                return Ok(());
            }

            if self.poll_interval.is_zero() {
                std::thread::yield_now();
            } else {
                std::thread::sleep(self.poll_interval);
            }

            if let ControlFlow::Break(()) = self.heartbeat.tick() {
                debug!("Heartbeat requested stop while in {:?}", self.state);
                return Err(Error::Cancelled);
            }
        }
    }

    fn submit(&mut self, index: usize, frames: usize) -> Result<()> {
        self.sink
            .submit(self.slots.share(index)?, frames, self.sample_rate)?;
        self.stats.chunks_submitted += 1;
        self.stats.samples_submitted += frames as u64;
        trace!(
            "Submitted slot {} ({} samples, chunk #{})",
            index,
            frames,
            self.stats.chunks_submitted
        );
        Ok(())
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!("Scheduler {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
