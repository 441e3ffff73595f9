//! Scripted sink and microphone that record every hardware interaction
//!
//! Both share one [`HwLog`] so tests can check ordering across them
//! (microphone disabled before the sink is acquired, and so on).

use sdplay_ap::audio::{Microphone, PlaybackSink, SlotBuffer};
use sdplay_ap::{Error, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// One hardware interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HwEvent {
    MicDisabled,
    MicEnabled,
    Begin,
    End,
    Volume(u8),
    Submit { sample_count: usize, sample_rate: u32 },
    Poll { busy: bool },
}

/// Shared, ordered event log
pub type HwLog = Rc<RefCell<Vec<HwEvent>>>;

/// A submitted buffer, copied at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

/// Sink that stays busy for a fixed number of polls after each submit.
///
/// The submitted buffer is held until the sink reports idle, like real
/// hardware, so a premature write by the engine surfaces as `SlotInUse`.
pub struct RecordingSink {
    log: HwLog,
    busy_polls_per_submit: usize,
    remaining: usize,
    held: Option<SlotBuffer>,
    active: bool,
    pub submissions: Vec<Submission>,
    /// Set if submit was called while the previous buffer was still playing
    pub overlapped_submit: bool,
    /// Fail `begin` with an audio output error
    pub fail_begin: bool,
}

impl RecordingSink {
    pub fn new(log: HwLog, busy_polls_per_submit: usize) -> Self {
        Self {
            log,
            busy_polls_per_submit,
            remaining: 0,
            held: None,
            active: false,
            submissions: Vec::new(),
            overlapped_submit: false,
            fail_begin: false,
        }
    }

    pub fn sample_counts(&self) -> Vec<usize> {
        self.submissions.iter().map(|s| s.samples.len()).collect()
    }

    pub fn played_samples(&self) -> Vec<i16> {
        self.submissions
            .iter()
            .flat_map(|s| s.samples.iter().copied())
            .collect()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn holds_buffer(&self) -> bool {
        self.held.is_some()
    }
}

impl PlaybackSink for RecordingSink {
    fn begin(&mut self) -> Result<()> {
        if self.fail_begin {
            return Err(Error::AudioOutput("speaker unavailable".to_string()));
        }
        self.log.borrow_mut().push(HwEvent::Begin);
        self.active = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.log.borrow_mut().push(HwEvent::End);
        self.active = false;
        self.held = None;
        self.remaining = 0;
        Ok(())
    }

    fn set_volume(&mut self, volume: u8) {
        self.log.borrow_mut().push(HwEvent::Volume(volume));
    }

    fn submit(&mut self, buffer: SlotBuffer, sample_count: usize, sample_rate: u32) -> Result<()> {
        if self.remaining > 0 || self.held.is_some() {
            self.overlapped_submit = true;
        }
        self.log.borrow_mut().push(HwEvent::Submit {
            sample_count,
            sample_rate,
        });
        self.submissions.push(Submission {
            samples: buffer[..sample_count].to_vec(),
            sample_rate,
        });
        self.held = Some(buffer);
        self.remaining = self.busy_polls_per_submit;
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        let busy = if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            self.held = None;
            false
        };
        self.log.borrow_mut().push(HwEvent::Poll { busy });
        busy
    }
}

/// Microphone that records enable/disable calls
pub struct RecordingMicrophone {
    log: HwLog,
}

impl RecordingMicrophone {
    pub fn new(log: HwLog) -> Self {
        Self { log }
    }
}

impl Microphone for RecordingMicrophone {
    fn disable(&mut self) {
        self.log.borrow_mut().push(HwEvent::MicDisabled);
    }

    fn enable(&mut self) {
        self.log.borrow_mut().push(HwEvent::MicEnabled);
    }
}
