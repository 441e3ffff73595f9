//! Double-buffered playback: slots, scheduler and engine

pub mod engine;
pub mod scheduler;
pub mod slots;

pub use engine::{PlaybackEngine, PlaybackReport};
pub use scheduler::{PlaybackSession, SchedulerState, SessionStats};
pub use slots::SlotPair;
