//! Test helper modules for sdplay-ap integration tests
//!
//! Provides reusable test infrastructure components:
//! - RecordingSink / RecordingMicrophone: scripted hardware that logs every call
//! - WAV fixture builders (in-memory bytes and on-disk files via hound)
//! - Readers that fail part way through a stream

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod audio_generator;
pub mod recording_sink;

pub use audio_generator::{
    generate_wav_file, interleave, lcg_samples, mono_wav_bytes, stereo_wav_bytes, wav_bytes,
    FailingReader,
};
pub use recording_sink::{HwEvent, HwLog, RecordingMicrophone, RecordingSink, Submission};
