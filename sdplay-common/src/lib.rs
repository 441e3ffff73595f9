//! # sdplay Common Library
//!
//! Shared code for the sdplay workspace:
//! - Error type shared by configuration loading
//! - TOML bootstrap configuration and config-file resolution
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
