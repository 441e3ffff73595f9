//! Logging initialisation
//!
//! Installs a `tracing-subscriber` registry with a reloadable env filter and
//! the fmt layer. `RUST_LOG` takes precedence over the configured level.
//!
//! The subscriber is installed before configuration is loaded so that config
//! warnings are not lost; once the configured level is known it is applied
//! through [`LogHandle::set_level`].

use crate::{Error, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Handle for changing the level of the installed subscriber
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Switch the sdplay crates to `level`
    pub fn set_level(&self, level: &str) -> Result<()> {
        let filter = env_filter(level)?;
        self.filter
            .reload(filter)
            .map_err(|e| Error::Config(format!("Failed to change log level: {}", e)))
    }
}

/// Build the filter used by [`init`]
///
/// `default_level` applies to the sdplay crates only; other crates stay at
/// `warn` unless `RUST_LOG` says otherwise.
pub fn env_filter(default_level: &str) -> Result<EnvFilter> {
    let level = default_level.trim().to_ascii_lowercase();
    level
        .parse::<LevelFilter>()
        .map_err(|_| Error::InvalidInput(format!("Unknown log level '{}'", default_level)))?;

    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "warn,sdplay_ap={level},sdplay_common={level}",
            level = level
        )
        .into()
    }))
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already set.
pub fn init(default_level: &str) -> Result<LogHandle> {
    let (filter, handle) = reload::Layer::new(env_filter(default_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialise logging: {}", e)))?;

    Ok(LogHandle { filter: handle })
}
