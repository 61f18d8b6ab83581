//! Log levels and, with the `logging` feature, subscriber setup.
//!
//! The library crates only emit `tracing` events. Applications that want
//! seam's output on stderr without wiring a subscriber themselves enable the
//! `logging` feature; `Bundler::new` then installs one at the configured
//! level, or `init_logging` can be called directly at startup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Verbosity of seam's own output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "off")]
    Silent,
    Error,
    #[serde(alias = "warning")]
    Warn,
    /// Build and link summaries.
    #[default]
    Info,
    /// One event per module resolved, loaded or reused.
    Debug,
    /// Every binding link and rename.
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Silent,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silent => "silent",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "off" => Ok(LogLevel::Silent),
            "warning" => Ok(LogLevel::Warn),
            name => LogLevel::ALL
                .into_iter()
                .find(|level| level.as_str() == name)
                .ok_or_else(|| format!("unknown log level '{value}'")),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "logging")]
mod subscriber {
    use std::sync::Once;

    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    use super::LogLevel;

    static INIT: Once = Once::new();

    impl From<LogLevel> for LevelFilter {
        fn from(level: LogLevel) -> Self {
            match level {
                LogLevel::Silent => LevelFilter::OFF,
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Warn => LevelFilter::WARN,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    fn install(filter: EnvFilter) {
        let installed = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).without_time())
            .try_init();
        if installed.is_err() {
            tracing::debug!("a global subscriber is already installed");
        }
    }

    /// Initialize seam logging with the specified level.
    ///
    /// Only the first call in a process takes effect. `RUST_LOG` directives
    /// are layered on top of `level`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use seam::logging::{init_logging, LogLevel};
    ///
    /// init_logging(LogLevel::Info);
    /// ```
    pub fn init_logging(level: LogLevel) {
        INIT.call_once(|| {
            let filter = EnvFilter::builder()
                .with_default_directive(LevelFilter::from(level).into())
                .from_env_lossy();
            install(filter);
        });
    }

    /// Initialize logging from the `RUST_LOG` environment variable.
    ///
    /// Falls back to Info level if `RUST_LOG` is not set or invalid.
    pub fn init_logging_from_env() {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .from_env_lossy()
            });
            install(filter);
        });
    }
}

#[cfg(feature = "logging")]
pub use subscriber::{init_logging, init_logging_from_env};
