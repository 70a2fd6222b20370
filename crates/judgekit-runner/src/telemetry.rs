//! Tracing setup for processes that embed the runner.
//!
//! `RUST_LOG` wins over the configured level when set. Only the first
//! successful call installs a subscriber.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::error::{RunnerError, RunnerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Newline-delimited JSON instead of human-readable lines.
    pub json: bool,
    /// Default verbosity: `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn level(&self) -> RunnerResult<Level> {
        self.level
            .parse::<Level>()
            .map_err(|_| RunnerError::Config(format!("unknown log level '{}'", self.level)))
    }
}

/// Install the global subscriber. Returns `false` when one was already set.
pub fn init_tracing(config: &TelemetryConfig) -> RunnerResult<bool> {
    let level = config.level()?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let layer = if config.json {
        fmt::layer().with_target(false).json().boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };
    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init()
        .is_ok();
    Ok(installed)
}
