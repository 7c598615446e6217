//! Initialize the process-wide tracing subscriber.
//!
//! Only binaries call [`init`]; library code emits events and leaves the
//! subscriber choice to its host.
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config, Error, Result};

/// Crates whose events pass the configured level. Everything else stays at
/// `warn` so parser chatter does not drown pipeline events.
const MODULE_WHITELIST: &[&str] = &["ontoterm"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogLevel {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    #[default]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

/// Filter directives derived from the logger settings.
///
/// `RUST_LOG` wins over `override_filter`, which wins over `level`.
pub fn filter(config: &config::Logger) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = config.override_filter.clone().unwrap_or_else(|| {
        std::iter::once("warn".to_string())
            .chain(
                MODULE_WHITELIST
                    .iter()
                    .map(|module| format!("{module}={}", config.level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    });
    EnvFilter::try_new(&directives)
        .map_err(|err| Error::Message(format!("invalid log filter `{directives}`: {err}")))
}

/// Installs the subscriber described by `config`.
///
/// A disabled logger installs nothing.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }
    let filter = filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        Format::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        Format::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        Format::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|err| Error::Message(format!("logger initialization failed: {err}")))
}
