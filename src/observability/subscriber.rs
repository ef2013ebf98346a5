//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::LogLevel;
use crate::errors::{EkdSendError, EkdSendResult};

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
    /// Condensed single-line output.
    Compact,
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "ekdsend_client=trace",
        LogLevel::Debug => "ekdsend_client=debug",
        LogLevel::Info => "ekdsend_client=info",
        LogLevel::Warn => "ekdsend_client=warn",
        LogLevel::Error => "ekdsend_client=error",
        LogLevel::Off => "off",
    }
}

/// Installs a global subscriber for the client's spans and events.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> EkdSendResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| EkdSendError::configuration(format!("failed to install tracing: {}", e)))
}
