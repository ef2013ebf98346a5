//! Observability module for the EKDSend client.
//!
//! Structured events go through `tracing`. The [`Logger`] trait is the
//! diagnostic sink that receives request and response dumps when the client
//! runs in debug mode.

mod logging;
mod subscriber;

pub use logging::{ConsoleLogger, LogConfig, LogLevel, Logger, NoopLogger};
pub use subscriber::{init_tracing, LogFormat};
