//! Logging setup for the captioning service.
//!
//! One call, [`init_logger`], installs the global `tracing` subscriber.
//! All policy lives in [`LoggerConfig`], which the daemon builds from its
//! environment settings.

mod config;
mod error;
mod init;

pub use config::{LoggerConfig, LoggerFormat, LoggerLevel};
pub use error::{LoggerError, LoggerResult};
pub use init::init_logger;
