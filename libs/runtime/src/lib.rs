//! Process-level plumbing shared by the signup binaries: layered configuration,
//! logging, home directory resolution and termination signals.

pub mod config;
pub mod logging;
pub mod paths;
pub mod shutdown;

pub use config::{AppConfig, CliArgs, DatabaseConfig, LoggingConfig, Section, ServerConfig};
