//! Configuration module for the assistant.
//!
//! Provides CLI argument parsing and layered configuration management
//! (built-in defaults, persisted config file, environment/CLI overrides).

#[allow(clippy::module_inception)]
mod config;

pub use config::AppConfig;
