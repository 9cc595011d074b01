/// Tooling for the dropper CLI - configuration management and logging setup
pub mod config;
pub mod logging;

pub use config::{ConfigManager, ConfigValidator, DropperConfig, Environment, LoggingConfig, NetworkConfig};
pub use logging::init_tracing;
