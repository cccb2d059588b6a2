//! Configuration for the Spout runtime.
//!
//! Files, environment variables and programmatic overrides are layered with
//! figment and validated before use.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigLoadError, ConfigLoadResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    ChannelConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, SourceConfig, SpanEventConfig,
    SpoutConfig,
};
pub use validation::validate_config;
