//! Configuration schema definitions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use spout_core::Context;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpoutConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Source options.
    #[serde(default)]
    pub source: SourceConfig,

    /// In-memory channel settings.
    #[serde(default)]
    pub channel: ChannelConfig,
}

// =============================================================================
// Source
// =============================================================================

/// Source section.
///
/// Apart from `name`, every key is handed to the source as a flat option.
/// Nested tables flatten to dotted keys, so both of these produce
/// `handler.mandatoryParameters`:
///
/// ```toml
/// [source]
/// port = 8080
/// handler = "blob"
/// "handler.mandatoryParameters" = "file"
/// ```
///
/// ```yaml
/// source:
///   port: 8080
///   handler.mandatoryParameters: file
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Name used in logs.
    #[serde(default = "default_source_name")]
    pub name: String,

    /// Source options (`port`, `bind`, `handler`, `handler.*`).
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: default_source_name(),
            options: BTreeMap::new(),
        }
    }
}

fn default_source_name() -> String {
    "http".to_string()
}

impl SourceConfig {
    /// Converts the options into the flat string [`Context`] a source expects.
    ///
    /// Scalars are stringified, `null` is dropped, nested objects flatten to
    /// dotted keys and arrays are kept as their JSON text.
    pub fn to_context(&self) -> Context {
        let mut ctx = Context::new();
        for (key, value) in &self.options {
            flatten_into(key, value, &mut ctx);
        }
        ctx
    }
}

fn flatten_into(key: &str, value: &Value, ctx: &mut Context) {
    match value {
        Value::Null => {}
        Value::String(s) => ctx.put(key, s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) => ctx.put(key, value.to_string()),
        Value::Object(map) => {
            for (child, v) in map {
                flatten_into(&format!("{key}.{child}"), v, ctx);
            }
        }
    }
}

// =============================================================================
// Channel
// =============================================================================

/// Settings for the in-memory channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Maximum number of events held at once.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// How long a batch waits for free space before failing, in milliseconds.
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            keep_alive_ms: default_keep_alive_ms(),
        }
    }
}

impl ChannelConfig {
    /// Returns the keep-alive as a [`Duration`].
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }
}

fn default_capacity() -> usize {
    10_000
}

fn default_keep_alive_ms() -> u64 {
    3_000
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
///
/// `close` is on by default: each dispatcher `request` span then ends with one
/// line carrying `source`, `request_id`, `method` and the request timing,
/// visible once `spout_runtime::dispatcher` is at `debug`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default = "default_close")]
    pub close: bool,
}

impl Default for SpanEventConfig {
    fn default() -> Self {
        Self {
            new: false,
            enter: false,
            exit: false,
            close: default_close(),
        }
    }
}

fn default_close() -> bool {
    true
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// File path, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread IDs.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `spout_transport = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
