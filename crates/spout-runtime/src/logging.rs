//! Tracing subscriber setup driven by the `[logging]` section.
//!
//! Request handling logs inside the dispatcher's `request` span
//! (`source`, `request_id`, `method`); lifecycle events log `source` and
//! `addr` directly. With the default span events a request at `debug` ends in
//! a single close line with its busy and idle time.
//!
//! `RUST_LOG`, when set, replaces both the configured level and the
//! `[logging.filters]` table.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [logging.filters]
//! "spout_runtime::dispatcher" = "debug"
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

/// Installs the global subscriber for `config`, keeping any subscriber that
/// is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Global subscriber for a Spout process.
pub struct LoggingBuilder {
    level: LevelFilter,
    directives: Vec<String>,
    span_events: FmtSpan,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    thread_ids: bool,
    file_location: bool,
}

impl LoggingBuilder {
    /// Compact stdout logging at `level` with request close events.
    pub fn new(level: Level) -> Self {
        Self::from_config(&LoggingConfig::default()).with_level(level)
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut directives: Vec<String> = config
            .filters
            .iter()
            .map(|(target, level)| format!("{target}={level}"))
            .collect();
        directives.sort();

        Self {
            level: LevelFilter::from_level(config.level.to_tracing_level()),
            directives,
            span_events: span_events(&config.span_events),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            thread_ids: config.thread_ids,
            file_location: config.file_location,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = LevelFilter::from_level(level);
        self
    }

    /// Adds a filter directive such as `spout_transport=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.fmt_layer::<Registry>())
            .with(self.filter())
            .try_init()
    }

    fn filter(&self) -> EnvFilter {
        let filter = EnvFilter::builder()
            .with_default_directive(self.level.into())
            .from_env_lossy();
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return filter;
        }

        self.directives
            .iter()
            .fold(filter, |filter, directive| match directive.parse() {
                Ok(d) => filter.add_directive(d),
                Err(e) => {
                    eprintln!("ignoring invalid log directive `{directive}`: {e}");
                    filter
                }
            })
    }

    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(self.span_events.clone())
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            // Json without the `json-log` feature renders as full.
            _ => layer.boxed(),
        }
    }

    fn writer(&self) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
            (LogOutput::File, Some(path)) => {
                let dir = path
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                let name = path.file_name().unwrap_or_else(|| OsStr::new("spout.log"));
                BoxMakeWriter::new(tracing_appender::rolling::never(dir, name))
            }
            // A file output without a path is rejected by validation.
            _ => BoxMakeWriter::new(std::io::stdout),
        }
    }
}

fn span_events(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |events, (_, event)| events | event)
}
