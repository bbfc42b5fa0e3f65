// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Injectable logging capability and `tracing` initialization.
//!
//! Connector components receive an `Arc<dyn LogSink>` instead of calling the
//! global `tracing` macros. Production code passes a [`TracingSink`]; tests pass
//! a [`MemorySink`] and assert on the recorded entries.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagpoll_core::logging::{LogLevel, LogRecord, LogSink, MemorySink};
//!
//! let sink = Arc::new(MemorySink::new());
//! sink.log(LogRecord::warn("Skipping node").with_node("ns=2;i=1001"));
//!
//! assert_eq!(sink.count_at(LogLevel::Warn), 1);
//! assert!(sink.contains(LogLevel::Warn, "Skipping"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Target used for all records forwarded by [`TracingSink`].
pub const LOG_TARGET: &str = "tagpoll";

// =============================================================================
// LogLevel
// =============================================================================

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debugging detail.
    Debug,
    /// Informational message.
    Info,
    /// Something was skipped or degraded.
    Warn,
    /// Something failed.
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// LogRecord
// =============================================================================

/// A single structured log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message.
    pub message: String,
    /// Tag identifier the record is about, if any.
    pub node_id: Option<String>,
    /// Additional key/value context.
    pub fields: Vec<(&'static str, String)>,
}

impl LogRecord {
    /// Creates a record at the given level.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            node_id: None,
            fields: Vec::new(),
        }
    }

    /// Creates an error record.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Creates a warning record.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    /// Creates an info record.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    /// Creates a debug record.
    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Debug, message)
    }

    /// Attaches the tag identifier.
    pub fn with_node(mut self, node_id: impl fmt::Display) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    /// Attaches an extra field.
    pub fn with_field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// Returns the value of a field by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn details(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)?;
        if let Some(node_id) = &self.node_id {
            write!(f, " node_id={node_id}")?;
        }
        if !self.fields.is_empty() {
            write!(f, " {}", self.details())?;
        }
        Ok(())
    }
}

// =============================================================================
// LogSink
// =============================================================================

/// Destination for structured log records.
///
/// Implementations must be cheap to call from hot paths; the codec logs once
/// per suppressed value.
pub trait LogSink: Send + Sync {
    /// Records one entry.
    fn log(&self, record: LogRecord);

    /// Returns the sink name for identification.
    fn name(&self) -> &str {
        "log_sink"
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log(&self, record: LogRecord) {
        (**self).log(record)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

// =============================================================================
// TracingSink
// =============================================================================

/// Forwards records to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new tracing sink.
    pub fn new() -> Self {
        Self
    }

    /// Returns a shared handle suitable for injection.
    pub fn shared() -> Arc<dyn LogSink> {
        Arc::new(Self)
    }
}

impl LogSink for TracingSink {
    fn log(&self, record: LogRecord) {
        let node_id = record.node_id.as_deref().unwrap_or("");
        let details = record.details();
        let message = record.message.as_str();

        match record.level {
            LogLevel::Error => {
                tracing::error!(target: LOG_TARGET, node_id, details = %details, "{message}")
            }
            LogLevel::Warn => {
                tracing::warn!(target: LOG_TARGET, node_id, details = %details, "{message}")
            }
            LogLevel::Info => {
                tracing::info!(target: LOG_TARGET, node_id, details = %details, "{message}")
            }
            LogLevel::Debug => {
                tracing::debug!(target: LOG_TARGET, node_id, details = %details, "{message}")
            }
        }
    }

    fn name(&self) -> &str {
        "tracing"
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// In-memory sink that keeps every record for later inspection.
///
/// Cloning shares the underlying storage, so a test can hand one clone to the
/// component under test and keep another for assertions.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<RwLock<Vec<LogRecord>>>,
    max_entries: usize,
}

impl MemorySink {
    /// Creates a sink with unlimited capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that keeps at most `max_entries` records, dropping the
    /// oldest when full.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::with_capacity(max_entries.min(1024)))),
            max_entries,
        }
    }

    /// Returns all recorded entries.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    /// Returns entries matching a predicate.
    pub fn records_where<F>(&self, predicate: F) -> Vec<LogRecord>
    where
        F: Fn(&LogRecord) -> bool,
    {
        self.records
            .read()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// Counts entries at exactly the given level.
    pub fn count_at(&self, level: LogLevel) -> usize {
        self.records.read().iter().filter(|r| r.level == level).count()
    }

    /// Returns `true` if an entry at `level` contains `needle` in its message.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .read()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    /// Returns the most recent entry.
    pub fn last(&self) -> Option<LogRecord> {
        self.records.read().last().cloned()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if nothing was logged.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: LogRecord) {
        let mut records = self.records.write();
        if self.max_entries > 0 && records.len() >= self.max_entries {
            records.remove(0);
        }
        records.push(record);
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// =============================================================================
// Subscriber initialization
// =============================================================================

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// Minimal single-line output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    level: &str,
    format: LogFormat,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let is_terminal = std::io::IsTerminal::is_terminal(&std::io::stdout());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(is_terminal),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(true),
            )
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(is_terminal),
            )
            .try_init(),
    }
}

// =============================================================================
// Tests
// =============================================================================
