// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the OPC UA connector.
//!
//! ```text
//! SessionError  - what a session handle reports for a failed service call
//! ReadError     - what the read coordinator returns to its caller
//! ConfigError   - invalid node ids and reader configuration
//! ```
//!
//! A [`ReadError::NotConnected`] converts into the pipeline's canonical
//! [`ConnectorError::NotConnected`]; every other read error keeps its
//! original cause.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tagpoll_core::ConnectorError;
use thiserror::Error;

use crate::status::StatusCode;

// =============================================================================
// SessionError
// =============================================================================

/// A failure reported by a [`SessionHandle`](crate::session::SessionHandle).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The service call completed with a bad service result.
    #[error("Service fault {status}{}", detail_suffix(.message))]
    Status {
        /// Service result.
        status: StatusCode,
        /// Optional diagnostic text from the stack.
        message: Option<String>,
    },

    /// Transport-level I/O failure with no protocol status attached.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stack rejected a message as malformed.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl SessionError {
    /// Creates a status error without diagnostic text.
    pub fn status(status: StatusCode) -> Self {
        Self::Status {
            status,
            message: None,
        }
    }

    /// Creates a status error with diagnostic text.
    pub fn status_with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: Some(message.into()),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns the protocol status code, if this error carries one.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Io(_) | Self::Protocol(_) => None,
        }
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => !status.matches(StatusCode::BAD_NODE_ID_UNKNOWN)
                && !status.matches(StatusCode::BAD_NODE_ID_INVALID)
                && !status.matches(StatusCode::BAD_ATTRIBUTE_ID_INVALID)
                && !status.matches(StatusCode::BAD_USER_ACCESS_DENIED),
            Self::Io(_) => true,
            Self::Protocol(_) => false,
        }
    }

    /// Returns the error category for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Io(_) => "io",
            Self::Protocol(_) => "protocol",
        }
    }
}

fn detail_suffix(message: &Option<String>) -> String {
    match message {
        Some(message) if !message.is_empty() => format!(": {message}"),
        _ => String::new(),
    }
}

// =============================================================================
// ReadError
// =============================================================================

/// Errors returned by [`ReadCoordinator`](crate::reader::ReadCoordinator).
#[derive(Debug, Error)]
pub enum ReadError {
    /// The session was classified as dead and has been closed.
    #[error("not connected")]
    NotConnected,

    /// The read failed for a reason that does not prove the session is dead.
    /// The original error is preserved unchanged.
    #[error(transparent)]
    Session(SessionError),

    /// The caller cancelled the read.
    #[error("Read cancelled")]
    Cancelled,

    /// The local deadline expired before the server answered.
    #[error("Read deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// The server returned a different number of results than requested.
    #[error("Server returned {actual} results for {expected} nodes")]
    ResultCountMismatch {
        /// Number of nodes requested.
        expected: usize,
        /// Number of results received.
        actual: usize,
    },
}

impl ReadError {
    /// Returns `true` for the reconnect signal.
    #[inline]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// Returns the underlying session error for pass-through failures.
    pub fn session_error(&self) -> Option<&SessionError> {
        match self {
            Self::Session(error) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` if the caller may retry the read.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotConnected | Self::DeadlineExceeded(_) | Self::ResultCountMismatch { .. } => {
                true
            }
            Self::Session(error) => error.is_retryable(),
            Self::Cancelled => false,
        }
    }

    /// Returns the error category for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::Session(error) => error.category(),
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded(_) => "deadline",
            Self::ResultCountMismatch { .. } => "result_count",
        }
    }
}

impl From<ReadError> for ConnectorError {
    fn from(error: ReadError) -> Self {
        match error {
            ReadError::NotConnected => ConnectorError::NotConnected,
            ReadError::Session(session) => match session.status_code() {
                Some(status) => ConnectorError::read_failed_with_status(session.to_string(), status.bits()),
                None => ConnectorError::read_failed(session.to_string()),
            },
            ReadError::Cancelled => ConnectorError::Cancelled,
            ReadError::DeadlineExceeded(duration) => ConnectorError::timeout(duration),
            mismatch @ ReadError::ResultCountMismatch { .. } => {
                ConnectorError::invalid_response(mismatch.to_string())
            }
        }
    }
}

// =============================================================================
// ConfigError
// =============================================================================

/// Configuration and node id parsing errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A node id string could not be parsed.
    #[error("Invalid node ID '{node_id}': {reason}")]
    InvalidNodeId {
        /// The offending input.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Reason.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        /// Format name.
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// The file extension does not map to a supported format.
    #[error("Unsupported configuration format: {}", .path.display())]
    UnsupportedFormat {
        /// File path.
        path: PathBuf,
    },

    /// The configuration file could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

impl ConfigError {
    /// Creates an invalid node id error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(format: &'static str, message: impl ToString) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }

    /// Returns the error category for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidNodeId { .. } => "invalid_node_id",
            Self::InvalidValue { .. } => "invalid_value",
            Self::Parse { .. } => "parse",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Io { .. } => "io",
        }
    }

    /// Configuration errors never resolve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl From<ConfigError> for ConnectorError {
    fn from(error: ConfigError) -> Self {
        ConnectorError::configuration(error.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================
