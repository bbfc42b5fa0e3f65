// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Errors surfaced to the pipeline that drives a connector.
//!
//! The pipeline only needs one stable signal to branch on when a session is
//! gone: [`ConnectorError::NotConnected`]. Everything else is passed through
//! with enough context to log and decide whether to retry.
//!
//! # Examples
//!
//! ```
//! use tagpoll_core::error::ConnectorError;
//! use std::time::Duration;
//!
//! let error = ConnectorError::timeout(Duration::from_secs(5));
//! assert!(error.is_retryable());
//! assert!(!error.is_not_connected());
//!
//! assert!(ConnectorError::NotConnected.is_not_connected());
//! ```

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// ConnectorError
// =============================================================================

/// Errors returned from a connector to the pipeline framework.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connector has no usable session. The pipeline's reconnect and
    /// backoff loop takes over when it sees this variant.
    #[error("not connected")]
    NotConnected,

    /// A read against the remote server failed.
    #[error("Read failed: {message}")]
    ReadFailed {
        /// Error message.
        message: String,
        /// Protocol status code, if the failure carried one.
        status_code: Option<u32>,
    },

    /// The caller's deadline expired before the server answered.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The timeout duration.
        duration: Duration,
    },

    /// The caller cancelled the operation.
    #[error("Operation cancelled")]
    Cancelled,

    /// The server answered with something the connector cannot use.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// Invalid connector configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message.
        message: String,
    },
}

impl ConnectorError {
    /// Creates a read failed error.
    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a read failed error carrying a protocol status code.
    pub fn read_failed_with_status(message: impl Into<String>, status_code: u32) -> Self {
        Self::ReadFailed {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for the canonical reconnect signal.
    #[inline]
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Timeout { .. } | Self::ReadFailed { .. }
        )
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::ReadFailed { .. } => "read_failed",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled => "cancelled",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Configuration { .. } => "configuration",
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;

// =============================================================================
// Tests
// =============================================================================
