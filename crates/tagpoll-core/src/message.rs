// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Records handed from a connector to the pipeline.
//!
//! A connector produces one [`TagMessage`] per tag that decoded successfully.
//! Suppressed tags produce nothing; the pipeline simply does not see them for
//! that cycle.
//!
//! # Example
//!
//! ```
//! use tagpoll_core::message::{TagMessage, TagType};
//!
//! let msg = TagMessage::new("ns=2;s=Temperature", b"21.5".to_vec(), TagType::Number);
//! assert_eq!(msg.payload_str(), Some("21.5"));
//! assert_eq!(msg.tag_type.as_str(), "number");
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// TagType
// =============================================================================

/// Coarse semantic type of a payload.
///
/// The pipeline serializes this as a plain lowercase string, so the set is
/// deliberately small.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    /// Decimal text of an integer or floating point value.
    Number,
    /// UTF-8 text, either verbatim or a JSON document.
    String,
    /// Literal `true` or `false`.
    Bool,
}

impl TagType {
    /// Returns the wire name of this type.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            other => Err(format!("unknown tag type '{other}'")),
        }
    }
}

// =============================================================================
// TagMessage
// =============================================================================

/// One decoded tag value, ready to be wrapped as a pipeline record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMessage {
    /// Text form of the tag identifier.
    pub node_id: String,

    /// Browse name of the tag, if known.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub browse_name: String,

    /// Address space path of the tag, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Payload bytes. Never empty.
    pub payload: Vec<u8>,

    /// Semantic type of the payload.
    pub tag_type: TagType,

    /// Timestamp assigned by the data source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timestamp: Option<DateTime<Utc>>,

    /// Timestamp assigned by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl TagMessage {
    /// Creates a message without browse name or timestamps.
    pub fn new(node_id: impl Into<String>, payload: Vec<u8>, tag_type: TagType) -> Self {
        Self {
            node_id: node_id.into(),
            browse_name: String::new(),
            path: None,
            payload,
            tag_type,
            source_timestamp: None,
            server_timestamp: None,
        }
    }

    /// Sets the browse name.
    pub fn with_browse_name(mut self, name: impl Into<String>) -> Self {
        self.browse_name = name.into();
        self
    }

    /// Sets the address space path. `None` leaves it unset.
    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    /// Sets the source and server timestamps.
    pub fn with_timestamps(
        mut self,
        source: Option<DateTime<Utc>>,
        server: Option<DateTime<Utc>>,
    ) -> Self {
        self.source_timestamp = source;
        self.server_timestamp = server;
        self
    }

    /// Returns the payload as text if it is valid UTF-8.
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Returns the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Returns the best available timestamp (source, then server).
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.source_timestamp.or(self.server_timestamp)
    }
}

impl fmt::Display for TagMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload_str() {
            Some(text) => write!(f, "{} = {} ({})", self.node_id, text, self.tag_type),
            None => write!(f, "{} = <{} bytes> ({})", self.node_id, self.len(), self.tag_type),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
