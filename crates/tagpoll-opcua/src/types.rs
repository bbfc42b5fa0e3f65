// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Read service types.
//!
//! - **NodeId**: the four OPC UA identifier kinds, parsed from and printed as
//!   the standard `ns=<index>;<kind>=<value>` text form
//! - **NodeDef**: a configured tag, the context the codec logs against
//! - **ReadRequest / ReadResponse / DataValue**: one Read service round-trip
//!
//! # Examples
//!
//! ```
//! use tagpoll_opcua::types::{NodeDef, NodeId, ReadRequest};
//!
//! let node: NodeId = "ns=2;s=Line1.Temperature".parse().unwrap();
//! assert_eq!(node, NodeId::string(2, "Line1.Temperature"));
//!
//! let request = ReadRequest::for_nodes(&[NodeDef::new(node)]);
//! assert_eq!(request.len(), 1);
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;
use crate::status::StatusCode;
use crate::variant::Variant;

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// Serializes as its text form so it can appear as a plain string in
/// configuration files and JSON payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node id.
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque node id.
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// The null node id (`i=0`).
    pub const fn null() -> Self {
        Self {
            namespace_index: 0,
            identifier: NodeIdentifier::Numeric(0),
        }
    }

    /// Returns `true` for the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, NodeIdentifier::Numeric(0))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        write!(f, "{}", self.identifier)
    }
}

impl FromStr for NodeId {
    type Err = ConfigError;

    /// Parses a node id from OPC UA text form.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=2258` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, identifier) = rest.split_once(';').ok_or_else(|| {
                    ConfigError::invalid_node_id(s, "Missing identifier after namespace")
                })?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| ConfigError::invalid_node_id(s, "Invalid namespace index"))?;
                (ns, identifier)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            let value: u32 = id
                .parse()
                .map_err(|_| ConfigError::invalid_node_id(s, "Invalid numeric identifier"))?;
            NodeIdentifier::Numeric(value)
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            if id.is_empty() {
                return Err(ConfigError::invalid_node_id(s, "Empty string identifier"));
            }
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            let uuid = Uuid::parse_str(id)
                .map_err(|e| ConfigError::invalid_node_id(s, format!("Invalid GUID: {e}")))?;
            NodeIdentifier::Guid(uuid)
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            let bytes = BASE64
                .decode(id)
                .map_err(|e| ConfigError::invalid_node_id(s, format!("Invalid base64: {e}")))?;
            NodeIdentifier::Opaque(bytes)
        } else {
            return Err(ConfigError::invalid_node_id(
                s,
                "Unknown identifier type. Expected i=, s=, g=, or b=",
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

impl Serialize for NodeId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),
    /// String identifier.
    String(String),
    /// GUID identifier.
    Guid(Uuid),
    /// Opaque byte string identifier.
    Opaque(Vec<u8>),
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={v}"),
            Self::String(v) => write!(f, "s={v}"),
            Self::Guid(v) => write!(f, "g={v}"),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeDef
// =============================================================================

/// A configured tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Node to read.
    pub node_id: NodeId,

    /// Browse name, carried into emitted messages.
    #[serde(default)]
    pub browse_name: String,

    /// Human-readable path in the address space, carried into emitted messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl NodeDef {
    /// Creates a definition with no browse name.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            browse_name: String::new(),
            path: None,
        }
    }

    /// Sets the browse name.
    pub fn with_browse_name(mut self, name: impl Into<String>) -> Self {
        self.browse_name = name.into();
        self
    }

    /// Sets the address space path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl From<NodeId> for NodeDef {
    fn from(node_id: NodeId) -> Self {
        Self::new(node_id)
    }
}

// =============================================================================
// Read request
// =============================================================================

/// Attribute id of the Value attribute.
pub const ATTRIBUTE_VALUE: u32 = 13;

/// One entry of a read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadValueId {
    /// Node to read.
    pub node_id: NodeId,
    /// Attribute to read.
    pub attribute_id: u32,
}

impl ReadValueId {
    /// Reads the Value attribute of `node_id`.
    pub fn value(node_id: NodeId) -> Self {
        Self {
            node_id,
            attribute_id: ATTRIBUTE_VALUE,
        }
    }
}

/// Which timestamps the server should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampsToReturn {
    /// Source timestamp only.
    Source,
    /// Server timestamp only.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// No timestamps.
    Neither,
}

/// A batched Read service request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    /// Maximum age of a cached value the server may return, in milliseconds.
    pub max_age_ms: f64,
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Nodes to read, in order.
    pub nodes_to_read: Vec<ReadValueId>,
}

impl ReadRequest {
    /// Builds a request for the Value attribute of each node, in order.
    pub fn for_nodes(nodes: &[NodeDef]) -> Self {
        Self {
            max_age_ms: 0.0,
            timestamps_to_return: TimestampsToReturn::Both,
            nodes_to_read: nodes
                .iter()
                .map(|node| ReadValueId::value(node.node_id.clone()))
                .collect(),
        }
    }

    /// Sets the maximum cache age.
    pub fn with_max_age(mut self, max_age_ms: f64) -> Self {
        self.max_age_ms = max_age_ms;
        self
    }

    /// Sets which timestamps to return.
    pub fn with_timestamps(mut self, timestamps: TimestampsToReturn) -> Self {
        self.timestamps_to_return = timestamps;
        self
    }

    /// Returns the number of nodes requested.
    pub fn len(&self) -> usize {
        self.nodes_to_read.len()
    }

    /// Returns `true` if no nodes are requested.
    pub fn is_empty(&self) -> bool {
        self.nodes_to_read.is_empty()
    }
}

// =============================================================================
// Read response
// =============================================================================

/// A value with its quality and timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// The value. `None` when the server sent no variant.
    pub value: Option<Variant>,
    /// Quality of the value.
    pub status: StatusCode,
    /// Timestamp from the data source.
    pub source_timestamp: Option<DateTime<Utc>>,
    /// Timestamp from the server.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good value without timestamps.
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Creates a value with no variant.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the status.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the source timestamp.
    pub fn with_source_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.source_timestamp = Some(timestamp);
        self
    }

    /// Sets the server timestamp.
    pub fn with_server_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.server_timestamp = Some(timestamp);
        self
    }
}

/// A Read service response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResponse {
    /// One result per requested node, in request order.
    pub results: Vec<DataValue>,
}

impl ReadResponse {
    /// Creates a response from results.
    pub fn new(results: Vec<DataValue>) -> Self {
        Self { results }
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
