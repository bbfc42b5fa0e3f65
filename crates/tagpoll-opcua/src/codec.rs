// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Conversion of OPC UA values into pipeline payloads.
//!
//! [`ValueCodec::decode`] reduces one [`DataValue`] to either a [`Payload`]
//! (bytes plus a [`TagType`]) or [`Decoded::Suppressed`]. It never fails: a
//! value that cannot or should not be emitted is logged through the injected
//! [`LogSink`] and suppressed, and the rest of the batch carries on.
//!
//! Rules, first match wins:
//!
//! | Input | Result |
//! |---|---|
//! | no variant | suppressed, error log |
//! | status other than `Good` | suppressed, warning |
//! | `Float` / `Double` | shortest round-trip decimal, `number` |
//! | any integer width | base-10 text, `number` |
//! | `String` | bytes verbatim, `string` |
//! | `Boolean` | `true` / `false`, `bool` |
//! | `ExtensionObject` | JSON of the decoded body, `string`; suppressed if not decodable |
//! | `ExtensionObject[]` | JSON array of the decodable elements, `string`; suppressed if none |
//! | anything else | JSON, `string` |
//!
//! An empty payload from any branch is suppressed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagpoll_core::{MemorySink, TagType};
//! use tagpoll_opcua::codec::ValueCodec;
//! use tagpoll_opcua::types::{DataValue, NodeDef, NodeId};
//!
//! let codec = ValueCodec::new(Arc::new(MemorySink::new()));
//! let node = NodeDef::new(NodeId::numeric(2, 1001));
//!
//! let decoded = codec.decode(&DataValue::new(3.14f64), &node);
//! let payload = decoded.payload().unwrap();
//! assert_eq!(payload.bytes, b"3.14");
//! assert_eq!(payload.tag_type, TagType::Number);
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tagpoll_core::{LogRecord, LogSink, TagMessage, TagType, TracingSink};

use crate::status::StatusCode;
use crate::types::{DataValue, NodeDef, NodeId};
use crate::variant::{Structure, Variant};

// =============================================================================
// Decoded
// =============================================================================

/// Bytes and semantic type for one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Payload bytes. Never empty.
    pub bytes: Vec<u8>,
    /// Semantic type of the payload.
    pub tag_type: TagType,
}

impl Payload {
    fn new(bytes: impl Into<Vec<u8>>, tag_type: TagType) -> Self {
        Self {
            bytes: bytes.into(),
            tag_type,
        }
    }

    fn number(text: String) -> Self {
        Self::new(text, TagType::Number)
    }

    /// Returns the payload as text if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// Why a value produced no payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SuppressReason {
    /// The server sent no variant.
    EmptyVariant,
    /// The value's status was not `Good`.
    BadStatus(StatusCode),
    /// The structure's type is not registered for decoding.
    UndecodableStructure {
        /// Encoding id of the structure.
        type_id: NodeId,
    },
    /// None of the structures in the array could be decoded.
    NoDecodableElements {
        /// Number of elements in the array.
        total: usize,
    },
    /// JSON serialization failed.
    Serialization(String),
    /// A branch produced no bytes.
    EmptyPayload,
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyVariant => f.write_str("variant is nil"),
            Self::BadStatus(status) => write!(f, "status {status}"),
            Self::UndecodableStructure { type_id } => {
                write!(f, "ExtensionObject type {type_id} not decodable")
            }
            Self::NoDecodableElements { total } => {
                write!(f, "none of {total} ExtensionObjects decodable")
            }
            Self::Serialization(message) => write!(f, "serialization failed: {message}"),
            Self::EmptyPayload => f.write_str("payload is empty"),
        }
    }
}

/// Outcome of decoding one value.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The value converted to a payload.
    Payload(Payload),
    /// Nothing is emitted for this value.
    Suppressed(SuppressReason),
}

impl Decoded {
    /// Returns the payload, if any.
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Payload(payload) => Some(payload),
            Self::Suppressed(_) => None,
        }
    }

    /// Consumes `self` and returns the payload, if any.
    pub fn into_payload(self) -> Option<Payload> {
        match self {
            Self::Payload(payload) => Some(payload),
            Self::Suppressed(_) => None,
        }
    }

    /// Returns `true` if nothing is emitted.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }

    /// Returns the suppression reason, if any.
    pub fn suppress_reason(&self) -> Option<&SuppressReason> {
        match self {
            Self::Payload(_) => None,
            Self::Suppressed(reason) => Some(reason),
        }
    }
}

// =============================================================================
// ValueCodec
// =============================================================================

/// Converts data values into payloads.
///
/// Stateless apart from the log sink; decoding the same input twice yields
/// identical output.
#[derive(Clone)]
pub struct ValueCodec {
    log: Arc<dyn LogSink>,
}

impl ValueCodec {
    /// Creates a codec that logs through `log`.
    pub fn new(log: Arc<dyn LogSink>) -> Self {
        Self { log }
    }

    /// Decodes one value in the context of its tag.
    pub fn decode(&self, value: &DataValue, node: &NodeDef) -> Decoded {
        match self.encode(value, node) {
            Ok(payload) if payload.bytes.is_empty() => {
                self.log.log(
                    LogRecord::error(format!("Payload is empty for node {}", node.node_id))
                        .with_node(&node.node_id),
                );
                Decoded::Suppressed(SuppressReason::EmptyPayload)
            }
            Ok(payload) => Decoded::Payload(payload),
            Err(reason) => Decoded::Suppressed(reason),
        }
    }

    /// Decodes one value and wraps it as a pipeline message.
    ///
    /// Returns `None` when the value is suppressed.
    pub fn to_message(&self, value: &DataValue, node: &NodeDef) -> Option<TagMessage> {
        let payload = self.decode(value, node).into_payload()?;
        Some(
            TagMessage::new(node.node_id.to_string(), payload.bytes, payload.tag_type)
                .with_browse_name(node.browse_name.clone())
                .with_path(node.path.clone())
                .with_timestamps(value.source_timestamp, value.server_timestamp),
        )
    }

    fn encode(&self, value: &DataValue, node: &NodeDef) -> Result<Payload, SuppressReason> {
        let Some(variant) = &value.value else {
            self.log
                .log(LogRecord::error("Variant is nil").with_node(&node.node_id));
            return Err(SuppressReason::EmptyVariant);
        };

        if !value.status.is_ok() {
            self.log.log(
                LogRecord::warn(format!(
                    "Skipping node {}: status {}",
                    node.node_id, value.status
                ))
                .with_node(&node.node_id)
                .with_field("status", value.status),
            );
            return Err(SuppressReason::BadStatus(value.status));
        }

        match variant {
            Variant::Float(v) => Ok(Payload::number(format_float(*v))),
            Variant::Double(v) => Ok(Payload::number(format_float(*v))),
            Variant::SByte(v) => Ok(Payload::number(v.to_string())),
            Variant::Byte(v) => Ok(Payload::number(v.to_string())),
            Variant::Int16(v) => Ok(Payload::number(v.to_string())),
            Variant::UInt16(v) => Ok(Payload::number(v.to_string())),
            Variant::Int32(v) => Ok(Payload::number(v.to_string())),
            Variant::UInt32(v) => Ok(Payload::number(v.to_string())),
            Variant::Int64(v) => Ok(Payload::number(v.to_string())),
            Variant::UInt64(v) => Ok(Payload::number(v.to_string())),
            Variant::String(v) => Ok(Payload::new(v.as_bytes(), TagType::String)),
            Variant::Boolean(v) => Ok(Payload::new(v.to_string(), TagType::Bool)),
            Variant::ExtensionObject(object) => match &object.body {
                Some(body) => self.to_json(body, node, "ExtensionObject value"),
                None => {
                    self.log.log(
                        LogRecord::warn(format!(
                            "Skipping node {}: ExtensionObject type {} not decodable (type not registered)",
                            node.node_id, object.type_id
                        ))
                        .with_node(&node.node_id)
                        .with_field("type_id", &object.type_id)
                        .with_field("encoding", object.encoding),
                    );
                    Err(SuppressReason::UndecodableStructure {
                        type_id: object.type_id.clone(),
                    })
                }
            },
            Variant::ExtensionObjectArray(objects) => {
                let decoded: Vec<&Structure> =
                    objects.iter().filter_map(|object| object.body.as_ref()).collect();
                if decoded.is_empty() {
                    self.log.log(
                        LogRecord::warn(format!(
                            "Skipping node {}: array of {} ExtensionObjects, none decodable (types not registered)",
                            node.node_id,
                            objects.len()
                        ))
                        .with_node(&node.node_id)
                        .with_field("total", objects.len())
                        .with_field("decodable", 0),
                    );
                    return Err(SuppressReason::NoDecodableElements {
                        total: objects.len(),
                    });
                }
                self.to_json(&decoded, node, "ExtensionObject array")
            }
            other => self.to_json(other, node, other.type_name()),
        }
    }

    fn to_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        node: &NodeDef,
        what: &str,
    ) -> Result<Payload, SuppressReason> {
        match serde_json::to_vec(value) {
            Ok(bytes) => Ok(Payload::new(bytes, TagType::String)),
            Err(e) => {
                self.log.log(
                    LogRecord::error(format!(
                        "Error serializing {what} for node {}: {e}",
                        node.node_id
                    ))
                    .with_node(&node.node_id),
                );
                Err(SuppressReason::Serialization(e.to_string()))
            }
        }
    }
}

impl Default for ValueCodec {
    fn default() -> Self {
        Self::new(TracingSink::shared())
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCodec")
            .field("log", &self.log.name())
            .finish()
    }
}

/// Shortest decimal text that parses back to the same value, never in
/// exponent notation.
fn format_float<T: fmt::Display + Into<f64> + Copy>(value: T) -> String {
    let wide: f64 = value.into();
    if wide.is_nan() {
        "NaN".to_string()
    } else if wide.is_infinite() {
        let sign = if wide > 0.0 { '+' } else { '-' };
        format!("{sign}Inf")
    } else {
        value.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
