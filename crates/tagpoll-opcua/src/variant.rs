// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The OPC UA value union.
//!
//! [`Variant`] is closed: the protocol stack classifies every decoded value
//! into one arm before it reaches the codec. Structured values arrive as
//! [`ExtensionObject`]s whose `body` is `Some` only when the stack had the
//! type's schema registered.
//!
//! All types here implement `serde::Serialize` producing plain JSON:
//! structures become objects with keys in field order, byte strings become
//! base64 text, and non-finite floats fail to serialize.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::status::StatusCode;
use crate::types::NodeId;

// =============================================================================
// Variant
// =============================================================================

/// A dynamically typed OPC UA value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// Boolean.
    Boolean(bool),
    /// Signed 8-bit integer.
    SByte(i8),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// IEEE 754 single precision.
    Float(f32),
    /// IEEE 754 double precision.
    Double(f64),
    /// Text.
    String(String),
    /// Point in time.
    DateTime(DateTime<Utc>),
    /// GUID.
    Guid(Uuid),
    /// Raw bytes.
    ByteString(Vec<u8>),
    /// Node identifier.
    NodeId(NodeId),
    /// Status code.
    StatusCode(StatusCode),
    /// Text with locale.
    LocalizedText(LocalizedText),
    /// Name qualified by a namespace.
    QualifiedName(QualifiedName),
    /// A single structured value.
    ExtensionObject(ExtensionObject),
    /// An array of structured values.
    ExtensionObjectArray(Vec<ExtensionObject>),
    /// An array of any other element type.
    Array(Vec<Variant>),
}

impl Variant {
    /// Returns the OPC UA name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Null",
            Self::Boolean(_) => "Boolean",
            Self::SByte(_) => "SByte",
            Self::Byte(_) => "Byte",
            Self::Int16(_) => "Int16",
            Self::UInt16(_) => "UInt16",
            Self::Int32(_) => "Int32",
            Self::UInt32(_) => "UInt32",
            Self::Int64(_) => "Int64",
            Self::UInt64(_) => "UInt64",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
            Self::ByteString(_) => "ByteString",
            Self::NodeId(_) => "NodeId",
            Self::StatusCode(_) => "StatusCode",
            Self::LocalizedText(_) => "LocalizedText",
            Self::QualifiedName(_) => "QualifiedName",
            Self::ExtensionObject(_) => "ExtensionObject",
            Self::ExtensionObjectArray(_) => "ExtensionObject[]",
            Self::Array(_) => "Array",
        }
    }
}

macro_rules! impl_from_for_variant {
    ($($ty:ty => $arm:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(value: $ty) -> Self {
                    Self::$arm(value)
                }
            }
        )*
    };
}

impl_from_for_variant! {
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime<Utc> => DateTime,
    Uuid => Guid,
    NodeId => NodeId,
    StatusCode => StatusCode,
    LocalizedText => LocalizedText,
    QualifiedName => QualifiedName,
    ExtensionObject => ExtensionObject,
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<ExtensionObject>> for Variant {
    fn from(value: Vec<ExtensionObject>) -> Self {
        Self::ExtensionObjectArray(value)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Self::Array(value)
    }
}

impl Serialize for Variant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_unit(),
            Self::Boolean(v) => serializer.serialize_bool(*v),
            Self::SByte(v) => serializer.serialize_i8(*v),
            Self::Byte(v) => serializer.serialize_u8(*v),
            Self::Int16(v) => serializer.serialize_i16(*v),
            Self::UInt16(v) => serializer.serialize_u16(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::UInt32(v) => serializer.serialize_u32(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::UInt64(v) => serializer.serialize_u64(*v),
            Self::Float(v) if v.is_finite() => serializer.serialize_f32(*v),
            Self::Double(v) if v.is_finite() => serializer.serialize_f64(*v),
            Self::Float(v) => Err(S::Error::custom(format!("unsupported value: {v}"))),
            Self::Double(v) => Err(S::Error::custom(format!("unsupported value: {v}"))),
            Self::String(v) => serializer.serialize_str(v),
            Self::DateTime(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Guid(v) => serializer.collect_str(&v.hyphenated()),
            Self::ByteString(v) => serializer.serialize_str(&BASE64.encode(v)),
            Self::NodeId(v) => v.serialize(serializer),
            Self::StatusCode(v) => serializer.collect_str(v),
            Self::LocalizedText(v) => v.serialize(serializer),
            Self::QualifiedName(v) => v.serialize(serializer),
            Self::ExtensionObject(v) => v.serialize(serializer),
            Self::ExtensionObjectArray(v) => serializer.collect_seq(v),
            Self::Array(v) => serializer.collect_seq(v),
        }
    }
}

// =============================================================================
// Text types
// =============================================================================

/// Human-readable text with an optional locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LocalizedText {
    /// Locale, e.g. `en-US`.
    #[serde(rename = "Locale")]
    pub locale: String,
    /// The text.
    #[serde(rename = "Text")]
    pub text: String,
}

impl LocalizedText {
    /// Creates localized text.
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }
}

/// A name qualified by a namespace index.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QualifiedName {
    /// Namespace index.
    #[serde(rename = "NamespaceIndex")]
    pub namespace_index: u16,
    /// The name.
    #[serde(rename = "Name")]
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

// =============================================================================
// ExtensionObject
// =============================================================================

/// Wire encoding the extension object arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtensionObjectEncoding {
    /// No body.
    #[default]
    None,
    /// OPC UA binary.
    Binary,
    /// XML.
    Xml,
}

impl fmt::Display for ExtensionObjectEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Binary => "binary",
            Self::Xml => "xml",
        })
    }
}

/// A structured value tagged by its data type encoding id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionObject {
    /// Encoding id of the structure.
    pub type_id: NodeId,
    /// Encoding of the original body.
    pub encoding: ExtensionObjectEncoding,
    /// Decoded body, or `None` if the type was not registered with the stack.
    pub body: Option<Structure>,
}

impl ExtensionObject {
    /// Creates a decoded extension object.
    pub fn decoded(type_id: NodeId, body: Structure) -> Self {
        Self {
            type_id,
            encoding: ExtensionObjectEncoding::Binary,
            body: Some(body),
        }
    }

    /// Creates an extension object whose body could not be decoded.
    pub fn opaque(type_id: NodeId, encoding: ExtensionObjectEncoding) -> Self {
        Self {
            type_id,
            encoding,
            body: None,
        }
    }

    /// Returns `true` if the body was decoded.
    #[inline]
    pub fn is_decoded(&self) -> bool {
        self.body.is_some()
    }
}

impl Serialize for ExtensionObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.body {
            Some(body) => body.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

// =============================================================================
// Structure
// =============================================================================

/// A decoded structure with ordered fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    /// Field names and values in declaration order.
    pub fields: Vec<(String, Variant)>,
}

impl Structure {
    /// Creates an empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns a field value by name.
    pub fn get(&self, name: &str) -> Option<&Variant> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Structure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Tests
// =============================================================================
