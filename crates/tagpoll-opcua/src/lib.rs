// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagpoll-opcua
//!
//! OPC UA side of the tagpoll connector: converts read results into pipeline
//! payloads and keeps a dead session from being mistaken for a failed read.
//!
//! ## Modules
//!
//! - [`codec`]: [`ValueCodec`], one [`DataValue`] in, a payload or a suppression out
//! - [`reader`]: [`ReadCoordinator`], batched reads with session-fault handling
//! - [`fault`]: the static table of session-fatal status codes
//! - [`session`]: the [`SessionHandle`] trait the coordinator reads through
//! - [`variant`], [`types`], [`status`]: the OPC UA value model
//! - [`config`]: [`ReaderConfig`] and its YAML/TOML/JSON loader
//! - [`error`]: [`SessionError`], [`ReadError`], [`ConfigError`]
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  read   ┌──────────────────┐
//! │ ReadCoordinator│────────▶│  SessionHandle   │ (owned by the session manager)
//! └───────┬────────┘         └──────────────────┘
//!         │ fatal status → close() + NotConnected
//!         │ per result, in order
//!         ▼
//! ┌────────────────┐
//! │   ValueCodec   │──▶ TagMessage / suppressed (logged)
//! └────────────────┘
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod config;
pub mod error;
pub mod fault;
pub mod reader;
pub mod session;
pub mod status;
pub mod types;
pub mod variant;

pub use codec::{Decoded, Payload, SuppressReason, ValueCodec};
pub use config::{ConfigFormat, ReaderConfig, ReaderConfigBuilder};
pub use error::{ConfigError, ReadError, SessionError};
pub use fault::{classify, classify_status, FaultClass, SESSION_FATAL_STATUS_CODES};
pub use reader::{ReadContext, ReadCoordinator, ReaderStats};
pub use session::SessionHandle;
pub use status::StatusCode;
pub use types::{
    DataValue, NodeDef, NodeId, NodeIdentifier, ReadRequest, ReadResponse, ReadValueId,
    TimestampsToReturn,
};
pub use variant::{
    ExtensionObject, ExtensionObjectEncoding, LocalizedText, QualifiedName, Structure, Variant,
};
