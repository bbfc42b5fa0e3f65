// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagpoll-core
//!
//! Pipeline-facing building blocks shared by tagpoll connectors.
//!
//! - [`message`]: [`TagMessage`] and [`TagType`], the unit a connector emits per tag
//! - [`error`]: [`ConnectorError`], including the canonical
//!   [`ConnectorError::NotConnected`] reconnect signal
//! - [`logging`]: the injectable [`LogSink`] capability, its `tracing` and
//!   in-memory implementations, and subscriber setup

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod logging;
pub mod message;

pub use error::{ConnectorError, ConnectorResult};
pub use logging::{init_logging, LogFormat, LogLevel, LogRecord, LogSink, MemorySink, TracingSink};
pub use message::{TagMessage, TagType};
