// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Classification of failed reads.
//!
//! A read failure is session-fatal only when its protocol status proves the
//! session can no longer serve requests. The set is a static table; adding a
//! fatal code is a one-line change to [`SESSION_FATAL_STATUS_CODES`].

use std::fmt;

use crate::error::SessionError;
use crate::status::StatusCode;

/// How the read coordinator reacts to a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultClass {
    /// The session is unusable: close it and signal reconnect.
    SessionFatal,
    /// Anything else: propagate unchanged.
    Other,
}

impl FaultClass {
    /// Returns `true` for [`FaultClass::SessionFatal`].
    #[inline]
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionFatal)
    }
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SessionFatal => "session_fatal",
            Self::Other => "other",
        })
    }
}

/// Status codes that prove a session is dead.
pub const SESSION_FATAL_STATUS_CODES: [StatusCode; 6] = [
    StatusCode::BAD_SESSION_ID_INVALID,
    StatusCode::BAD_COMMUNICATION_ERROR,
    StatusCode::BAD_CONNECTION_CLOSED,
    StatusCode::BAD_TIMEOUT,
    StatusCode::BAD_CONNECTION_REJECTED,
    StatusCode::BAD_SERVER_NOT_CONNECTED,
];

/// Classifies a protocol status. Info bits are ignored.
pub fn classify_status(status: StatusCode) -> FaultClass {
    if SESSION_FATAL_STATUS_CODES
        .iter()
        .any(|fatal| fatal.matches(status))
    {
        FaultClass::SessionFatal
    } else {
        FaultClass::Other
    }
}

/// Classifies a session error. Errors without a status are always [`FaultClass::Other`].
pub fn classify(error: &SessionError) -> FaultClass {
    error
        .status_code()
        .map(classify_status)
        .unwrap_or(FaultClass::Other)
}

// =============================================================================
// Tests
// =============================================================================
