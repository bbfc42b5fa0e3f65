// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA status codes.
//!
//! A status code is a 32-bit value. The top two bits carry the severity
//! (good, uncertain, bad), bits 16..30 the sub-code, and the low 16 bits
//! informational flags. Two codes are considered the same condition when they
//! agree on everything but the info bits.
//!
//! # Examples
//!
//! ```
//! use tagpoll_opcua::status::StatusCode;
//!
//! let status = StatusCode::BAD_TIMEOUT;
//! assert!(status.is_bad());
//! assert_eq!(status.name(), "BadTimeout");
//! assert_eq!(status.to_string(), "BadTimeout (0x800A0000)");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

const SEVERITY_MASK: u32 = 0xC000_0000;
const SEVERITY_UNCERTAIN: u32 = 0x4000_0000;
const SEVERITY_BAD: u32 = 0x8000_0000;
const INFO_BITS_MASK: u32 = 0x0000_FFFF;

// =============================================================================
// StatusCode
// =============================================================================

/// An OPC UA status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: Self = Self(0x0000_0000);
    /// The value has been overridden locally.
    pub const GOOD_LOCAL_OVERRIDE: Self = Self(0x0096_0000);

    /// The value is uncertain.
    pub const UNCERTAIN: Self = Self(0x4000_0000);
    /// Communication failed; the last usable value is returned.
    pub const UNCERTAIN_NO_COMMUNICATION_LAST_USABLE_VALUE: Self = Self(0x408F_0000);
    /// Whatever was updating this value has stopped doing so.
    pub const UNCERTAIN_LAST_USABLE_VALUE: Self = Self(0x4090_0000);
    /// The value is a substitute.
    pub const UNCERTAIN_SUBSTITUTE_VALUE: Self = Self(0x4091_0000);
    /// The value is an initial value.
    pub const UNCERTAIN_INITIAL_VALUE: Self = Self(0x4092_0000);
    /// The sensor is known to be inaccurate.
    pub const UNCERTAIN_SENSOR_NOT_ACCURATE: Self = Self(0x4093_0000);

    /// The value is bad but no specific reason is known.
    pub const BAD: Self = Self(0x8000_0000);
    /// An unexpected error occurred.
    pub const BAD_UNEXPECTED_ERROR: Self = Self(0x8001_0000);
    /// An internal error occurred.
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    /// Not enough memory to complete the operation.
    pub const BAD_OUT_OF_MEMORY: Self = Self(0x8003_0000);
    /// An operating system resource is not available.
    pub const BAD_RESOURCE_UNAVAILABLE: Self = Self(0x8004_0000);
    /// A low level communication error occurred.
    pub const BAD_COMMUNICATION_ERROR: Self = Self(0x8005_0000);
    /// Encoding halted because of invalid data.
    pub const BAD_ENCODING_ERROR: Self = Self(0x8006_0000);
    /// Decoding halted because of invalid data.
    pub const BAD_DECODING_ERROR: Self = Self(0x8007_0000);
    /// The message encoding/decoding limits imposed by the stack were exceeded.
    pub const BAD_ENCODING_LIMITS_EXCEEDED: Self = Self(0x8008_0000);
    /// An unrecognized response was received from the server.
    pub const BAD_UNKNOWN_RESPONSE: Self = Self(0x8009_0000);
    /// The operation timed out.
    pub const BAD_TIMEOUT: Self = Self(0x800A_0000);
    /// The server does not support the requested service.
    pub const BAD_SERVICE_UNSUPPORTED: Self = Self(0x800B_0000);
    /// The operation was cancelled because the application is shutting down.
    pub const BAD_SHUTDOWN: Self = Self(0x800C_0000);
    /// The operation could not complete because the client is not connected to the server.
    pub const BAD_SERVER_NOT_CONNECTED: Self = Self(0x800D_0000);
    /// The server has stopped and cannot process any requests.
    pub const BAD_SERVER_HALTED: Self = Self(0x800E_0000);
    /// There was nothing to do because the client passed a list of operations with no elements.
    pub const BAD_NOTHING_TO_DO: Self = Self(0x800F_0000);
    /// The request could not be processed because it specified too many operations.
    pub const BAD_TOO_MANY_OPERATIONS: Self = Self(0x8010_0000);
    /// The extension object cannot be decoded because the data type id is not recognized.
    pub const BAD_DATA_TYPE_ID_UNKNOWN: Self = Self(0x8011_0000);
    /// The certificate provided as a parameter is not valid.
    pub const BAD_CERTIFICATE_INVALID: Self = Self(0x8012_0000);
    /// An error occurred verifying security.
    pub const BAD_SECURITY_CHECKS_FAILED: Self = Self(0x8013_0000);
    /// The certificate is not trusted.
    pub const BAD_CERTIFICATE_UNTRUSTED: Self = Self(0x801A_0000);
    /// User does not have permission to perform the requested operation.
    pub const BAD_USER_ACCESS_DENIED: Self = Self(0x801F_0000);
    /// The user identity token is not valid.
    pub const BAD_IDENTITY_TOKEN_INVALID: Self = Self(0x8020_0000);
    /// The user identity token is valid but the server has rejected it.
    pub const BAD_IDENTITY_TOKEN_REJECTED: Self = Self(0x8021_0000);
    /// The specified secure channel is no longer valid.
    pub const BAD_SECURE_CHANNEL_ID_INVALID: Self = Self(0x8022_0000);
    /// The timestamp is outside the range allowed by the server.
    pub const BAD_INVALID_TIMESTAMP: Self = Self(0x8023_0000);
    /// The nonce does appear to be not a random value or it is not the correct length.
    pub const BAD_NONCE_INVALID: Self = Self(0x8024_0000);
    /// The session id is not valid.
    pub const BAD_SESSION_ID_INVALID: Self = Self(0x8025_0000);
    /// The session was closed by the client.
    pub const BAD_SESSION_CLOSED: Self = Self(0x8026_0000);
    /// The session cannot be used because ActivateSession has not been called.
    pub const BAD_SESSION_NOT_ACTIVATED: Self = Self(0x8027_0000);
    /// The subscription id is not valid.
    pub const BAD_SUBSCRIPTION_ID_INVALID: Self = Self(0x8028_0000);
    /// The header for the request is missing or invalid.
    pub const BAD_REQUEST_HEADER_INVALID: Self = Self(0x802A_0000);
    /// The timestamps to return parameter is invalid.
    pub const BAD_TIMESTAMPS_TO_RETURN_INVALID: Self = Self(0x802B_0000);
    /// The request was cancelled by the client.
    pub const BAD_REQUEST_CANCELLED_BY_CLIENT: Self = Self(0x802C_0000);
    /// Communication with the data source is defined, but not established.
    pub const BAD_NO_COMMUNICATION: Self = Self(0x8031_0000);
    /// Waiting for the server to obtain values from the underlying data source.
    pub const BAD_WAITING_FOR_INITIAL_DATA: Self = Self(0x8032_0000);
    /// The syntax of the node id is not valid.
    pub const BAD_NODE_ID_INVALID: Self = Self(0x8033_0000);
    /// The node id refers to a node that does not exist in the server address space.
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: Self = Self(0x8035_0000);
    /// The syntax of the index range parameter is invalid.
    pub const BAD_INDEX_RANGE_INVALID: Self = Self(0x8036_0000);
    /// No data exists within the range of indexes specified.
    pub const BAD_INDEX_RANGE_NO_DATA: Self = Self(0x8037_0000);
    /// The data encoding is invalid.
    pub const BAD_DATA_ENCODING_INVALID: Self = Self(0x8038_0000);
    /// The server does not support the requested data encoding for the node.
    pub const BAD_DATA_ENCODING_UNSUPPORTED: Self = Self(0x8039_0000);
    /// The access level does not allow reading or subscribing to the node.
    pub const BAD_NOT_READABLE: Self = Self(0x803A_0000);
    /// The access level does not allow writing to the node.
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    /// The value was out of range.
    pub const BAD_OUT_OF_RANGE: Self = Self(0x803C_0000);
    /// The requested operation is not supported.
    pub const BAD_NOT_SUPPORTED: Self = Self(0x803D_0000);
    /// A requested item was not found or a search operation ended without success.
    pub const BAD_NOT_FOUND: Self = Self(0x803E_0000);
    /// The object cannot be used because it has been deleted.
    pub const BAD_OBJECT_DELETED: Self = Self(0x803F_0000);
    /// Requested operation is not implemented.
    pub const BAD_NOT_IMPLEMENTED: Self = Self(0x8040_0000);
    /// The server has reached its maximum number of sessions.
    pub const BAD_TOO_MANY_SESSIONS: Self = Self(0x8056_0000);
    /// The value supplied for the attribute is not of the same type as the attribute's value.
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    /// The server cannot process the request because it is too busy.
    pub const BAD_TCP_SERVER_TOO_BUSY: Self = Self(0x807D_0000);
    /// An internal error occurred in the TCP layer.
    pub const BAD_TCP_INTERNAL_ERROR: Self = Self(0x8082_0000);
    /// The network request was interrupted.
    pub const BAD_REQUEST_INTERRUPTED: Self = Self(0x8084_0000);
    /// Timeout occurred while processing the request.
    pub const BAD_REQUEST_TIMEOUT: Self = Self(0x8085_0000);
    /// The secure channel has been closed.
    pub const BAD_SECURE_CHANNEL_CLOSED: Self = Self(0x8086_0000);
    /// The variable should receive its value from another variable, but has never been configured to do so.
    pub const BAD_NOT_CONNECTED: Self = Self(0x808A_0000);
    /// There has been a failure in the device/data source that generates the value.
    pub const BAD_DEVICE_FAILURE: Self = Self(0x808B_0000);
    /// There has been a failure in the sensor from which the value is derived.
    pub const BAD_SENSOR_FAILURE: Self = Self(0x808C_0000);
    /// The source of the data is not operational.
    pub const BAD_OUT_OF_SERVICE: Self = Self(0x808D_0000);
    /// The request could not be sent because of a network interruption.
    pub const BAD_CONNECTION_REJECTED: Self = Self(0x80AC_0000);
    /// The server has disconnected from the client.
    pub const BAD_DISCONNECT: Self = Self(0x80AD_0000);
    /// The network connection has been closed.
    pub const BAD_CONNECTION_CLOSED: Self = Self(0x80AE_0000);
    /// The operation cannot be completed because the object is closed, uninitialized or in some other invalid state.
    pub const BAD_INVALID_STATE: Self = Self(0x80AF_0000);
    /// Cannot move beyond end of the stream.
    pub const BAD_END_OF_STREAM: Self = Self(0x80B0_0000);
    /// No data is currently available for reading from a non-blocking stream.
    pub const BAD_NO_DATA_AVAILABLE: Self = Self(0x80B1_0000);
    /// The asynchronous operation is waiting for a response.
    pub const BAD_WAITING_FOR_RESPONSE: Self = Self(0x80B2_0000);
    /// The asynchronous operation was abandoned by the caller.
    pub const BAD_OPERATION_ABANDONED: Self = Self(0x80B3_0000);
    /// The request message size exceeds limits set by the server.
    pub const BAD_REQUEST_TOO_LARGE: Self = Self(0x80B8_0000);
    /// The response message size exceeds limits set by the client.
    pub const BAD_RESPONSE_TOO_LARGE: Self = Self(0x80B9_0000);

    /// Creates a status code from its raw value.
    #[inline]
    pub const fn new(code: u32) -> Self {
        Self(code)
    }

    /// Returns the raw 32-bit value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & SEVERITY_MASK == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & SEVERITY_MASK == SEVERITY_UNCERTAIN
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & SEVERITY_BAD != 0
    }

    /// Returns `true` if this is exactly `Good` with no info bits.
    ///
    /// Values are only emitted for this status; `GoodLocalOverride` and other
    /// good-with-qualifier codes are treated as not OK.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.0 == Self::GOOD.0
    }

    /// Returns the code with the informational bits cleared.
    #[inline]
    pub const fn without_info_bits(&self) -> Self {
        Self(self.0 & !INFO_BITS_MASK)
    }

    /// Returns `true` if both codes describe the same condition, ignoring
    /// informational bits.
    #[inline]
    pub const fn matches(&self, other: StatusCode) -> bool {
        self.without_info_bits().0 == other.without_info_bits().0
    }

    /// Returns the symbolic name, or `"Unknown"` for codes not in the table.
    pub fn name(&self) -> &'static str {
        let code = self.without_info_bits().0;
        STATUS_NAMES
            .iter()
            .find(|(value, _)| *value == code)
            .map(|(_, name)| *name)
            .unwrap_or("Unknown")
    }
}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl From<StatusCode> for u32 {
    fn from(status: StatusCode) -> Self {
        status.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.0)
    }
}

/// Symbolic names for every code with a constant on [`StatusCode`].
pub const STATUS_NAMES: &[(u32, &str)] = &[
    (0x0000_0000, "Good"),
    (0x0096_0000, "GoodLocalOverride"),
    (0x4000_0000, "Uncertain"),
    (0x408F_0000, "UncertainNoCommunicationLastUsableValue"),
    (0x4090_0000, "UncertainLastUsableValue"),
    (0x4091_0000, "UncertainSubstituteValue"),
    (0x4092_0000, "UncertainInitialValue"),
    (0x4093_0000, "UncertainSensorNotAccurate"),
    (0x8000_0000, "Bad"),
    (0x8001_0000, "BadUnexpectedError"),
    (0x8002_0000, "BadInternalError"),
    (0x8003_0000, "BadOutOfMemory"),
    (0x8004_0000, "BadResourceUnavailable"),
    (0x8005_0000, "BadCommunicationError"),
    (0x8006_0000, "BadEncodingError"),
    (0x8007_0000, "BadDecodingError"),
    (0x8008_0000, "BadEncodingLimitsExceeded"),
    (0x8009_0000, "BadUnknownResponse"),
    (0x800A_0000, "BadTimeout"),
    (0x800B_0000, "BadServiceUnsupported"),
    (0x800C_0000, "BadShutdown"),
    (0x800D_0000, "BadServerNotConnected"),
    (0x800E_0000, "BadServerHalted"),
    (0x800F_0000, "BadNothingToDo"),
    (0x8010_0000, "BadTooManyOperations"),
    (0x8011_0000, "BadDataTypeIdUnknown"),
    (0x8012_0000, "BadCertificateInvalid"),
    (0x8013_0000, "BadSecurityChecksFailed"),
    (0x801A_0000, "BadCertificateUntrusted"),
    (0x801F_0000, "BadUserAccessDenied"),
    (0x8020_0000, "BadIdentityTokenInvalid"),
    (0x8021_0000, "BadIdentityTokenRejected"),
    (0x8022_0000, "BadSecureChannelIdInvalid"),
    (0x8023_0000, "BadInvalidTimestamp"),
    (0x8024_0000, "BadNonceInvalid"),
    (0x8025_0000, "BadSessionIdInvalid"),
    (0x8026_0000, "BadSessionClosed"),
    (0x8027_0000, "BadSessionNotActivated"),
    (0x8028_0000, "BadSubscriptionIdInvalid"),
    (0x802A_0000, "BadRequestHeaderInvalid"),
    (0x802B_0000, "BadTimestampsToReturnInvalid"),
    (0x802C_0000, "BadRequestCancelledByClient"),
    (0x8031_0000, "BadNoCommunication"),
    (0x8032_0000, "BadWaitingForInitialData"),
    (0x8033_0000, "BadNodeIdInvalid"),
    (0x8034_0000, "BadNodeIdUnknown"),
    (0x8035_0000, "BadAttributeIdInvalid"),
    (0x8036_0000, "BadIndexRangeInvalid"),
    (0x8037_0000, "BadIndexRangeNoData"),
    (0x8038_0000, "BadDataEncodingInvalid"),
    (0x8039_0000, "BadDataEncodingUnsupported"),
    (0x803A_0000, "BadNotReadable"),
    (0x803B_0000, "BadNotWritable"),
    (0x803C_0000, "BadOutOfRange"),
    (0x803D_0000, "BadNotSupported"),
    (0x803E_0000, "BadNotFound"),
    (0x803F_0000, "BadObjectDeleted"),
    (0x8040_0000, "BadNotImplemented"),
    (0x8056_0000, "BadTooManySessions"),
    (0x8074_0000, "BadTypeMismatch"),
    (0x807D_0000, "BadTcpServerTooBusy"),
    (0x8082_0000, "BadTcpInternalError"),
    (0x8084_0000, "BadRequestInterrupted"),
    (0x8085_0000, "BadRequestTimeout"),
    (0x8086_0000, "BadSecureChannelClosed"),
    (0x808A_0000, "BadNotConnected"),
    (0x808B_0000, "BadDeviceFailure"),
    (0x808C_0000, "BadSensorFailure"),
    (0x808D_0000, "BadOutOfService"),
    (0x80AC_0000, "BadConnectionRejected"),
    (0x80AD_0000, "BadDisconnect"),
    (0x80AE_0000, "BadConnectionClosed"),
    (0x80AF_0000, "BadInvalidState"),
    (0x80B0_0000, "BadEndOfStream"),
    (0x80B1_0000, "BadNoDataAvailable"),
    (0x80B2_0000, "BadWaitingForResponse"),
    (0x80B3_0000, "BadOperationAbandoned"),
    (0x80B8_0000, "BadRequestTooLarge"),
    (0x80B9_0000, "BadResponseTooLarge"),
];

// =============================================================================
// Tests
// =============================================================================
