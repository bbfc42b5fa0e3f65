// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The session handle the read coordinator reads through.
//!
//! Session creation, renewal and reconnection belong to the session manager
//! that owns the handle. The coordinator only borrows it to issue reads and,
//! when a read proves the session dead, to ask for it to be closed.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SessionError;
use crate::types::{ReadRequest, ReadResponse};

// =============================================================================
// SessionHandle Trait
// =============================================================================

/// An active OPC UA session.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. A single session is not expected to
/// serve overlapping reads; callers serialize reads against one handle or
/// rely on the handle's own queuing.
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Issues a Read service call.
    ///
    /// On success the response holds one result per requested node, in
    /// request order. Dropping the returned future abandons the call.
    async fn read(&self, request: &ReadRequest) -> Result<ReadResponse, SessionError>;

    /// Closes the session.
    ///
    /// Must be idempotent and safe to call on a session that is already
    /// unusable.
    async fn close(&self) -> Result<(), SessionError>;

    /// Returns the endpoint URL, for logging.
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: SessionHandle + ?Sized> SessionHandle for Arc<T> {
    async fn read(&self, request: &ReadRequest) -> Result<ReadResponse, SessionError> {
        (**self).read(request).await
    }

    async fn close(&self) -> Result<(), SessionError> {
        (**self).close().await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
