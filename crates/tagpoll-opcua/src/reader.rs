// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Batched reads with session-fault classification.
//!
//! [`ReadCoordinator::read`] issues one Read service call and sorts failures
//! into two outcomes:
//!
//! - the status proves the session is dead: the session is closed once and
//!   [`ReadError::NotConnected`] is returned, so the caller's reconnect policy
//!   takes over
//! - anything else: the original error is returned unchanged and the session
//!   is left alone
//!
//! Local cancellation and deadline expiry carry no protocol status and are
//! passed through without closing the session.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tagpoll_core::TracingSink;
//! use tagpoll_opcua::{ReadContext, ReadCoordinator, ReaderConfig, SessionHandle};
//!
//! # async fn poll(session: Arc<dyn SessionHandle>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReaderConfig::load("reader.yaml")?;
//! let reader = ReadCoordinator::new(session, config, TracingSink::shared());
//!
//! let ctx = ReadContext::new().with_timeout(Duration::from_secs(1));
//! match reader.poll(&ctx).await {
//!     Ok(messages) => println!("{} tags", messages.len()),
//!     Err(e) if e.is_not_connected() => println!("reconnect"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tagpoll_core::{LogRecord, LogSink, TagMessage};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::codec::ValueCodec;
use crate::config::ReaderConfig;
use crate::error::{ReadError, SessionError};
use crate::fault::{self, FaultClass};
use crate::session::SessionHandle;
use crate::types::{NodeDef, ReadRequest, ReadResponse};

// =============================================================================
// ReadContext
// =============================================================================

/// Cancellation and deadline for one read.
#[derive(Debug, Clone, Default)]
pub struct ReadContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl ReadContext {
    /// Creates a context with a fresh cancellation token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline. Overrides the configured read timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses `token` for cancellation.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns the deadline, if set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Cancels any read using this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// ReaderStats
// =============================================================================

/// Snapshot of read counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    /// Reads issued.
    pub reads: u64,
    /// Reads that returned an error.
    pub failures: u64,
    /// Failures classified as session-fatal.
    pub session_faults: u64,
    /// Values suppressed by the codec.
    pub suppressed: u64,
    /// Messages emitted.
    pub emitted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicU64,
    failures: AtomicU64,
    session_faults: AtomicU64,
    suppressed: AtomicU64,
    emitted: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ReaderStats {
        ReaderStats {
            reads: self.reads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            session_faults: self.session_faults.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            emitted: self.emitted.load(Ordering::Relaxed),
        }
    }
}

// =============================================================================
// ReadCoordinator
// =============================================================================

/// Reads through a borrowed session and classifies failures.
///
/// The only mutable state is a set of atomic counters behind
/// [`ReadCoordinator::stats`]. They are observational and never influence how
/// a read is handled.
///
/// The coordinator never reconnects. Once it has closed a session, every
/// following read is expected to fail until the session manager replaces the
/// handle.
pub struct ReadCoordinator<S: SessionHandle + ?Sized = dyn SessionHandle> {
    session: Arc<S>,
    config: ReaderConfig,
    codec: ValueCodec,
    log: Arc<dyn LogSink>,
    counters: Counters,
}

impl<S: SessionHandle + ?Sized> ReadCoordinator<S> {
    /// Creates a coordinator. The codec logs through the same sink.
    pub fn new(session: Arc<S>, config: ReaderConfig, log: Arc<dyn LogSink>) -> Self {
        Self {
            session,
            config,
            codec: ValueCodec::new(Arc::clone(&log)),
            log,
            counters: Counters::default(),
        }
    }

    /// Returns the session handle.
    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Returns the codec.
    pub fn codec(&self) -> &ValueCodec {
        &self.codec
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> ReaderStats {
        self.counters.snapshot()
    }

    /// Issues one read.
    ///
    /// On success the response is returned unchanged. On a session-fatal
    /// failure the session is closed and [`ReadError::NotConnected`] is
    /// returned. Other session failures come back as
    /// [`ReadError::Session`] holding the original error.
    ///
    /// The teardown close shares the context: cancelling it, or reaching the
    /// read deadline, stops waiting on `close()` early.
    pub async fn read(
        &self,
        ctx: &ReadContext,
        request: &ReadRequest,
    ) -> Result<ReadResponse, ReadError> {
        Counters::bump(&self.counters.reads, 1);
        let deadline = ctx.timeout.unwrap_or_else(|| self.config.read_timeout());
        let expires_at = Instant::now() + deadline;

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => None,
            result = tokio::time::timeout(deadline, self.session.read(request)) => Some(result),
        };

        match outcome {
            Some(Ok(Ok(response))) => Ok(response),
            Some(Ok(Err(error))) => Err(self.on_session_error(ctx, expires_at, error).await),
            Some(Err(_elapsed)) => {
                Counters::bump(&self.counters.failures, 1);
                self.log.log(
                    LogRecord::warn(format!("Read deadline of {deadline:?} exceeded"))
                        .with_field("endpoint", self.session.endpoint())
                        .with_field("nodes", request.len()),
                );
                Err(ReadError::DeadlineExceeded(deadline))
            }
            None => {
                Counters::bump(&self.counters.failures, 1);
                self.log.log(
                    LogRecord::debug("Read cancelled")
                        .with_field("endpoint", self.session.endpoint()),
                );
                Err(ReadError::Cancelled)
            }
        }
    }

    /// Reads `nodes` and decodes each value, in order.
    ///
    /// Suppressed values are dropped; the rest of the batch is returned.
    pub async fn read_tags(
        &self,
        ctx: &ReadContext,
        nodes: &[NodeDef],
    ) -> Result<Vec<TagMessage>, ReadError> {
        if nodes.is_empty() {
            return Ok(Vec::new());
        }

        let request = self.config.request_for(nodes);
        let response = self.read(ctx, &request).await?;

        if response.len() != nodes.len() {
            Counters::bump(&self.counters.failures, 1);
            let error = ReadError::ResultCountMismatch {
                expected: nodes.len(),
                actual: response.len(),
            };
            self.log.log(
                LogRecord::error(error.to_string())
                    .with_field("endpoint", self.session.endpoint()),
            );
            return Err(error);
        }

        let mut messages = Vec::with_capacity(nodes.len());
        for (value, node) in response.results.iter().zip(nodes) {
            if let Some(message) = self.codec.to_message(value, node) {
                messages.push(message);
            }
        }

        let emitted = messages.len() as u64;
        Counters::bump(&self.counters.emitted, emitted);
        Counters::bump(&self.counters.suppressed, nodes.len() as u64 - emitted);
        Ok(messages)
    }

    /// Reads the nodes listed in the configuration.
    pub async fn poll(&self, ctx: &ReadContext) -> Result<Vec<TagMessage>, ReadError> {
        self.read_tags(ctx, &self.config.nodes).await
    }

    async fn on_session_error(
        &self,
        ctx: &ReadContext,
        expires_at: Instant,
        error: SessionError,
    ) -> ReadError {
        Counters::bump(&self.counters.failures, 1);
        self.log.log(
            LogRecord::error(format!("Read failed: {error}"))
                .with_field("endpoint", self.session.endpoint())
                .with_field("category", error.category()),
        );

        match fault::classify(&error) {
            FaultClass::SessionFatal => {
                Counters::bump(&self.counters.session_faults, 1);
                self.log.log(
                    LogRecord::warn("Session unusable, closing")
                        .with_field("endpoint", self.session.endpoint())
                        .with_field("status", error.status_code().unwrap_or_default()),
                );
                self.close_session(ctx, expires_at).await;
                ReadError::NotConnected
            }
            FaultClass::Other => ReadError::Session(error),
        }
    }

    /// Closes the session within `close_timeout`, cut short by the read
    /// deadline or by cancellation.
    async fn close_session(&self, ctx: &ReadContext, expires_at: Instant) {
        let remaining = expires_at.saturating_duration_since(Instant::now());
        let timeout = self.config.close_timeout().min(remaining);

        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => None,
            result = tokio::time::timeout(timeout, self.session.close()) => Some(result),
        };

        let record = match outcome {
            Some(Ok(Ok(()))) => LogRecord::debug("Session closed"),
            Some(Ok(Err(e))) => LogRecord::debug(format!("Session close failed: {e}")),
            Some(Err(_)) => {
                LogRecord::debug(format!("Session close timed out after {timeout:?}"))
            }
            None => LogRecord::debug("Session close abandoned: read cancelled"),
        };
        self.log
            .log(record.with_field("endpoint", self.session.endpoint()));
    }
}

impl<S: SessionHandle + ?Sized> fmt::Debug for ReadCoordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadCoordinator")
            .field("endpoint", &self.session.endpoint())
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;
    use crate::types::{DataValue, NodeId};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tagpoll_core::{LogLevel, MemorySink};

    struct FixedSession {
        outcome: fn() -> Result<ReadResponse, SessionError>,
        closes: AtomicUsize,
    }

    impl FixedSession {
        fn new(outcome: fn() -> Result<ReadResponse, SessionError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                closes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SessionHandle for FixedSession {
        async fn read(&self, _request: &ReadRequest) -> Result<ReadResponse, SessionError> {
            (self.outcome)()
        }

        async fn close(&self) -> Result<(), SessionError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn endpoint(&self) -> &str {
            "opc.tcp://fixed:4840"
        }
    }

    fn nodes() -> Vec<NodeDef> {
        vec![
            NodeDef::new(NodeId::numeric(2, 1)),
            NodeDef::new(NodeId::numeric(2, 2)),
        ]
    }

    #[test]
    fn test_context_builder() {
        let token = CancellationToken::new();
        let ctx = ReadContext::new()
            .with_timeout(Duration::from_millis(10))
            .with_cancellation(token.clone());

        assert_eq!(ctx.timeout(), Some(Duration::from_millis(10)));
        assert!(!ctx.cancellation_token().is_cancelled());
        token.cancel();
        assert!(ctx.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_stats_count_emitted_and_suppressed() {
        let session = FixedSession::new(|| {
            Ok(ReadResponse::new(vec![
                DataValue::new(1i32),
                DataValue::new(2i32).with_status(StatusCode::BAD_NOT_READABLE),
            ]))
        });
        let sink = MemorySink::new();
        let reader = ReadCoordinator::new(session, ReaderConfig::default(), Arc::new(sink.clone()));

        let messages = reader.read_tags(&ReadContext::new(), &nodes()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(
            reader.stats(),
            ReaderStats {
                reads: 1,
                failures: 0,
                session_faults: 0,
                suppressed: 1,
                emitted: 1,
            }
        );
        assert_eq!(sink.count_at(LogLevel::Warn), 1);
    }

    #[tokio::test]
    async fn test_fatal_fault_counts_and_closes() {
        let session = FixedSession::new(|| Err(SessionError::status(StatusCode::BAD_CONNECTION_CLOSED)));
        let reader = ReadCoordinator::new(
            Arc::clone(&session),
            ReaderConfig::default(),
            Arc::new(MemorySink::new()),
        );

        let error = reader.read_tags(&ReadContext::new(), &nodes()).await.unwrap_err();
        assert!(error.is_not_connected());
        assert_eq!(session.closes.load(Ordering::SeqCst), 1);

        let stats = reader.stats();
        assert_eq!((stats.reads, stats.failures, stats.session_faults), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_empty_node_list_skips_read() {
        let session = FixedSession::new(|| Err(SessionError::status(StatusCode::BAD_NOTHING_TO_DO)));
        let reader = ReadCoordinator::new(session, ReaderConfig::default(), Arc::new(MemorySink::new()));

        assert!(reader.read_tags(&ReadContext::new(), &[]).await.unwrap().is_empty());
        assert_eq!(reader.stats().reads, 0);
    }

    #[tokio::test]
    async fn test_dyn_session_handle() {
        let session: Arc<dyn SessionHandle> = FixedSession::new(|| Ok(ReadResponse::default()));
        let reader: ReadCoordinator =
            ReadCoordinator::new(session, ReaderConfig::default(), Arc::new(MemorySink::new()));

        let request = ReadRequest::for_nodes(&[]);
        assert!(reader.read(&ReadContext::new(), &request).await.unwrap().is_empty());
        assert!(format!("{reader:?}").contains("opc.tcp://fixed:4840"));
    }
}
