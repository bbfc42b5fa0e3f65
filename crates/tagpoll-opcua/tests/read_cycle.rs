// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Read cycle integration tests.
//!
//! A scripted [`MockSession`] stands in for a live OPC UA session so every
//! failure path can be driven deterministically.
//!
//! ```bash
//! cargo test -p tagpoll-opcua --test read_cycle
//! ```

#![allow(clippy::approx_constant)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tagpoll_core::{ConnectorError, LogLevel, MemorySink, TagType};
use tagpoll_opcua::{
    DataValue, ExtensionObject, ExtensionObjectEncoding, NodeDef, NodeId, NodeIdentifier,
    ReadContext, ReadCoordinator, ReadError, ReadRequest, ReadResponse, ReaderConfig,
    SessionError, SessionHandle, StatusCode, Structure, TimestampsToReturn, Variant,
    SESSION_FATAL_STATUS_CODES,
};
use tokio_util::sync::CancellationToken;

// =============================================================================
// Mock Session
// =============================================================================

/// Scripted session handle.
///
/// Scripted outcomes are consumed in order. With an empty script, each node
/// in the request is answered with its numeric identifier as a `UInt32`.
#[derive(Default)]
struct MockSession {
    script: Mutex<VecDeque<Result<ReadResponse, SessionError>>>,
    requests: Mutex<Vec<ReadRequest>>,
    read_delay: Option<Duration>,
    close_delay: Option<Duration>,
    close_fails: bool,
    reads: AtomicUsize,
    closes: AtomicUsize,
}

impl MockSession {
    fn new() -> Self {
        Self::default()
    }

    fn then(self, outcome: Result<ReadResponse, SessionError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    fn then_fail(self, status: StatusCode) -> Self {
        self.then(Err(SessionError::status(status)))
    }

    fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    fn with_close_delay(mut self, delay: Duration) -> Self {
        self.close_delay = Some(delay);
        self
    }

    fn with_failing_close(mut self) -> Self {
        self.close_fails = true;
        self
    }

    fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> Option<ReadRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    fn echo(request: &ReadRequest) -> ReadResponse {
        let results = request
            .nodes_to_read
            .iter()
            .map(|read| match read.node_id.identifier {
                NodeIdentifier::Numeric(id) => DataValue::new(id),
                _ => DataValue::new(read.node_id.to_string()),
            })
            .collect();
        ReadResponse::new(results)
    }
}

#[async_trait]
impl SessionHandle for MockSession {
    async fn read(&self, request: &ReadRequest) -> Result<ReadResponse, SessionError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::echo(request)))
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.closes.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }

        if self.close_fails {
            Err(SessionError::from(io::Error::new(
                io::ErrorKind::NotConnected,
                "socket already gone",
            )))
        } else {
            Ok(())
        }
    }

    fn endpoint(&self) -> &str {
        "opc.tcp://mock:4840"
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn reader(session: &Arc<MockSession>) -> (ReadCoordinator<MockSession>, MemorySink) {
    reader_with(session, ReaderConfig::default())
}

fn reader_with(
    session: &Arc<MockSession>,
    config: ReaderConfig,
) -> (ReadCoordinator<MockSession>, MemorySink) {
    let sink = MemorySink::new();
    let reader = ReadCoordinator::new(Arc::clone(session), config, Arc::new(sink.clone()));
    (reader, sink)
}

fn numeric_nodes(ids: &[u32]) -> Vec<NodeDef> {
    ids.iter()
        .map(|id| NodeDef::new(NodeId::numeric(2, *id)).with_browse_name(format!("Tag{id}")))
        .collect()
}

fn request(ids: &[u32]) -> ReadRequest {
    ReadRequest::for_nodes(&numeric_nodes(ids))
}

fn deadband(value: f64) -> ExtensionObject {
    ExtensionObject::decoded(
        NodeId::numeric(0, 720),
        Structure::new().with_field("DeadbandValue", value),
    )
}

fn opaque() -> ExtensionObject {
    ExtensionObject::opaque(NodeId::string(4, "MyUdt"), ExtensionObjectEncoding::Binary)
}

// =============================================================================
// Read: success
// =============================================================================

#[tokio::test]
async fn test_success_preserves_order_and_length() {
    let session = MockSession::new().shared();
    let (reader, sink) = reader(&session);

    let ids = [42, 7, 1001, 3, 7];
    let response = reader.read(&ReadContext::new(), &request(&ids)).await.unwrap();

    let values: Vec<Variant> = response
        .results
        .iter()
        .map(|r| r.value.clone().unwrap())
        .collect();
    let expected: Vec<Variant> = ids.iter().map(|id| Variant::UInt32(*id)).collect();
    assert_eq!(values, expected);
    assert_eq!(session.closes(), 0);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_success_returns_response_unchanged() {
    let scripted = ReadResponse::new(vec![
        DataValue::new(1.5f64),
        DataValue::empty(),
        DataValue::new(true).with_status(StatusCode::BAD_NOT_READABLE),
    ]);
    let session = MockSession::new().then(Ok(scripted.clone())).shared();
    let (reader, _) = reader(&session);

    let response = reader.read(&ReadContext::new(), &request(&[1, 2, 3])).await.unwrap();
    assert_eq!(response, scripted);
}

#[tokio::test]
async fn test_request_is_forwarded_as_built() {
    let session = MockSession::new().shared();
    let config = ReaderConfig::builder()
        .max_age_ms(500.0)
        .timestamps_to_return(TimestampsToReturn::Source)
        .build()
        .unwrap();
    let (reader, _) = reader_with(&session, config);

    reader
        .read_tags(&ReadContext::new(), &numeric_nodes(&[5, 6]))
        .await
        .unwrap();

    let sent = session.last_request().unwrap();
    assert_eq!(sent.max_age_ms, 500.0);
    assert_eq!(sent.timestamps_to_return, TimestampsToReturn::Source);
    assert_eq!(sent.len(), 2);
    assert_eq!(session.reads(), 1);
}

// =============================================================================
// Read: session-fatal faults
// =============================================================================

#[tokio::test]
async fn test_every_fatal_status_closes_once_and_signals_not_connected() {
    for status in SESSION_FATAL_STATUS_CODES {
        let session = MockSession::new().then_fail(status).shared();
        let (reader, sink) = reader(&session);

        let error = reader
            .read(&ReadContext::new(), &request(&[1]))
            .await
            .unwrap_err();

        assert!(matches!(error, ReadError::NotConnected), "{status}: {error:?}");
        assert!(error.session_error().is_none(), "{status}");
        assert_eq!(session.closes(), 1, "{status}");
        assert!(sink.contains(LogLevel::Error, "Read failed"), "{status}");
        assert!(sink.contains(LogLevel::Warn, "closing"), "{status}");
    }
}

#[tokio::test]
async fn test_fatal_status_with_info_bits_and_message() {
    let status = StatusCode::new(StatusCode::BAD_SESSION_ID_INVALID.bits() | 0x0000_0400);
    let session = MockSession::new()
        .then(Err(SessionError::status_with_message(status, "session expired")))
        .shared();
    let (reader, _) = reader(&session);

    let error = reader.read(&ReadContext::new(), &request(&[1])).await.unwrap_err();
    assert!(error.is_not_connected());
    assert_eq!(session.closes(), 1);
}

#[tokio::test]
async fn test_not_connected_maps_to_canonical_pipeline_error() {
    let session = MockSession::new().then_fail(StatusCode::BAD_TIMEOUT).shared();
    let (reader, _) = reader(&session);

    let error: ConnectorError = reader
        .read(&ReadContext::new(), &request(&[1]))
        .await
        .unwrap_err()
        .into();
    assert!(error.is_not_connected());
    assert_eq!(error.to_string(), "not connected");
}

#[tokio::test]
async fn test_close_failure_is_not_propagated() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_CONNECTION_CLOSED)
        .with_failing_close()
        .shared();
    let (reader, sink) = reader(&session);

    let error = reader.read(&ReadContext::new(), &request(&[1])).await.unwrap_err();
    assert!(error.is_not_connected());
    assert_eq!(session.closes(), 1);
    assert!(sink.contains(LogLevel::Debug, "Session close failed"));
}

#[tokio::test(start_paused = true)]
async fn test_hung_close_is_bounded() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_COMMUNICATION_ERROR)
        .with_close_delay(Duration::from_secs(3600))
        .shared();
    let config = ReaderConfig::builder()
        .close_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let (reader, sink) = reader_with(&session, config);

    let started = tokio::time::Instant::now();
    let error = reader.read(&ReadContext::new(), &request(&[1])).await.unwrap_err();

    assert!(error.is_not_connected());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.closes(), 1);
    assert!(sink.contains(LogLevel::Debug, "timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_a_hung_teardown_close() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_COMMUNICATION_ERROR)
        .with_close_delay(Duration::from_secs(3600))
        .shared();
    let (reader, sink) = reader(&session);

    let token = CancellationToken::new();
    let ctx = ReadContext::new()
        .with_cancellation(token.clone())
        .with_timeout(Duration::from_millis(100));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });

    let started = tokio::time::Instant::now();
    let error = reader.read(&ctx, &request(&[1])).await.unwrap_err();
    canceller.await.unwrap();

    assert!(error.is_not_connected());
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(session.closes(), 1);
    assert!(sink.contains(LogLevel::Debug, "Session close abandoned"));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_close_respects_remaining_read_deadline() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_SESSION_ID_INVALID)
        .with_close_delay(Duration::from_secs(3600))
        .shared();
    let (reader, sink) = reader(&session);
    assert_eq!(reader.config().close_timeout(), Duration::from_secs(2));

    let ctx = ReadContext::new().with_timeout(Duration::from_millis(100));
    let started = tokio::time::Instant::now();
    let error = reader.read(&ctx, &request(&[1])).await.unwrap_err();

    assert!(error.is_not_connected());
    assert!(started.elapsed() <= Duration::from_millis(150));
    assert_eq!(session.closes(), 1);
    assert!(sink.contains(LogLevel::Debug, "timed out"));
}

#[tokio::test]
async fn test_reads_after_teardown_are_classified_independently() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_SERVER_NOT_CONNECTED)
        .then_fail(StatusCode::BAD_SERVER_NOT_CONNECTED)
        .shared();
    let (reader, _) = reader(&session);
    let ctx = ReadContext::new();

    assert!(reader.read(&ctx, &request(&[1])).await.unwrap_err().is_not_connected());
    assert!(reader.read(&ctx, &request(&[1])).await.unwrap_err().is_not_connected());
    assert_eq!(session.closes(), 2);
    assert_eq!(reader.stats().session_faults, 2);
}

// =============================================================================
// Read: pass-through failures
// =============================================================================

#[tokio::test]
async fn test_other_status_is_returned_unchanged_without_close() {
    for status in [
        StatusCode::BAD_NODE_ID_UNKNOWN,
        StatusCode::BAD_TOO_MANY_OPERATIONS,
        StatusCode::BAD_SESSION_CLOSED,
        StatusCode::BAD_REQUEST_TIMEOUT,
        StatusCode::BAD_SECURE_CHANNEL_CLOSED,
    ] {
        let session = MockSession::new()
            .then(Err(SessionError::status_with_message(status, "detail")))
            .shared();
        let (reader, sink) = reader(&session);

        let error = reader.read(&ReadContext::new(), &request(&[1])).await.unwrap_err();

        match &error {
            ReadError::Session(SessionError::Status {
                status: got,
                message,
            }) => {
                assert_eq!(*got, status);
                assert_eq!(message.as_deref(), Some("detail"));
            }
            other => panic!("{status}: unexpected {other:?}"),
        }
        assert_eq!(
            error.to_string(),
            SessionError::status_with_message(status, "detail").to_string()
        );
        assert_eq!(session.closes(), 0, "{status}");
        assert!(sink.contains(LogLevel::Error, "Read failed"));
    }
}

#[tokio::test]
async fn test_errors_without_status_pass_through() {
    let session = MockSession::new()
        .then(Err(SessionError::from(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset by peer",
        ))))
        .then(Err(SessionError::protocol("chunk too large")))
        .shared();
    let (reader, _) = reader(&session);
    let ctx = ReadContext::new();

    let io_error = reader.read(&ctx, &request(&[1])).await.unwrap_err();
    assert!(matches!(io_error, ReadError::Session(SessionError::Io(_))));
    assert_eq!(io_error.to_string(), "I/O error: reset by peer");

    let protocol_error = reader.read(&ctx, &request(&[1])).await.unwrap_err();
    assert!(matches!(protocol_error, ReadError::Session(SessionError::Protocol(_))));

    assert_eq!(session.closes(), 0);
    assert_eq!(reader.stats().failures, 2);
    assert_eq!(reader.stats().session_faults, 0);
}

// =============================================================================
// Cancellation and deadlines
// =============================================================================

#[tokio::test]
async fn test_pre_cancelled_context() {
    let session = MockSession::new().shared();
    let (reader, _) = reader(&session);

    let ctx = ReadContext::new();
    ctx.cancel();

    let error = reader.read(&ctx, &request(&[1])).await.unwrap_err();
    assert!(matches!(error, ReadError::Cancelled));
    assert_eq!(session.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_aborts_a_pending_read() {
    let session = MockSession::new()
        .with_read_delay(Duration::from_secs(3600))
        .shared();
    let (reader, _) = reader(&session);

    let token = CancellationToken::new();
    let ctx = ReadContext::new()
        .with_cancellation(token.clone())
        .with_timeout(Duration::from_secs(7200));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let started = tokio::time::Instant::now();
    let error = reader.read(&ctx, &request(&[1])).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(error, ReadError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(session.reads(), 1);
    assert_eq!(session.closes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_context_deadline() {
    let session = MockSession::new()
        .with_read_delay(Duration::from_secs(60))
        .shared();
    let (reader, sink) = reader(&session);

    let ctx = ReadContext::new().with_timeout(Duration::from_millis(100));
    let error = reader.read(&ctx, &request(&[1])).await.unwrap_err();

    assert!(matches!(error, ReadError::DeadlineExceeded(d) if d == Duration::from_millis(100)));
    assert_eq!(session.closes(), 0);
    assert!(sink.contains(LogLevel::Warn, "deadline"));

    let mapped: ConnectorError = error.into();
    assert!(matches!(mapped, ConnectorError::Timeout { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_configured_read_timeout_applies_without_context_deadline() {
    let session = MockSession::new()
        .with_read_delay(Duration::from_secs(60))
        .shared();
    let config = ReaderConfig::builder()
        .read_timeout(Duration::from_millis(250))
        .build()
        .unwrap();
    let (reader, _) = reader_with(&session, config);

    let error = reader.read(&ReadContext::new(), &request(&[1])).await.unwrap_err();
    assert!(matches!(error, ReadError::DeadlineExceeded(d) if d == Duration::from_millis(250)));
}

// =============================================================================
// Full read cycle
// =============================================================================

#[tokio::test]
async fn test_read_tags_decodes_in_order_and_drops_suppressed() {
    let scripted = ReadResponse::new(vec![
        DataValue::new(42i32),
        DataValue::new(3.14f64),
        DataValue::new("hello"),
        DataValue::new(true),
        DataValue::new(opaque()),
        DataValue::new(vec![deadband(0.5), opaque(), deadband(1.5)]),
        DataValue::new(7u8).with_status(StatusCode::BAD_NODE_ID_UNKNOWN),
        DataValue::empty(),
        DataValue::new(vec![opaque(), opaque()]),
    ]);
    let session = MockSession::new().then(Ok(scripted)).shared();
    let (reader, sink) = reader(&session);
    let nodes = numeric_nodes(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);

    let messages = reader.read_tags(&ReadContext::new(), &nodes).await.unwrap();

    let summary: Vec<(&str, &str, TagType)> = messages
        .iter()
        .map(|m| (m.node_id.as_str(), m.payload_str().unwrap(), m.tag_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ns=2;i=1", "42", TagType::Number),
            ("ns=2;i=2", "3.14", TagType::Number),
            ("ns=2;i=3", "hello", TagType::String),
            ("ns=2;i=4", "true", TagType::Bool),
            (
                "ns=2;i=6",
                r#"[{"DeadbandValue":0.5},{"DeadbandValue":1.5}]"#,
                TagType::String
            ),
        ]
    );
    assert_eq!(messages[0].browse_name, "Tag1");

    let stats = reader.stats();
    assert_eq!(stats.emitted, 5);
    assert_eq!(stats.suppressed, 4);
    assert_eq!(stats.failures, 0);

    assert_eq!(sink.count_at(LogLevel::Error), 1);
    assert_eq!(sink.count_at(LogLevel::Warn), 3);
    assert!(sink.contains(LogLevel::Warn, "ns=4;s=MyUdt"));
    assert!(sink.contains(LogLevel::Warn, "array of 2 ExtensionObjects"));
    assert_eq!(session.closes(), 0);
}

#[tokio::test]
async fn test_read_tags_result_count_mismatch() {
    let session = MockSession::new()
        .then(Ok(ReadResponse::new(vec![DataValue::new(1i32)])))
        .shared();
    let (reader, sink) = reader(&session);

    let error = reader
        .read_tags(&ReadContext::new(), &numeric_nodes(&[1, 2]))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ReadError::ResultCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert_eq!(session.closes(), 0);
    assert!(sink.contains(LogLevel::Error, "1 results for 2 nodes"));
}

#[tokio::test]
async fn test_read_tags_propagates_not_connected() {
    let session = MockSession::new()
        .then_fail(StatusCode::BAD_CONNECTION_REJECTED)
        .shared();
    let (reader, _) = reader(&session);

    let error = reader
        .read_tags(&ReadContext::new(), &numeric_nodes(&[1]))
        .await
        .unwrap_err();
    assert!(error.is_not_connected());
    assert_eq!(session.closes(), 1);
}

#[tokio::test]
async fn test_poll_reads_configured_nodes() {
    let session = MockSession::new().shared();
    let config = ReaderConfig::builder()
        .node(NodeDef::new(NodeId::numeric(2, 11)).with_browse_name("Speed"))
        .node(NodeId::numeric(2, 12))
        .build()
        .unwrap();
    let (reader, _) = reader_with(&session, config);

    let messages = reader.poll(&ReadContext::new()).await.unwrap();
    let payloads: Vec<&str> = messages.iter().filter_map(|m| m.payload_str()).collect();
    assert_eq!(payloads, vec!["11", "12"]);
    assert_eq!(messages[0].browse_name, "Speed");
}

#[tokio::test]
async fn test_concurrent_reads_on_separate_sessions() {
    let healthy = MockSession::new().shared();
    let dead = MockSession::new()
        .then_fail(StatusCode::BAD_SESSION_ID_INVALID)
        .shared();
    let (healthy_reader, _) = reader(&healthy);
    let (dead_reader, _) = reader(&dead);
    let ctx = ReadContext::new();
    let nodes = numeric_nodes(&[1, 2, 3]);

    let (ok, failed) = tokio::join!(
        healthy_reader.read_tags(&ctx, &nodes),
        dead_reader.read_tags(&ctx, &nodes)
    );

    assert_eq!(ok.unwrap().len(), 3);
    assert!(failed.unwrap_err().is_not_connected());
    assert_eq!(healthy.closes(), 0);
    assert_eq!(dead.closes(), 1);
}
