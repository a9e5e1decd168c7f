//! Shared fixtures for app integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use keybridge_app::Console;
use keybridge_scanner::{BackendProbe, SyntheticDecodeBackend, SyntheticDecoderFactory};
use keybridge_transport::{ApiTransport, HttpReply, TransportError};

/// Loopback endpoint every test console talks to.
#[allow(dead_code)]
pub const TEST_ENDPOINT: &str = "http://127.0.0.1:5000";

/// Status body the scripted transport falls back to when its queue is empty.
#[allow(dead_code)]
pub const EMPTY_STATUS_OK: &str = r#"{"success":true,"public_keys":[],"secret_keys":[]}"#;

/// One request observed by the scripted transport.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: String,
}

/// Transport double replaying scripted replies and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Creates an empty scripted transport behind an `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues one reply.
    pub fn push_reply(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .expect("reply lock should work")
            .push_back(Ok(HttpReply {
                status,
                body: body.to_string(),
            }));
    }

    /// Queues one connection failure.
    pub fn push_failure(&self, detail: &str) {
        self.replies
            .lock()
            .expect("reply lock should work")
            .push_back(Err(TransportError::Connect(detail.to_string())));
    }

    /// Returns every request seen so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .expect("request lock should work")
            .clone()
    }

    /// Returns the number of requests seen so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request lock should work").len()
    }

    fn record(&self, method: &'static str, url: &str, body: &str) {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(RecordedRequest {
                method,
                url: url.to_string(),
                body: body.to_string(),
            });
    }

    fn next_reply(&self) -> Result<HttpReply, TransportError> {
        self.replies
            .lock()
            .expect("reply lock should work")
            .pop_front()
            .unwrap_or_else(|| {
                Ok(HttpReply {
                    status: 200,
                    body: EMPTY_STATUS_OK.to_string(),
                })
            })
    }
}

impl ApiTransport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        self.record("GET", url, "");
        self.next_reply()
    }

    fn post_form(&self, url: &str, body: &str) -> Result<HttpReply, TransportError> {
        self.record("POST", url, body);
        self.next_reply()
    }
}

/// Builds a console over the scripted transport and scripted decoders.
#[allow(dead_code)]
pub fn console_with(
    transport: Arc<ScriptedTransport>,
    backends: Vec<SyntheticDecodeBackend>,
) -> Console {
    let (console, _probe) = console_with_probe(transport, backends);
    console
}

/// Builds a console and exposes the decoder probe for call counting.
#[allow(dead_code)]
pub fn console_with_probe(
    transport: Arc<ScriptedTransport>,
    backends: Vec<SyntheticDecodeBackend>,
) -> (Console, Arc<Mutex<BackendProbe>>) {
    let factory = Arc::new(SyntheticDecoderFactory::new(backends));
    let probe = factory.probe();
    let console =
        Console::connect(TEST_ENDPOINT, transport, factory).expect("console should build");
    (console, probe)
}
