//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use plcdash_core::SyncError;
use plcdash_protocol::HttpRequest;

use crate::transport::Transport;

type Responder =
    dyn Fn(usize, &HttpRequest) -> (Duration, Result<serde_json::Value, SyncError>) + Send + Sync;

/// Transport that answers from a closure and records every request.
///
/// The closure gets the call number (from 0) and the request, and returns
/// how long to wait before answering plus the answer.
pub struct FakeTransport {
    responder: Box<Responder>,
    calls: AtomicUsize,
    log: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(usize, &HttpRequest) -> (Duration, Result<serde_json::Value, SyncError>)
            + Send
            + Sync
            + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Answer every request immediately with `reply`.
    pub fn always(reply: serde_json::Value) -> Arc<Self> {
        Self::new(move |_, _| (Duration::ZERO, Ok(reply.clone())))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> Result<serde_json::Value, SyncError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(request.clone());
        let (delay, reply) = (self.responder)(n, request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}
