//! In-memory transport and decoder doubles for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use stl_decoder::{DecodeError, DecodeResult, Decoder};
use stl_protocol::{HttpRequest, HttpResponse};

use crate::error::{TransportError, TransportResult};
use crate::transport::Transport;

/// Replays queued responses and records every request it sees.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<TransportResult<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: HttpResponse) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &HttpRequest) -> TransportResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no response queued".into())))
    }
}

/// Returns a fixed value, or always fails, and counts releases.
pub struct FakeDecoder {
    answer: Option<Value>,
    payloads: Mutex<Vec<Vec<u8>>>,
    releases: Arc<AtomicUsize>,
}

impl FakeDecoder {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer: Some(answer),
            payloads: Mutex::default(),
            releases: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            payloads: Mutex::default(),
            releases: Arc::default(),
        }
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.payloads.lock().unwrap().clone()
    }

    /// Release counter that stays readable after the decoder is boxed away.
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        self.releases.clone()
    }
}

impl Decoder for FakeDecoder {
    fn decode(&self, payload: &[u8]) -> DecodeResult<Value> {
        self.payloads.lock().unwrap().push(payload.to_vec());
        self.answer.clone().ok_or_else(|| DecodeError::ExecutionFailed {
            status: "exit status: 1".into(),
            stderr: "boom".into(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
