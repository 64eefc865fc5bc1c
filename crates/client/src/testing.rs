//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::{ClientError, Result};
use crate::error_channel::{ErrorChannel, ErrorSurface};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::view::CapacityView;

enum Scripted {
    Response(HttpResponse),
    Network(String),
}

impl Scripted {
    fn to_result(&self) -> Result<HttpResponse> {
        match self {
            Self::Response(response) => Ok(response.clone()),
            Self::Network(message) => Err(ClientError::Network(message.clone())),
        }
    }
}

/// Answers requests from a queue, then from an optional fallback.
/// Records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
    timestamps: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_body(&self, status: u16, body: &str) {
        self.queue.lock().unwrap().push_back(Scripted::Response(HttpResponse {
            status,
            reason: "OK".to_string(),
            body: body.to_string(),
        }));
    }

    pub fn push_json(&self, status: u16, value: Value) {
        self.push_body(status, &value.to_string());
    }

    pub fn push_status(&self, status: u16, reason: &str) {
        self.queue.lock().unwrap().push_back(Scripted::Response(HttpResponse {
            status,
            reason: reason.to_string(),
            body: String::new(),
        }));
    }

    pub fn push_network_error(&self, message: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::Network(message.to_string()));
    }

    pub fn set_fallback_json(&self, value: Value) {
        *self.fallback.lock().unwrap() = Some(Scripted::Response(HttpResponse {
            status: 200,
            reason: "OK".to_string(),
            body: value.to_string(),
        }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// When each request arrived, on the tokio clock.
    pub fn timestamps(&self) -> Vec<Instant> {
        self.timestamps.lock().unwrap().clone()
    }

    pub fn count(&self, method: crate::transport::Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method && request.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request);
        self.timestamps.lock().unwrap().push(Instant::now());
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(scripted) => scripted.to_result(),
            None => match self.fallback.lock().unwrap().as_ref() {
                Some(scripted) => scripted.to_result(),
                None => Err(ClientError::Network("no scripted response".to_string())),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Capacity(i64),
    Pulse,
    Visualisation(String),
}

#[derive(Default)]
pub struct RecordingCapacityView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingCapacityView {
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn pulses(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == ViewEvent::Pulse)
            .count()
    }
}

impl CapacityView for RecordingCapacityView {
    fn show_capacity(&self, capacity: i64) {
        self.events.lock().unwrap().push(ViewEvent::Capacity(capacity));
    }

    fn pulse(&self) {
        self.events.lock().unwrap().push(ViewEvent::Pulse);
    }

    fn show_visualisation(&self, key: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Visualisation(key.to_string()));
    }
}

/// [`ErrorChannel`] that also remembers every message reported to it.
#[derive(Default)]
pub struct RecordingErrorSurface {
    channel: ErrorChannel,
    reports: Mutex<Vec<String>>,
}

impl RecordingErrorSurface {
    pub fn current(&self) -> Option<String> {
        self.channel.current()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

impl ErrorSurface for RecordingErrorSurface {
    fn report(&self, message: &str) {
        self.reports.lock().unwrap().push(message.to_string());
        self.channel.report(message);
    }

    fn clear(&self) {
        self.channel.clear();
    }
}
