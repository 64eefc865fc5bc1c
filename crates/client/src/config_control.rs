//! Configuration editor and counter command dispatch.
//!
//! Every operation clears the error surface first and reports at most one
//! failure.  Mutations are followed by a fresh `GET /current_config`, so the
//! displayed document is always what the device holds after the round trip.
//!
//! There is no in-flight guard: overlapping calls race and the last response
//! to arrive decides what the view shows.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::envelope::{Command, CommandRequest};
use crate::error::Result;
use crate::error_channel::ErrorSurface;
use crate::transport::{HttpRequest, Transport, exchange, fetch_raw};
use crate::view::ConfigView;

pub const CONFIG_PATH: &str = "/current_config";
pub const COMMAND_PATH: &str = "/cmd";

pub struct ConfigControlClient<T: Transport> {
    transport: Arc<T>,
    view: Arc<dyn ConfigView>,
    errors: Arc<dyn ErrorSurface>,
}

impl<T: Transport> Clone for ConfigControlClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            view: Arc::clone(&self.view),
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<T: Transport> ConfigControlClient<T> {
    pub fn new(transport: Arc<T>, view: Arc<dyn ConfigView>, errors: Arc<dyn ErrorSurface>) -> Self {
        Self {
            transport,
            view,
            errors,
        }
    }

    /// Fetch the current document and display it pretty-printed.
    /// On failure the previous text stays in place.
    pub async fn load_config(&self) -> bool {
        self.errors.clear();
        match self.fetch_document().await {
            Ok(text) => {
                debug!(bytes = text.len(), "configuration loaded");
                self.view.show_document(text);
                true
            }
            Err(err) => {
                self.fail("load configuration", &err);
                false
            }
        }
    }

    /// Submit the displayed text exactly as it stands, then reload.
    /// The device is the only judge of whether the text is valid.
    pub async fn save_config(&self) -> bool {
        self.errors.clear();
        let body = self.view.document_text();
        let request = HttpRequest::post(CONFIG_PATH, body);
        self.mutate_then_reload("save configuration", request).await
    }

    /// Send `{"cmd": <command>, "data": null}` and reload on success.
    pub async fn dispatch_command(&self, command: Command) -> bool {
        self.dispatch_command_with(command, Value::Null).await
    }

    /// Like [`dispatch_command`](Self::dispatch_command) with an explicit
    /// `data` payload.
    pub async fn dispatch_command_with(&self, command: Command, data: Value) -> bool {
        self.errors.clear();
        let body = match serde_json::to_string(&CommandRequest::with_data(command, data)) {
            Ok(body) => body,
            Err(err) => {
                self.fail("encode command", &err.into());
                return false;
            }
        };
        info!(%command, "dispatching command");
        let request = HttpRequest::post(COMMAND_PATH, body);
        self.mutate_then_reload("dispatch command", request).await
    }

    async fn mutate_then_reload(&self, operation: &str, request: HttpRequest) -> bool {
        match exchange(self.transport.as_ref(), request).await {
            Ok(_) => self.load_config().await,
            Err(err) => {
                self.fail(operation, &err);
                false
            }
        }
    }

    async fn fetch_document(&self) -> Result<String> {
        let document = fetch_raw(self.transport.as_ref(), HttpRequest::get(CONFIG_PATH)).await?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn fail(&self, operation: &str, err: &crate::ClientError) {
        warn!(kind = ?err.kind(), "failed to {operation}: {err}");
        self.errors.report(&err.to_string());
    }
}
