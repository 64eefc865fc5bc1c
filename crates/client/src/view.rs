//! Display collaborators driven by the clients.

use tokio::sync::watch;

/// Editable text area holding the configuration document.
pub trait ConfigView: Send + Sync {
    /// Replace the displayed text.
    fn show_document(&self, text: String);
    /// The text as currently displayed, including any user edits.
    fn document_text(&self) -> String;
}

/// Occupancy display of the monitor.
pub trait CapacityView: Send + Sync {
    fn show_capacity(&self, capacity: i64);
    /// Start the one-shot highlight that accompanies a capacity change.
    /// The view clears it on its own once it has played.
    fn pulse(&self);
    /// Switch the container's rendering mode.
    fn show_visualisation(&self, key: &str);
}

/// In-memory [`ConfigView`].  Clones share the same text; edits go through
/// [`set_text`](Self::set_text).
#[derive(Debug, Clone)]
pub struct DocumentBuffer {
    text: watch::Sender<String>,
}

impl DocumentBuffer {
    pub fn new() -> Self {
        let (text, _) = watch::channel(String::new());
        Self { text }
    }

    /// Replace the text as a user edit would.
    pub fn set_text(&self, text: impl Into<String>) {
        self.text.send_replace(text.into());
    }
}

impl Default for DocumentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigView for DocumentBuffer {
    fn show_document(&self, text: String) {
        self.text.send_replace(text);
    }

    fn document_text(&self) -> String {
        self.text.borrow().clone()
    }
}
