use tokio::sync::watch;

/// Sink for the single visible error message of an interactive view.
pub trait ErrorSurface: Send + Sync {
    /// Show `message`, replacing whatever was shown before.
    fn report(&self, message: &str);
    /// Hide the current message, if any.
    fn clear(&self);
}

/// Shared handle over the current error state.
///
/// Clones observe and mutate the same state.  Front-ends that want to redraw
/// a banner on every change can [`subscribe`](Self::subscribe).
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    state: watch::Sender<Option<String>>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self { state }
    }

    pub fn current(&self) -> Option<String> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.state.subscribe()
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorSurface for ErrorChannel {
    fn report(&self, message: &str) {
        self.state.send_replace(Some(message.to_string()));
    }

    fn clear(&self) {
        self.state.send_if_modified(|current| current.take().is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_report_wins() {
        let channel = ErrorChannel::new();
        assert_eq!(channel.current(), None);

        channel.report("first");
        channel.report("second");
        assert_eq!(channel.current().as_deref(), Some("second"));

        channel.clear();
        assert_eq!(channel.current(), None);
    }

    #[test]
    fn clones_share_state() {
        let channel = ErrorChannel::new();
        let handle = channel.clone();
        handle.report("boom");
        assert_eq!(channel.current().as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn subscribers_see_changes_but_not_redundant_clears() {
        let channel = ErrorChannel::new();
        let mut rx = channel.subscribe();

        channel.clear();
        assert!(!rx.has_changed().unwrap());

        channel.report("offline");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("offline"));

        channel.clear();
        assert!(rx.has_changed().unwrap());
    }
}
