//! Fire-and-forget channel for user-facing error messages.

use tokio::sync::mpsc;
use tracing::warn;

/// Receives human-readable messages meant for the user
pub trait Notifier: Send + Sync {
    /// Deliver a message. Never fails and never blocks.
    fn notify(&self, message: &str);
}

/// Writes notifications to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        warn!(target: "modeler::notification", "{}", message);
    }
}

/// Forwards notifications to a bounded channel. Messages are dropped when
/// the receiver is gone or the buffer is full.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<String>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving half of its channel
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) {
        if let Err(e) = self.sender.try_send(message.to_string()) {
            warn!(error = %e, "Dropping notification");
        }
    }
}

/// Notifier doubles for tests
#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::Notifier;
    use std::sync::Mutex;

    /// Keeps every message it receives
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        /// Messages received so far, oldest first
        pub fn messages(&self) -> Vec<String> {
            self.messages
                .lock()
                .map(|messages| messages.clone())
                .unwrap_or_default()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, message: &str) {
            if let Ok(mut messages) = self.messages.lock() {
                messages.push(message.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_notifier_delivers() {
        let (notifier, mut receiver) = ChannelNotifier::new(4);
        notifier.notify("Cannot connect node to itself");

        assert_eq!(
            receiver.recv().await.as_deref(),
            Some("Cannot connect node to itself")
        );
    }

    #[tokio::test]
    async fn test_channel_notifier_drops_when_full() {
        let (notifier, mut receiver) = ChannelNotifier::new(1);
        notifier.notify("first");
        notifier.notify("second");

        assert_eq!(receiver.recv().await.as_deref(), Some("first"));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_notifier_survives_closed_receiver() {
        let (notifier, receiver) = ChannelNotifier::new(1);
        drop(receiver);
        notifier.notify("nobody listens");
    }

    #[test]
    fn test_recording_notifier() {
        let notifier = testing::RecordingNotifier::default();
        notifier.notify("a");
        notifier.notify("b");
        assert_eq!(notifier.messages(), vec!["a".to_string(), "b".to_string()]);
    }
}
