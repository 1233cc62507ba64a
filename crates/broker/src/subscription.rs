use tokio::sync::mpsc::{self, error::TryRecvError};

/// A subscription to one topic.
///
/// Dropping it unsubscribes this receiver; the broker prunes it on the next
/// publish.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::Receiver<String>,
}

impl Subscription {
    pub(crate) fn new(topic: String, receiver: mpsc::Receiver<String>) -> Self {
        Self { topic, receiver }
    }

    /// The topic this subscription listens to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next payload.
    ///
    /// Returns `None` once the topic was unsubscribed (or the broker closed)
    /// and every buffered payload has been received.
    pub async fn recv(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Receives a buffered payload without waiting.
    pub fn try_recv(&mut self) -> Result<String, TryRecvError> {
        self.receiver.try_recv()
    }
}
