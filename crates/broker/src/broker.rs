use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::{Mutex, mpsc};

use crate::Subscription;

/// Broker configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Capacity of each subscriber channel.
    pub buffer: usize,

    /// How long `publish` waits for one subscriber to accept a payload
    /// before that subscriber misses it.
    pub publish_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            buffer: 64,
            publish_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Default)]
struct Topics {
    subscribers: HashMap<String, Vec<mpsc::Sender<String>>>,
    closed: bool,
}

/// Topic-based publish/subscribe broker.
///
/// A single lock guards topic registration and delivery, so subscribe,
/// unsubscribe and publish never interleave. Cloning is cheap and every
/// clone shares the same topics.
#[derive(Clone)]
pub struct Broker {
    config: BrokerConfig,
    topics: Arc<Mutex<Topics>>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            topics: Arc::new(Mutex::new(Topics::default())),
        }
    }

    /// Subscribes to a topic.
    ///
    /// On a closed broker the returned subscription is already closed.
    pub async fn subscribe(&self, topic: &str) -> Subscription {
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        let mut topics = self.topics.lock().await;

        if topics.closed {
            tracing::debug!(%topic, "subscribe on closed broker");
        } else {
            topics
                .subscribers
                .entry(topic.to_string())
                .or_default()
                .push(tx);
            tracing::debug!(%topic, "subscribed");
        }
        Subscription::new(topic.to_string(), rx)
    }

    /// Removes every subscriber of a topic.
    ///
    /// Each of their subscriptions ends once its buffer is drained.
    pub async fn unsubscribe(&self, topic: &str) {
        let removed = self.topics.lock().await.subscribers.remove(topic);
        if let Some(senders) = removed {
            tracing::debug!(%topic, subscribers = senders.len(), "unsubscribed");
        }
    }

    /// Delivers a payload to every current subscriber of a topic.
    ///
    /// Returns the number of subscribers that accepted it. Subscribers whose
    /// receiver is gone are pruned; a subscriber that does not accept within
    /// the publish timeout misses this payload.
    #[tracing::instrument(skip(self, payload))]
    pub async fn publish(&self, topic: &str, payload: &str) -> usize {
        let mut topics = self.topics.lock().await;
        let Some(senders) = topics.subscribers.get_mut(topic) else {
            tracing::trace!("no subscribers");
            return 0;
        };

        let mut delivered = 0;
        let mut keep = Vec::with_capacity(senders.len());

        for sender in senders.drain(..) {
            if sender.is_closed() {
                continue;
            }
            match tokio::time::timeout(
                self.config.publish_timeout,
                sender.send(payload.to_string()),
            )
            .await
            {
                Ok(Ok(())) => {
                    delivered += 1;
                    keep.push(sender);
                }
                Ok(Err(_)) => {
                    tracing::debug!("pruning dropped subscriber");
                }
                Err(_) => {
                    tracing::warn!(
                        timeout = ?self.config.publish_timeout,
                        "subscriber too slow, message dropped for it"
                    );
                    metrics::counter!("broker_dropped_total", "topic" => topic.to_string())
                        .increment(1);
                    keep.push(sender);
                }
            }
        }

        if keep.is_empty() {
            topics.subscribers.remove(topic);
        } else {
            *senders = keep;
        }

        metrics::counter!("broker_published_total", "topic" => topic.to_string()).increment(1);
        delivered
    }

    /// Returns the number of live subscribers of a topic.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .await
            .subscribers
            .get(topic)
            .map(|senders| senders.iter().filter(|s| !s.is_closed()).count())
            .unwrap_or(0)
    }

    /// Unsubscribes every topic and rejects later subscriptions.
    pub async fn close(&self) {
        let mut topics = self.topics.lock().await;
        topics.closed = true;
        topics.subscribers.clear();
        tracing::debug!("broker closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fan_out_to_every_subscriber() {
        let broker = Broker::default();
        let mut first = broker.subscribe("detail").await;
        let mut second = broker.subscribe("detail").await;
        let mut other = broker.subscribe("list").await;

        let delivered = broker.publish("detail", "A").await;

        assert_eq!(delivered, 2);
        assert_eq!(first.recv().await.as_deref(), Some("A"));
        assert_eq!(second.recv().await.as_deref(), Some("A"));
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        let broker = Broker::default();
        assert_eq!(broker.publish("nobody", "x").await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_closes_subscriptions() {
        let broker = Broker::default();
        let mut subscription = broker.subscribe("list").await;

        broker.publish("list", "home").await;
        broker.unsubscribe("list").await;

        assert_eq!(subscription.recv().await.as_deref(), Some("home"));
        assert_eq!(subscription.recv().await, None);
        assert_eq!(broker.publish("list", "home").await, 0);
        assert_eq!(broker.subscriber_count("list").await, 0);
    }

    #[tokio::test]
    async fn dropped_subscriber_is_pruned() {
        let broker = Broker::default();
        let kept = broker.subscribe("detail").await;
        let dropped = broker.subscribe("detail").await;
        drop(dropped);

        assert_eq!(broker.publish("detail", "A").await, 1);
        assert_eq!(broker.subscriber_count("detail").await, 1);
        drop(kept);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_subscriber_misses_message() {
        let broker = Broker::new(BrokerConfig {
            buffer: 1,
            publish_timeout: Duration::from_millis(100),
        });
        let mut slow = broker.subscribe("detail").await;
        let mut fast = broker.subscribe("detail").await;

        assert_eq!(broker.publish("detail", "1").await, 2);
        assert_eq!(fast.recv().await.as_deref(), Some("1"));

        // slow still holds "1", so its buffer is full
        assert_eq!(broker.publish("detail", "2").await, 1);
        assert_eq!(fast.recv().await.as_deref(), Some("2"));

        assert_eq!(slow.recv().await.as_deref(), Some("1"));
        assert!(slow.try_recv().is_err());
        assert_eq!(broker.subscriber_count("detail").await, 2);
    }

    #[tokio::test]
    async fn close_ends_everything() {
        let broker = Broker::default();
        let mut before = broker.subscribe("detail").await;

        broker.close().await;

        assert_eq!(before.recv().await, None);
        let mut after = broker.subscribe("detail").await;
        assert_eq!(after.recv().await, None);
        assert_eq!(broker.publish("detail", "A").await, 0);
    }
}
