//! Per-key batching of notifications.
//!
//! A burst of notifications for the same key collapses into one flush. A key
//! is flushed once it has collected `max_size` notifications or once
//! `max_wait` has passed since its first pending notification, whichever
//! comes first. Flushing is driven by a timer task per active key, so a key
//! that stops receiving traffic is still flushed.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use futures_util::future::BoxFuture;
use tokio::{
    sync::Notify,
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Batching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    /// Flush as soon as this many notifications are pending.
    pub max_size: usize,

    /// Flush at the latest this long after the first pending notification.
    pub max_wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: 5,
            max_wait: Duration::from_millis(5000),
        }
    }
}

/// Notifications collected for one key since its last flush.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry<N> {
    pub count: usize,
    pub first_seen: Instant,
    pub last_seen: Instant,
    /// The most recent notification; earlier ones are superseded.
    pub latest: N,
}

impl<N> BatchEntry<N> {
    fn new(notification: N, now: Instant) -> Self {
        Self {
            count: 1,
            first_seen: now,
            last_seen: now,
            latest: notification,
        }
    }

    fn merge(&mut self, notification: N, now: Instant) {
        self.count += 1;
        self.last_seen = now;
        self.latest = notification;
    }
}

/// Callback invoked with each flushed entry.
pub type FlushFn<K, N> = Arc<dyn Fn(K, BatchEntry<N>) -> BoxFuture<'static, ()> + Send + Sync>;

struct KeyState<N> {
    pending: Option<BatchEntry<N>>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

struct Keys<K, N> {
    states: HashMap<K, KeyState<N>>,
    closed: bool,
}

struct Shared<K, N> {
    config: BatchConfig,
    on_flush: FlushFn<K, N>,
    keys: Mutex<Keys<K, N>>,
}

impl<K, N> Shared<K, N> {
    fn keys(&self) -> MutexGuard<'_, Keys<K, N>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coalesces notifications per key and flushes them through one callback.
///
/// At most one callback runs per key at a time. Notifications that arrive
/// while a key's callback is running are collected for the next flush.
pub struct Batcher<K, N> {
    shared: Arc<Shared<K, N>>,
}

impl<K, N> Clone for Batcher<K, N> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K, N> Batcher<K, N>
where
    K: Eq + Hash + Clone + Send + Sync + std::fmt::Display + 'static,
    N: Send + 'static,
{
    /// Creates a batcher. Must be called inside a tokio runtime.
    pub fn new<F>(config: BatchConfig, on_flush: F) -> Self
    where
        F: Fn(K, BatchEntry<N>) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                config,
                on_flush: Arc::new(on_flush),
                keys: Mutex::new(Keys {
                    states: HashMap::new(),
                    closed: false,
                }),
            }),
        }
    }

    pub fn config(&self) -> BatchConfig {
        self.shared.config
    }

    /// Records a notification for a key.
    ///
    /// Ignored once the batcher is closed.
    pub fn add(&self, key: K, notification: N) {
        let now = Instant::now();
        let max_size = self.shared.config.max_size;
        let mut keys = self.shared.keys();
        if keys.closed {
            tracing::debug!(%key, "batcher closed, notification ignored");
            return;
        }

        if let Some(state) = keys.states.get_mut(&key) {
            if let Some(entry) = state.pending.as_mut() {
                entry.merge(notification, now);
            } else {
                state.pending = Some(BatchEntry::new(notification, now));
            }
            if state
                .pending
                .as_ref()
                .is_some_and(|entry| entry.count >= max_size)
            {
                state.wake.notify_one();
            }
            return;
        }

        let wake = Arc::new(Notify::new());
        let task = tokio::spawn(run_key(
            Arc::clone(&self.shared),
            key.clone(),
            Arc::clone(&wake),
        ));
        keys.states.insert(
            key,
            KeyState {
                pending: Some(BatchEntry::new(notification, now)),
                wake,
                task,
            },
        );
    }

    /// Number of keys with a pending entry or a running flush.
    pub fn active_keys(&self) -> usize {
        self.shared.keys().states.len()
    }

    /// Stops every timer task and drops pending entries.
    pub fn close(&self) {
        let mut keys = self.shared.keys();
        keys.closed = true;
        let dropped = keys.states.len();
        for (_, state) in keys.states.drain() {
            state.task.abort();
        }
        tracing::debug!(dropped, "batcher closed");
    }
}

enum Next {
    Wait(Instant),
    Flush,
    Idle,
}

fn next_step<K, N>(shared: &Shared<K, N>, key: &K) -> Next
where
    K: Eq + Hash,
{
    let mut keys = shared.keys();
    let entry = keys
        .states
        .get(key)
        .and_then(|state| state.pending.as_ref())
        .map(|entry| (entry.count, entry.first_seen));

    match entry {
        Some((count, first_seen)) => {
            let deadline = first_seen + shared.config.max_wait;
            if count >= shared.config.max_size || Instant::now() >= deadline {
                Next::Flush
            } else {
                Next::Wait(deadline)
            }
        }
        None => {
            keys.states.remove(key);
            Next::Idle
        }
    }
}

async fn run_key<K, N>(shared: Arc<Shared<K, N>>, key: K, wake: Arc<Notify>)
where
    K: Eq + Hash + Clone + std::fmt::Display,
{
    loop {
        match next_step(&shared, &key) {
            Next::Idle => return,
            Next::Wait(deadline) => {
                tokio::select! {
                    _ = wake.notified() => {}
                    _ = sleep_until(deadline) => {}
                }
            }
            Next::Flush => {
                let entry = shared
                    .keys()
                    .states
                    .get_mut(&key)
                    .and_then(|state| state.pending.take());

                if let Some(entry) = entry {
                    tracing::debug!(%key, count = entry.count, "flushing batch");
                    metrics::counter!("batcher_flushes_total").increment(1);
                    metrics::histogram!("batcher_batch_size").record(entry.count as f64);
                    (shared.on_flush)(key.clone(), entry).await;
                }
            }
        }
    }
}
