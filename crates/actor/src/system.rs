use std::{collections::HashMap, sync::Arc, time::Duration};

use broker::{Broker, BrokerConfig};
use tokio::{
    sync::{RwLock, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::Instrument;

use crate::{Actor, ActorError, Address, Context, Message, Result};

/// Actor system configuration.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    /// Capacity of each actor's mailbox.
    pub mailbox_capacity: usize,

    /// How long shutdown waits for an actor's task before aborting it.
    pub shutdown_timeout: Duration,

    pub broker: BrokerConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1024,
            shutdown_timeout: Duration::from_secs(5),
            broker: BrokerConfig::default(),
        }
    }
}

enum Envelope<M, R> {
    Message(Message<M, R>),
    Snapshot(oneshot::Sender<serde_json::Value>),
}

struct ActorHandle<M, R> {
    mailbox: mpsc::Sender<Envelope<M, R>>,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl<M, R> ActorHandle<M, R> {
    async fn stop(self, address: &Address, timeout: Duration) {
        let _ = self.cancel.send(());
        drop(self.mailbox);

        let abort = self.task.abort_handle();
        match tokio::time::timeout(timeout, self.task).await {
            Ok(Ok(())) => tracing::debug!(actor = %address, "actor stopped"),
            Ok(Err(e)) => tracing::error!(actor = %address, error = %e, "actor task failed"),
            Err(_) => {
                tracing::warn!(actor = %address, ?timeout, "actor did not stop in time, aborting");
                abort.abort();
            }
        }
    }
}

struct Registry<M, R> {
    actors: HashMap<Address, ActorHandle<M, R>>,
    /// Registration order, for reverse-order teardown.
    order: Vec<Address>,
}

struct Inner<M, R> {
    config: SystemConfig,
    broker: Broker,
    registry: RwLock<Registry<M, R>>,
}

/// Runtime root: the registry of addressed actors and the broker they share.
///
/// Cloning is cheap; every clone refers to the same system. Actors keep
/// running until [`shutdown`](Self::shutdown) or
/// [`shutdown_all`](Self::shutdown_all) is called.
pub struct ActorSystem<M, R> {
    inner: Arc<Inner<M, R>>,
}

impl<M, R> Clone for ActorSystem<M, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M, R> Default for ActorSystem<M, R>
where
    M: Send + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}

impl<M, R> ActorSystem<M, R>
where
    M: Send + 'static,
    R: Send + 'static,
{
    pub fn new(config: SystemConfig) -> Self {
        let broker = Broker::new(config.broker.clone());
        Self {
            inner: Arc::new(Inner {
                config,
                broker,
                registry: RwLock::new(Registry {
                    actors: HashMap::new(),
                    order: Vec::new(),
                }),
            }),
        }
    }

    /// The broker shared by every actor of this system.
    pub fn broker(&self) -> &Broker {
        &self.inner.broker
    }

    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    /// Registers an actor and starts its task.
    pub async fn register<A>(&self, address: Address, actor: A) -> Result<()>
    where
        A: Actor<M, R>,
    {
        let mut registry = self.inner.registry.write().await;
        if registry.actors.contains_key(&address) {
            return Err(ActorError::DuplicateAddress(address));
        }

        let (mailbox, inbox) = mpsc::channel(self.inner.config.mailbox_capacity.max(1));
        let (cancel, cancelled) = oneshot::channel();
        let ctx = Context::new(address.clone(), self.clone());
        let span = tracing::info_span!("actor", actor = %address);
        let task = tokio::spawn(run_actor(actor, ctx, inbox, cancelled).instrument(span));

        registry.actors.insert(
            address.clone(),
            ActorHandle {
                mailbox,
                cancel,
                task,
            },
        );
        registry.order.push(address.clone());
        tracing::info!(actor = %address, "actor registered");
        Ok(())
    }

    /// Returns true if an actor is registered at the address.
    pub async fn is_registered(&self, address: &Address) -> bool {
        self.inner.registry.read().await.actors.contains_key(address)
    }

    async fn mailbox(&self, address: &Address) -> Result<mpsc::Sender<Envelope<M, R>>> {
        self.inner
            .registry
            .read()
            .await
            .actors
            .get(address)
            .map(|handle| handle.mailbox.clone())
            .ok_or_else(|| ActorError::UnknownAddress(address.clone()))
    }

    async fn deliver(&self, address: &Address, envelope: Envelope<M, R>) -> Result<()> {
        let mailbox = self.mailbox(address).await?;
        mailbox
            .send(envelope)
            .await
            .map_err(|_| ActorError::MailboxClosed(address.clone()))
    }

    /// Delivers a message without waiting for it to be handled.
    pub async fn send(&self, message: Message<M, R>) -> Result<()> {
        let to = message.to.clone();
        self.deliver(&to, Envelope::Message(message)).await
    }

    /// Shorthand for [`send`](Self::send) with a freshly built message.
    pub async fn tell(&self, from: &Address, to: &Address, body: M) -> Result<()> {
        self.send(Message::new(from.clone(), to.clone(), body)).await
    }

    /// Sends a request and waits for its reply.
    ///
    /// Fails with [`ActorError::Timeout`] when no reply arrives in time and
    /// with [`ActorError::NoReply`] when the target drops the request.
    pub async fn send_with_reply(
        &self,
        from: &Address,
        to: &Address,
        body: M,
        timeout: Duration,
    ) -> Result<R> {
        let (reply, replied) = oneshot::channel();
        let message = Message::with_reply(from.clone(), to.clone(), body, reply);

        let request = async {
            self.send(message).await?;
            replied
                .await
                .map_err(|_| ActorError::NoReply(to.clone()))
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(%from, %to, ?timeout, "request timed out");
                Err(ActorError::Timeout {
                    address: to.clone(),
                    timeout,
                })
            }
        }
    }

    /// Asks an actor for a snapshot of its state.
    ///
    /// The snapshot is taken on the actor's own task, between two messages.
    pub async fn snapshot_state(&self, address: &Address) -> Result<serde_json::Value> {
        let (tx, rx) = oneshot::channel();
        self.deliver(address, Envelope::Snapshot(tx)).await?;
        rx.await.map_err(|_| ActorError::NoReply(address.clone()))
    }

    /// Stops one actor.
    ///
    /// The address is released immediately. An in-flight handler is
    /// cancelled, queued messages are dropped (their requesters see
    /// [`ActorError::NoReply`]), and the actor's teardown runs once.
    pub async fn shutdown(&self, address: &Address) -> Result<()> {
        let handle = {
            let mut registry = self.inner.registry.write().await;
            registry.order.retain(|a| a != address);
            registry.actors.remove(address)
        }
        .ok_or_else(|| ActorError::UnknownAddress(address.clone()))?;

        handle.stop(address, self.inner.config.shutdown_timeout).await;
        Ok(())
    }

    /// Stops every actor in reverse registration order, then closes the
    /// broker.
    pub async fn shutdown_all(&self) {
        let handles: Vec<_> = {
            let mut registry = self.inner.registry.write().await;
            let order = std::mem::take(&mut registry.order);
            order
                .into_iter()
                .rev()
                .filter_map(|address| {
                    registry
                        .actors
                        .remove(&address)
                        .map(|handle| (address, handle))
                })
                .collect()
        };

        for (address, handle) in handles {
            handle.stop(&address, self.inner.config.shutdown_timeout).await;
        }
        self.inner.broker.close().await;
        tracing::info!("actor system stopped");
    }
}

async fn run_actor<M, R, A>(
    mut actor: A,
    ctx: Context<M, R>,
    mut inbox: mpsc::Receiver<Envelope<M, R>>,
    mut cancelled: oneshot::Receiver<()>,
) where
    M: Send + 'static,
    R: Send + 'static,
    A: Actor<M, R>,
{
    actor.started(&ctx).await;
    let address = ctx.address().to_string();

    loop {
        tokio::select! {
            biased;
            _ = &mut cancelled => break,
            envelope = inbox.recv() => match envelope {
                Some(Envelope::Message(message)) => {
                    tracing::debug!(from = %message.from, "dispatch");
                    metrics::counter!("actor_messages_total", "address" => address.clone())
                        .increment(1);

                    tokio::select! {
                        biased;
                        _ = &mut cancelled => {
                            tracing::debug!("in-flight message cancelled");
                            break;
                        }
                        _ = actor.handle(&ctx, message) => {}
                    }
                }
                Some(Envelope::Snapshot(reply)) => {
                    let _ = reply.send(actor.snapshot_state());
                }
                None => break,
            },
        }
    }

    inbox.close();
    let mut dropped = 0usize;
    while inbox.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::debug!(dropped, "queued messages dropped");
    }

    actor.shutdown().await;
}
