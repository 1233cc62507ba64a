use std::time::Duration;

use async_trait::async_trait;

use crate::{ActorSystem, Address, Message, Result};

/// A component that owns its state and processes messages one at a time.
///
/// Handlers run on the actor's own task, in arrival order. A handler may be
/// cancelled at an await point when the actor is shut down.
#[async_trait]
pub trait Actor<M, R>: Send + 'static
where
    M: Send + 'static,
    R: Send + 'static,
{
    /// Runs on the actor's task before the first message.
    async fn started(&mut self, _ctx: &Context<M, R>) {}

    /// Processes one message.
    async fn handle(&mut self, ctx: &Context<M, R>, message: Message<M, R>);

    /// Releases the actor's resources. Called exactly once, after the last
    /// message.
    async fn shutdown(&mut self) {}

    /// Returns a diagnostic view of the actor's state.
    fn snapshot_state(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// What an actor knows about itself and the system it runs in.
pub struct Context<M, R> {
    address: Address,
    system: ActorSystem<M, R>,
}

impl<M, R> Context<M, R>
where
    M: Send + 'static,
    R: Send + 'static,
{
    pub(crate) fn new(address: Address, system: ActorSystem<M, R>) -> Self {
        Self { address, system }
    }

    /// This actor's address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The system the actor is registered in.
    pub fn system(&self) -> &ActorSystem<M, R> {
        &self.system
    }

    /// Sends a fire-and-forget message from this actor.
    pub async fn tell(&self, to: &Address, body: M) -> Result<()> {
        self.system.tell(&self.address, to, body).await
    }

    /// Sends a request from this actor and waits for the reply.
    pub async fn ask(&self, to: &Address, body: M, timeout: Duration) -> Result<R> {
        self.system
            .send_with_reply(&self.address, to, body, timeout)
            .await
    }
}
