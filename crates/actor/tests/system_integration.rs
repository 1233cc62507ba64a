//! Actors talking to each other through one system.

use std::time::Duration;

use actor::{Actor, ActorError, ActorSystem, Address, Context, Message};
use async_trait::async_trait;

#[derive(Debug)]
enum Command {
    Put(String),
    Count,
    Forward(String),
}

#[derive(Debug, PartialEq)]
enum Reply {
    Stored(usize),
    Count(usize),
}

fn store_address() -> Address {
    Address::new("local", "store")
}

fn forwarder_address() -> Address {
    Address::new("local", "forwarder")
}

const TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Default)]
struct Store {
    items: Vec<String>,
}

#[async_trait]
impl Actor<Command, Reply> for Store {
    async fn handle(&mut self, ctx: &Context<Command, Reply>, message: Message<Command, Reply>) {
        let (body, reply) = message.split();
        match body {
            Command::Put(item) => {
                ctx.system().broker().publish("stored", &item).await;
                self.items.push(item);
                reply.send(Reply::Stored(self.items.len()));
            }
            Command::Count => {
                reply.send(Reply::Count(self.items.len()));
            }
            Command::Forward(_) => {}
        }
    }

    fn snapshot_state(&self) -> serde_json::Value {
        serde_json::json!({ "items": self.items })
    }
}

/// Forwards every item to the store and waits for the store's answer.
struct Forwarder {
    greeted: bool,
}

#[async_trait]
impl Actor<Command, Reply> for Forwarder {
    async fn started(&mut self, _ctx: &Context<Command, Reply>) {
        self.greeted = true;
    }

    async fn handle(&mut self, ctx: &Context<Command, Reply>, message: Message<Command, Reply>) {
        let (body, reply) = message.split();
        match body {
            Command::Forward(item) => {
                match ctx.ask(&store_address(), Command::Put(item), TIMEOUT).await {
                    Ok(answer) => {
                        reply.send(answer);
                    }
                    Err(e) => tracing::warn!(error = %e, "store unavailable"),
                }
            }
            Command::Put(_) | Command::Count => {}
        }
    }

    fn snapshot_state(&self) -> serde_json::Value {
        serde_json::json!({ "greeted": self.greeted })
    }
}

async fn start() -> ActorSystem<Command, Reply> {
    let system = ActorSystem::default();
    system
        .register(store_address(), Store::default())
        .await
        .unwrap();
    system
        .register(forwarder_address(), Forwarder { greeted: false })
        .await
        .unwrap();
    system
}

#[tokio::test]
async fn request_through_an_intermediate_actor() {
    let system = start().await;
    let me = Address::new("test", "client");
    let mut stored = system.broker().subscribe("stored").await;

    let answer = system
        .send_with_reply(&me, &forwarder_address(), Command::Forward("a".into()), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(answer, Reply::Stored(1));
    assert_eq!(stored.recv().await.as_deref(), Some("a"));

    let count = system
        .send_with_reply(&me, &store_address(), Command::Count, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(count, Reply::Count(1));

    let snapshot = system.snapshot_state(&forwarder_address()).await.unwrap();
    assert_eq!(snapshot["greeted"], true);

    system.shutdown_all().await;
}

#[tokio::test]
async fn request_fails_once_downstream_is_gone() {
    let system = start().await;
    let me = Address::new("test", "client");

    system.shutdown(&store_address()).await.unwrap();

    let err = system
        .send_with_reply(&me, &forwarder_address(), Command::Forward("a".into()), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, ActorError::NoReply(_)));

    system.shutdown_all().await;
}

#[tokio::test]
async fn addresses_can_be_reused_after_shutdown() {
    let system = start().await;

    system.shutdown(&store_address()).await.unwrap();
    system
        .register(store_address(), Store::default())
        .await
        .unwrap();

    let count = system
        .send_with_reply(&Address::new("test", "client"), &store_address(), Command::Count, TIMEOUT)
        .await
        .unwrap();
    assert_eq!(count, Reply::Count(0));

    system.shutdown_all().await;
}
