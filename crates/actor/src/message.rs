use tokio::sync::oneshot;

use crate::Address;

/// A message travelling between two actors.
///
/// `M` is the closed set of message bodies understood by the system and `R`
/// the closed set of replies. A message carries a reply channel only when it
/// was sent with [`ActorSystem::send_with_reply`](crate::ActorSystem::send_with_reply).
#[derive(Debug)]
pub struct Message<M, R> {
    pub from: Address,
    pub to: Address,
    pub body: M,
    reply: Option<oneshot::Sender<R>>,
}

impl<M, R> Message<M, R> {
    /// Creates a fire-and-forget message.
    pub fn new(from: Address, to: Address, body: M) -> Self {
        Self {
            from,
            to,
            body,
            reply: None,
        }
    }

    pub(crate) fn with_reply(from: Address, to: Address, body: M, reply: oneshot::Sender<R>) -> Self {
        Self {
            from,
            to,
            body,
            reply: Some(reply),
        }
    }

    /// Returns true if the sender is waiting for a reply.
    pub fn requires_reply(&self) -> bool {
        self.reply.is_some()
    }

    /// Separates the body from the reply channel.
    pub fn split(self) -> (M, ReplyTo<R>) {
        (
            self.body,
            ReplyTo {
                from: self.from,
                sender: self.reply,
            },
        )
    }
}

/// The reply half of a [`Message`].
///
/// Dropping it without calling [`send`](ReplyTo::send) makes the requester
/// see [`ActorError::NoReply`](crate::ActorError::NoReply).
#[derive(Debug)]
pub struct ReplyTo<R> {
    from: Address,
    sender: Option<oneshot::Sender<R>>,
}

impl<R> ReplyTo<R> {
    /// Returns true if the requester is waiting for a reply.
    pub fn is_expected(&self) -> bool {
        self.sender.is_some()
    }

    /// Address of the requester.
    pub fn requester(&self) -> &Address {
        &self.from
    }

    /// Sends the reply, if one is expected.
    ///
    /// Returns false if nobody received it.
    pub fn send(self, reply: R) -> bool {
        match self.sender {
            Some(sender) => {
                if sender.send(reply).is_err() {
                    tracing::debug!(requester = %self.from, "requester stopped waiting");
                    return false;
                }
                true
            }
            None => false,
        }
    }
}
