use std::time::Duration;

use thiserror::Error;

use crate::Address;

/// Errors returned by the actor runtime.
#[derive(Debug, Error)]
pub enum ActorError {
    /// Another actor is already registered at this address.
    #[error("Address already registered: {0}")]
    DuplicateAddress(Address),

    /// No actor is registered at this address.
    #[error("Unknown address: {0}")]
    UnknownAddress(Address),

    /// The actor stopped and no longer accepts messages.
    #[error("Mailbox closed: {0}")]
    MailboxClosed(Address),

    /// The actor did not reply in time.
    #[error("No reply from {address} within {timeout:?}")]
    Timeout { address: Address, timeout: Duration },

    /// The actor dropped the request without replying.
    #[error("{0} dropped the request without replying")]
    NoReply(Address),
}

/// Result type for actor runtime operations.
pub type Result<T> = std::result::Result<T, ActorError>;
