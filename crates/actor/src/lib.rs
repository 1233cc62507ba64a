//! Actor runtime for the locale pipeline.
//!
//! - [`ActorSystem`] is the runtime root: it owns the registry of addressed
//!   actors and the pub/sub [`Broker`](broker::Broker)
//! - [`Actor`] is implemented by every component that receives [`Message`]s
//! - [`batch::Batcher`] coalesces bursts of notifications per key

pub mod actor;
pub mod address;
pub mod batch;
pub mod error;
pub mod message;
pub mod system;

pub use actor::{Actor, Context};
pub use address::Address;
pub use batch::{BatchConfig, BatchEntry, Batcher};
pub use error::{ActorError, Result};
pub use message::{Message, ReplyTo};
pub use system::{ActorSystem, SystemConfig};
