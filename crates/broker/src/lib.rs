//! In-process publish/subscribe broker.
//!
//! Topics are plain strings and payloads are strings (an aggregate ID, a
//! context name). Every subscriber of a topic gets its own bounded channel.

mod broker;
mod subscription;

pub use broker::{Broker, BrokerConfig};
pub use subscription::Subscription;
