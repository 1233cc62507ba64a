//! Locale item service.
//!
//! Wires the event store, the aggregate reducer and the read models into an
//! actor pipeline:
//! - [`LocaleRuntime`] starts and stops the pipeline
//! - [`LocaleClient`] issues create/update commands and read model queries
//! - [`Config`] is loaded from environment variables

pub mod actors;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod runtime;

pub use client::LocaleClient;
pub use config::{Config, LogFormat};
pub use error::{Error, Result};
pub use messages::{Command, LocaleContext, LocaleSystem, Reply};
pub use runtime::LocaleRuntime;
