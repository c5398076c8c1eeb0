//! Sous core crate - shared domain types, events, errors, and configuration.
//!
//! Every other crate in the workspace depends on this one. It holds no
//! session logic of its own, only the data shapes the session engine,
//! persistence layer, and voice interpreter agree on.

pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod types;

pub use config::SousConfig;
pub use error::{Result, SousError};
pub use events::SessionEvent;
pub use store::{MemorySessionStore, SessionStore};
pub use types::*;
