//! Sous Storage crate - SQLite persistence for the cooking session.
//!
//! The session lives in a small key-value table. The whole snapshot is
//! serialized as JSON under a single well-known key and overwritten on
//! every save.

pub mod db;
pub mod migrations;
pub mod session_store;

pub use db::Database;
pub use session_store::{SqliteSessionStore, SESSION_KEY};
