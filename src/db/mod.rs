//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows plus insert payloads
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `actor.rs`: ractor actor owning the pool, with a cloneable handle

pub mod actor;
pub mod models;
pub mod schema;

pub use actor::{DbActorHandle, spawn};
pub use models::{DbIntegrationConfig, IntegrationCreate};
pub use schema::SQLITE_INIT;
