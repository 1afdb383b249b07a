//! Database module: engine, sessions and schema for persistent storage.
//!
//! Layout:
//! - `admin.rs`: first-administrator seeding
//! - `engine.rs`: the shared engine and the scoped session provider
//! - `session.rs`: unit-of-work handle over one libsql connection
//! - `schema.rs`: schema registry and initializer
//! - `models.rs`: application entities registered with the schema

pub mod admin;
pub mod engine;
pub mod models;
pub mod schema;
pub mod session;

pub use admin::{SeedOutcome, seed_initial_admin};
pub use engine::{Engine, EngineOptions};
pub use schema::{Model, SchemaRegistry, TableDef, initialize_schema};
pub use session::Session;
