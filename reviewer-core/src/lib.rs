//! Reviewer Core - teams, users and pull requests with automatic reviewer assignment
//!
//! This crate holds the domain model, the assignment engine and the storage
//! port it runs against. Storage backends live in other crates and implement
//! [`store::ReviewStore`].

pub mod config;
pub mod error;
pub mod model;
pub mod selection;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{ConflictKind, Error, Result};
pub use service::AssignmentService;
pub use store::{InMemoryStore, ReviewStore, StoreTx};
