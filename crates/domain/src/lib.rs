//! birdfeed domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `document`: Filters, sort/projection options and updates for the document store
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `repository`: Strictly typed access to the three collections
//! - `usecases`: Follow graph, fan-out query, listing cache, feed and account logic
//! - `service`: Validation, authentication and response shaping for every operation

pub mod document;
pub mod error;
pub mod model;
pub mod ports;
pub mod repository;
pub mod service;
pub mod usecases;
pub mod validate;

#[cfg(test)]
mod testing;

pub use document::{Collection, Document, Filter, FindOptions, Predicate, SortKey, Update};
pub use error::ServiceError;
pub use model::*;
pub use ports::*;
pub use service::{Dependencies, ServiceConfig, SocialService};
