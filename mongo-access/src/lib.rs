//! # mongo_access - typed collection access for MongoDB
//!
//! A thin layer over the official `mongodb` driver that resolves collection
//! handles from entity types instead of from names spread across the code.
//!
//! ## Key Features
//!
//! - **Type-driven resolution**: each entity type declares its database and
//!   collection once, through [`CollectionEntity`]
//! - **Handle cache**: handles are resolved on first use and reused for the
//!   lifetime of the access object
//! - **Blocking and async**: every operation has a blocking form and an
//!   `_async` form
//! - **Pass-through CRUD**: inserts, updates, deletes and queries go to the
//!   driver unchanged, driver errors included
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mongo_access::{CollectionProxy, MongoAccess};
//! use mongo_access_derive::CollectionEntity;
//! use mongodb::bson::{doc, oid::ObjectId};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, CollectionEntity)]
//! #[mapping(database = "shop", collection = "orders")]
//! pub struct Order {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     status: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let access = MongoAccess::new("mongodb://localhost/test")?;
//!
//! let order = Order { id: ObjectId::new(), status: "open".into() };
//! access.insert_one(&order)?;
//!
//! let modified = access.update_many::<Order>(&doc! { "status": "done" }, doc! { "_id": order.id })?;
//! let stored = access.query(|orders: CollectionProxy<Order>| orders.find_by_id(order.id))??;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`entity`] - Entity trait and mapping metadata
//! - [`errors`] - Error types and result definitions
//! - [`update`] - Update document construction
//! - [`access_config`] - Access object settings

mod access_builder;
pub mod access_config;
mod collection_registry;
pub mod entity;
pub mod errors;
mod mongo_access;
mod proxy;
mod runtime;
pub mod update;

pub use access_builder::MongoAccessBuilder;
pub use access_config::{AccessConfig, UpdateValueMode};
pub use entity::{CollectionEntity, MappingInformation};
pub use errors::{ErrorKind, MongoAccessError, MongoAccessResult};
pub use mongo_access::MongoAccess;
pub use proxy::CollectionProxy;

use std::thread::available_parallelism;

/// Returns the number of available CPU cores, or 1 if it cannot be detected.
pub fn get_cpu_count() -> usize {
    available_parallelism()
        .map(|p| p.get())
        .unwrap_or_else(|err| {
            log::warn!("Failed to detect available parallelism: {}. Defaulting to single thread.", err);
            1
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    #[test]
    fn test_get_cpu_count_positive() {
        assert!(get_cpu_count() > 0);
    }
}
