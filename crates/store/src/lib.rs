//! Store collaborators consumed by the order placer.
//!
//! Each store is a trait with an in-memory implementation for tests and
//! a PostgreSQL implementation backed by sqlx.

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use memory::{InMemoryCustomerStore, InMemoryOrderStore, InMemoryProductStore};
pub use postgres::PostgresStore;
pub use store::{CustomerStore, OrderStore, ProductStore};
