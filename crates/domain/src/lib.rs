//! Domain layer for order placement.
//!
//! This crate provides:
//! - `OrderPlacer`, which validates a request against the customer and
//!   product stores, records the order and decrements stock
//! - `PlaceOrder` / `OrderLineRequest` input types
//! - `PlacementPolicy` for the stricter duplicate-line and concurrency modes
//! - The `OrderError` rejection taxonomy

pub mod error;
pub mod placement;

pub use error::DomainError;
pub use placement::{OrderError, OrderLineRequest, OrderPlacer, PlaceOrder, PlacementPolicy};
