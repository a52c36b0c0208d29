//! Shared types for the order placement system.
//!
//! - Strongly typed identifiers for customers, products, orders and order lines
//! - `Money` for catalog prices and line price snapshots
//! - Plain data records exchanged with the store collaborators

pub mod model;
pub mod money;
pub mod types;

pub use model::{Customer, NewOrder, NewOrderLine, Order, OrderLine, Product, StockUpdate};
pub use money::Money;
pub use types::{CustomerId, OrderId, OrderLineId, ProductId};
