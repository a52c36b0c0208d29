//! Order placement workflow and related types.

mod commands;
mod placer;
mod policy;

pub use commands::{OrderLineRequest, PlaceOrder};
pub use placer::OrderPlacer;
pub use policy::PlacementPolicy;

use common::{CustomerId, ProductId};
use thiserror::Error;

/// Reasons an order request is rejected.
///
/// All of these are terminal: retrying the same request against the same
/// catalog yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The request has no lines.
    #[error("Order has no lines")]
    EmptyOrder,

    /// A line asks for zero units.
    #[error("Invalid quantity {quantity} for product {product_id} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    /// The customer id does not resolve.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// None of the requested products exist.
    #[error("None of the requested products were found")]
    NoProductsFound,

    /// A requested product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A line asks for more units than are in stock.
    ///
    /// `requested` is the line quantity, or the running total for the
    /// product when duplicate lines are merged.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
}

impl OrderError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            OrderError::EmptyOrder => "empty_order",
            OrderError::InvalidQuantity { .. } => "invalid_quantity",
            OrderError::CustomerNotFound(_) => "customer_not_found",
            OrderError::NoProductsFound => "no_products_found",
            OrderError::ProductNotFound(_) => "product_not_found",
            OrderError::InsufficientStock { .. } => "insufficient_stock",
        }
    }
}
