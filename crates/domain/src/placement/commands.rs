//! Order placement input.

use common::{CustomerId, ProductId};
use serde::{Deserialize, Serialize};

/// One requested product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLineRequest {
    /// Creates a new line request.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place an order for a customer.
///
/// Lines are kept in the order given; duplicate product ids are allowed
/// and treated as separate lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// The customer placing the order.
    pub customer_id: CustomerId,

    /// Requested lines in input order.
    pub lines: Vec<OrderLineRequest>,
}

impl PlaceOrder {
    /// Creates a command with no lines, to be filled with `line`.
    pub fn for_customer(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
        }
    }

    /// Appends a line.
    pub fn line(mut self, product_id: ProductId, quantity: u32) -> Self {
        self.lines.push(OrderLineRequest::new(product_id, quantity));
        self
    }

    /// Returns the distinct product ids in first-occurrence order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.lines.len());
        for line in &self.lines {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }
}
