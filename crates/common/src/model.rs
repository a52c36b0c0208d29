//! Plain data records exchanged between the order placer and its stores.
//!
//! Schema mapping is owned by each store implementation; these types carry
//! no persistence annotations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CustomerId, Money, OrderId, OrderLineId, ProductId};

/// A customer known to the customer store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
}

impl Customer {
    /// Creates a customer with a fresh id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(),
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A catalog entry and its available stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,

    /// Current unit price.
    pub price: Money,

    /// Units available for ordering.
    pub quantity: u32,
}

impl Product {
    /// Creates a product with a fresh id.
    pub fn new(name: impl Into<String>, price: Money, quantity: u32) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            price,
            quantity,
        }
    }
}

/// A stored line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub quantity: u32,

    /// Unit price captured when the order was placed.
    pub price: Money,
}

impl OrderLine {
    /// Returns quantity * price.
    pub fn total_price(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the sum of all line totals.
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(OrderLine::total_price).sum()
    }

    /// Returns the line for a product, if any.
    pub fn line_for(&self, product_id: ProductId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }
}

/// A priced line that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// An order ready to be handed to the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer: Customer,
    pub lines: Vec<NewOrderLine>,
}

/// New absolute stock value for one product.
///
/// When `expected_quantity` is set the store only applies the update if the
/// product still holds that quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub quantity: u32,
    pub expected_quantity: Option<u32>,
}

impl StockUpdate {
    /// Creates an unconditional update.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            expected_quantity: None,
        }
    }

    /// Creates an update that only applies while stock equals `expected`.
    pub fn guarded(product_id: ProductId, quantity: u32, expected: u32) -> Self {
        Self {
            product_id,
            quantity,
            expected_quantity: Some(expected),
        }
    }
}
