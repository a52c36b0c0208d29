use async_trait::async_trait;
use common::{Customer, CustomerId, NewOrder, Order, OrderId, Product, ProductId, StockUpdate};

use crate::Result;

/// Looks up customers by id.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Returns the customer, or None if no customer has this id.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>>;
}

/// Catalog access for order placement.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Returns the products whose ids appear in `ids`.
    ///
    /// Missing ids are silently skipped; the result may be shorter than
    /// the input and its order is unspecified.
    async fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Sets the stock of each listed product.
    ///
    /// The batch is applied atomically: if any guarded update finds a
    /// quantity other than its `expected_quantity`, the call fails with
    /// `StockConflict` and no product changes.
    async fn update_quantity(&self, updates: Vec<StockUpdate>) -> Result<()>;
}

/// Persists placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Stores a new order, assigning ids to the order and each of its lines.
    ///
    /// Lines keep the order they were given in.
    async fn create(&self, order: NewOrder) -> Result<Order>;

    /// Loads a stored order.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>>;
}
