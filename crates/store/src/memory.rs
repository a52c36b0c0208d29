use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{
    Customer, CustomerId, Money, NewOrder, Order, OrderId, OrderLine, OrderLineId, Product,
    ProductId, StockUpdate,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CustomerStore, OrderStore, ProductStore},
};

fn unavailable(store: &str) -> StoreError {
    StoreError::Unavailable(format!("{store} store is offline"))
}

#[derive(Debug, Default)]
struct CustomerState {
    customers: HashMap<CustomerId, Customer>,
    lookups: usize,
    unavailable: bool,
}

/// In-memory customer store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustomerStore {
    state: Arc<RwLock<CustomerState>>,
}

impl InMemoryCustomerStore {
    /// Creates an empty customer store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a customer.
    pub async fn insert(&self, customer: Customer) {
        self.state
            .write()
            .await
            .customers
            .insert(customer.id, customer);
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns how many lookups have been served.
    pub async fn lookup_count(&self) -> usize {
        self.state.read().await.lookups
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable("customer"));
        }
        state.lookups += 1;
        Ok(state.customers.get(&id).cloned())
    }
}

#[derive(Debug, Default)]
struct ProductState {
    products: HashMap<ProductId, Product>,
    fetches: usize,
    updates: usize,
    unavailable: bool,
}

/// In-memory product catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductStore {
    state: Arc<RwLock<ProductState>>,
}

impl InMemoryProductStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub async fn insert(&self, product: Product) {
        self.state
            .write()
            .await
            .products
            .insert(product.id, product);
    }

    /// Returns the current state of a product.
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        self.state.read().await.products.get(&id).cloned()
    }

    /// Changes a product's price, as catalog management would.
    pub async fn set_price(&self, id: ProductId, price: Money) {
        if let Some(product) = self.state.write().await.products.get_mut(&id) {
            product.price = price;
        }
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns how many `find_all_by_id` calls have been served.
    pub async fn fetch_count(&self) -> usize {
        self.state.read().await.fetches
    }

    /// Returns how many `update_quantity` batches have been applied.
    pub async fn update_count(&self) -> usize {
        self.state.read().await.updates
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable("product"));
        }
        state.fetches += 1;

        let mut found: Vec<Product> = Vec::new();
        for id in ids {
            if found.iter().any(|p| p.id == *id) {
                continue;
            }
            if let Some(product) = state.products.get(id) {
                found.push(product.clone());
            }
        }
        Ok(found)
    }

    async fn update_quantity(&self, updates: Vec<StockUpdate>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable("product"));
        }

        // Check the whole batch against the current state before touching anything
        for update in &updates {
            let product = state
                .products
                .get(&update.product_id)
                .ok_or(StoreError::ProductNotFound(update.product_id))?;

            if let Some(expected) = update.expected_quantity
                && product.quantity != expected
            {
                return Err(StoreError::StockConflict {
                    product_id: update.product_id,
                    expected,
                    actual: product.quantity,
                });
            }
        }

        for update in updates {
            if let Some(product) = state.products.get_mut(&update.product_id) {
                product.quantity = update.quantity;
            }
        }
        state.updates += 1;

        Ok(())
    }
}

#[derive(Debug, Default)]
struct OrderState {
    orders: Vec<Order>,
    unavailable: bool,
}

/// In-memory order store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let mut state = self.state.write().await;
        if state.unavailable {
            return Err(unavailable("order"));
        }

        let stored = Order {
            id: OrderId::new(),
            customer: order.customer,
            lines: order
                .lines
                .into_iter()
                .map(|line| OrderLine {
                    id: OrderLineId::new(),
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: line.price,
                })
                .collect(),
            created_at: Utc::now(),
        };
        state.orders.push(stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        if state.unavailable {
            return Err(unavailable("order"));
        }
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }
}
