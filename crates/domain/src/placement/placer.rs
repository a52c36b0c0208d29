//! The place-order workflow.

use std::collections::HashMap;
use std::time::Instant;

use common::{NewOrder, NewOrderLine, Order, Product, ProductId, StockUpdate};
use store::{CustomerStore, OrderStore, ProductStore};

use crate::error::DomainError;

use super::{OrderError, OrderLineRequest, PlaceOrder, PlacementPolicy};

/// Places orders against a customer store, a product catalog and an order store.
///
/// Placement runs as a fixed sequence of gates: customer lookup, catalog
/// fetch, existence check, stock check, pricing, order insert and stock
/// decrement. The first failing gate ends the call; nothing is written
/// unless every check passed.
pub struct OrderPlacer<C, P, O>
where
    C: CustomerStore,
    P: ProductStore,
    O: OrderStore,
{
    customers: C,
    products: P,
    orders: O,
    policy: PlacementPolicy,
}

impl<C, P, O> OrderPlacer<C, P, O>
where
    C: CustomerStore,
    P: ProductStore,
    O: OrderStore,
{
    /// Creates a placer with the default policy.
    pub fn new(customers: C, products: P, orders: O) -> Self {
        Self {
            customers,
            products,
            orders,
            policy: PlacementPolicy::default(),
        }
    }

    /// Replaces the stock handling policy.
    pub fn with_policy(mut self, policy: PlacementPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Places an order and returns it as stored.
    ///
    /// Line prices are copied from the catalog at call time. Stock for each
    /// ordered product is set to the quantity read at the start of the call
    /// minus the ordered quantity.
    #[tracing::instrument(
        skip(self, cmd),
        fields(customer_id = %cmd.customer_id, lines = cmd.lines.len())
    )]
    pub async fn place(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let started = Instant::now();
        let result = self.try_place(cmd).await;

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount(),
                    "order placed"
                );
            }
            Err(DomainError::Order(e)) => {
                metrics::counter!("orders_rejected_total", "reason" => e.reason()).increment(1);
                tracing::warn!(error = %e, "order rejected");
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total", "reason" => "store").increment(1);
                tracing::error!(error = %e, "order placement failed");
            }
        }
        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        result
    }

    async fn try_place(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        validate_lines(&cmd.lines)?;

        // 1. Customer
        let customer = self
            .customers
            .find_by_id(cmd.customer_id)
            .await?
            .ok_or(OrderError::CustomerNotFound(cmd.customer_id))?;

        // 2. Catalog snapshot
        let found = self.products.find_all_by_id(&cmd.product_ids()).await?;
        if found.is_empty() {
            return Err(OrderError::NoProductsFound.into());
        }
        let catalog: HashMap<ProductId, Product> = found.into_iter().map(|p| (p.id, p)).collect();

        // 3. Existence, first missing id in input order
        let mut resolved: Vec<(&OrderLineRequest, &Product)> = Vec::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            let product = catalog
                .get(&line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            resolved.push((line, product));
        }

        // 4. Stock
        self.check_stock(&resolved)?;

        // 5. Pricing
        let new_order = NewOrder {
            customer,
            lines: resolved
                .iter()
                .map(|(line, product)| NewOrderLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: product.price,
                })
                .collect(),
        };

        // 6 & 7. Persist and decrement
        if self.policy.guard_stock_updates {
            let updates = self.stock_updates(
                new_order.lines.iter().map(|l| (l.product_id, l.quantity)),
                &catalog,
            );
            self.products.update_quantity(updates.clone()).await?;

            match self.orders.create(new_order).await {
                Ok(order) => Ok(order),
                Err(e) => {
                    self.restore_stock(&updates, &catalog).await;
                    Err(e.into())
                }
            }
        } else {
            let order = self.orders.create(new_order).await?;
            let updates = self.stock_updates(
                order.lines.iter().map(|l| (l.product_id, l.quantity)),
                &catalog,
            );
            self.products.update_quantity(updates).await?;
            Ok(order)
        }
    }

    fn check_stock(&self, resolved: &[(&OrderLineRequest, &Product)]) -> Result<(), OrderError> {
        let mut totals: HashMap<ProductId, u32> = HashMap::new();

        for (line, product) in resolved {
            let requested = if self.policy.merge_duplicate_lines {
                let total = totals.entry(line.product_id).or_insert(0);
                *total = total.saturating_add(line.quantity);
                *total
            } else {
                line.quantity
            };

            if requested > product.quantity {
                return Err(OrderError::InsufficientStock {
                    product_id: line.product_id,
                    requested,
                    available: product.quantity,
                });
            }
        }

        Ok(())
    }

    /// Builds the new stock values from the catalog snapshot.
    ///
    /// Without merging, one update per line is emitted, so a later line for
    /// the same product overwrites an earlier one.
    fn stock_updates(
        &self,
        lines: impl Iterator<Item = (ProductId, u32)>,
        catalog: &HashMap<ProductId, Product>,
    ) -> Vec<StockUpdate> {
        let mut ordered: Vec<(ProductId, u32)> = Vec::new();
        for (product_id, quantity) in lines {
            let merge_into = if self.policy.merge_duplicate_lines {
                ordered.iter().position(|(id, _)| *id == product_id)
            } else {
                None
            };
            match merge_into {
                Some(i) => ordered[i].1 = ordered[i].1.saturating_add(quantity),
                None => ordered.push((product_id, quantity)),
            }
        }

        ordered
            .into_iter()
            .filter_map(|(product_id, quantity)| {
                let available = catalog.get(&product_id)?.quantity;
                let remaining = available.saturating_sub(quantity);
                Some(if self.policy.guard_stock_updates {
                    StockUpdate::guarded(product_id, remaining, available)
                } else {
                    StockUpdate::new(product_id, remaining)
                })
            })
            .collect()
    }

    /// Puts back the snapshot quantities after a failed order insert.
    ///
    /// Only products still holding the value we wrote are restored.
    async fn restore_stock(&self, applied: &[StockUpdate], catalog: &HashMap<ProductId, Product>) {
        let mut restores: Vec<StockUpdate> = Vec::with_capacity(applied.len());
        // Last write per product is the one that stuck
        for update in applied.iter().rev() {
            if restores.iter().any(|r| r.product_id == update.product_id) {
                continue;
            }
            if let Some(product) = catalog.get(&update.product_id) {
                restores.push(StockUpdate::guarded(
                    update.product_id,
                    product.quantity,
                    update.quantity,
                ));
            }
        }

        if let Err(e) = self.products.update_quantity(restores).await {
            metrics::counter!("stock_restore_failures_total").increment(1);
            tracing::error!(error = %e, "failed to restore stock after order insert failed");
        }
    }
}

fn validate_lines(lines: &[OrderLineRequest]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    if let Some(line) = lines.iter().find(|l| l.quantity == 0) {
        return Err(OrderError::InvalidQuantity {
            product_id: line.product_id,
            quantity: line.quantity,
        });
    }

    Ok(())
}
