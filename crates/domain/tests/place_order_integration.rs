//! Integration tests for order placement.
//!
//! These tests drive `OrderPlacer` over the in-memory stores and check the
//! validation order, price snapshots and stock effects.

use async_trait::async_trait;
use common::{Customer, CustomerId, Money, Product, ProductId, StockUpdate};
use domain::{DomainError, OrderError, OrderPlacer, PlaceOrder, PlacementPolicy};
use store::{
    InMemoryCustomerStore, InMemoryOrderStore, InMemoryProductStore, OrderStore, ProductStore,
    StoreError,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Customer C1 and a catalog with P1(price=10, qty=5) and P2(price=20, qty=2).
struct Shop {
    customers: InMemoryCustomerStore,
    products: InMemoryProductStore,
    orders: InMemoryOrderStore,
    c1: Customer,
    p1: Product,
    p2: Product,
}

impl Shop {
    async fn open() -> Self {
        init_tracing();

        let customers = InMemoryCustomerStore::new();
        let products = InMemoryProductStore::new();
        let orders = InMemoryOrderStore::new();

        let c1 = Customer::new("C1", "c1@example.com");
        customers.insert(c1.clone()).await;

        let p1 = Product::new("P1", Money::from_dollars(10), 5);
        let p2 = Product::new("P2", Money::from_dollars(20), 2);
        products.insert(p1.clone()).await;
        products.insert(p2.clone()).await;

        Self {
            customers,
            products,
            orders,
            c1,
            p1,
            p2,
        }
    }

    fn placer(&self) -> OrderPlacer<InMemoryCustomerStore, InMemoryProductStore, InMemoryOrderStore> {
        OrderPlacer::new(
            self.customers.clone(),
            self.products.clone(),
            self.orders.clone(),
        )
    }

    fn order(&self) -> PlaceOrder {
        PlaceOrder::for_customer(self.c1.id)
    }

    async fn stock(&self, id: ProductId) -> u32 {
        self.products.get(id).await.unwrap().quantity
    }

    async fn assert_nothing_written(&self) {
        assert_eq!(self.orders.order_count().await, 0);
        assert_eq!(self.products.update_count().await, 0);
        assert_eq!(self.stock(self.p1.id).await, 5);
        assert_eq!(self.stock(self.p2.id).await, 2);
    }
}

fn rejection(err: DomainError) -> OrderError {
    match err {
        DomainError::Order(e) => e,
        other => panic!("expected a rejection, got {other}"),
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn places_order_and_decrements_stock() {
        let shop = Shop::open().await;

        let order = shop
            .placer()
            .place(shop.order().line(shop.p1.id, 2).line(shop.p2.id, 1))
            .await
            .unwrap();

        assert_eq!(order.customer, shop.c1);
        let lines: Vec<_> = order
            .lines
            .iter()
            .map(|l| (l.product_id, l.quantity, l.price))
            .collect();
        assert_eq!(
            lines,
            vec![
                (shop.p1.id, 2, Money::from_dollars(10)),
                (shop.p2.id, 1, Money::from_dollars(20)),
            ]
        );
        assert_eq!(order.total_amount(), Money::from_dollars(40));

        assert_eq!(shop.stock(shop.p1.id).await, 3);
        assert_eq!(shop.stock(shop.p2.id).await, 1);
        assert_eq!(shop.orders.order_count().await, 1);
    }

    #[tokio::test]
    async fn unknown_product_is_named() {
        let shop = Shop::open().await;
        let p3 = ProductId::new();

        let err = shop
            .placer()
            .place(shop.order().line(shop.p1.id, 1).line(p3, 1))
            .await
            .unwrap_err();

        assert_eq!(rejection(err), OrderError::ProductNotFound(p3));
        shop.assert_nothing_written().await;
    }

    #[tokio::test]
    async fn over_stock_line_is_named() {
        let shop = Shop::open().await;

        let err = shop
            .placer()
            .place(shop.order().line(shop.p2.id, 5))
            .await
            .unwrap_err();

        assert_eq!(
            rejection(err),
            OrderError::InsufficientStock {
                product_id: shop.p2.id,
                requested: 5,
                available: 2,
            }
        );
        shop.assert_nothing_written().await;
    }
}

mod validation_order {
    use super::*;

    #[tokio::test]
    async fn unknown_customer_touches_nothing_else() {
        let shop = Shop::open().await;
        let stranger = CustomerId::new();

        let err = shop
            .placer()
            .place(PlaceOrder::for_customer(stranger).line(shop.p1.id, 1))
            .await
            .unwrap_err();

        assert_eq!(rejection(err), OrderError::CustomerNotFound(stranger));
        assert_eq!(shop.products.fetch_count().await, 0);
        shop.assert_nothing_written().await;
    }

    #[tokio::test]
    async fn no_matching_products() {
        let shop = Shop::open().await;

        let err = shop
            .placer()
            .place(shop.order().line(ProductId::new(), 1).line(ProductId::new(), 2))
            .await
            .unwrap_err();

        assert_eq!(rejection(err), OrderError::NoProductsFound);
        shop.assert_nothing_written().await;
    }

    #[tokio::test]
    async fn first_missing_product_in_input_order() {
        let shop = Shop::open().await;
        let first = ProductId::new();
        let second = ProductId::new();

        let err = shop
            .placer()
            .place(
                shop.order()
                    .line(shop.p1.id, 1)
                    .line(first, 1)
                    .line(second, 1),
            )
            .await
            .unwrap_err();

        assert_eq!(rejection(err), OrderError::ProductNotFound(first));
    }

    #[tokio::test]
    async fn existence_is_checked_before_stock() {
        let shop = Shop::open().await;
        let missing = ProductId::new();

        let err = shop
            .placer()
            .place(shop.order().line(shop.p2.id, 99).line(missing, 1))
            .await
            .unwrap_err();

        assert_eq!(rejection(err), OrderError::ProductNotFound(missing));
    }

    #[tokio::test]
    async fn first_over_stock_line_in_input_order() {
        let shop = Shop::open().await;

        let err = shop
            .placer()
            .place(
                shop.order()
                    .line(shop.p1.id, 1)
                    .line(shop.p2.id, 3)
                    .line(shop.p1.id, 6),
            )
            .await
            .unwrap_err();

        assert_eq!(
            rejection(err),
            OrderError::InsufficientStock {
                product_id: shop.p2.id,
                requested: 3,
                available: 2,
            }
        );
        shop.assert_nothing_written().await;
    }
}

mod stock_effects {
    use super::*;

    #[tokio::test]
    async fn stored_prices_ignore_later_catalog_changes() {
        let shop = Shop::open().await;

        let order = shop
            .placer()
            .place(shop.order().line(shop.p1.id, 1))
            .await
            .unwrap();

        shop.products
            .set_price(shop.p1.id, Money::from_dollars(99))
            .await;

        let stored = shop.orders.find_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(
            stored.line_for(shop.p1.id).unwrap().price,
            Money::from_dollars(10)
        );
    }

    #[tokio::test]
    async fn placing_twice_decrements_twice() {
        let shop = Shop::open().await;
        let placer = shop.placer();
        let request = shop.order().line(shop.p1.id, 2);

        let first = placer.place(request.clone()).await.unwrap();
        assert_eq!(shop.stock(shop.p1.id).await, 3);

        let second = placer.place(request).await.unwrap();
        assert_eq!(shop.stock(shop.p1.id).await, 1);

        // Not idempotent: two distinct orders and cumulative stock effects
        assert_ne!(first.id, second.id);
        assert_eq!(shop.orders.order_count().await, 2);

        let err = placer
            .place(shop.order().line(shop.p1.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(
            rejection(err),
            OrderError::InsufficientStock { available: 1, .. }
        ));
    }
}

mod store_faults {
    use super::*;

    #[tokio::test]
    async fn customer_store_fault_propagates() {
        let shop = Shop::open().await;
        shop.customers.set_unavailable(true).await;

        let err = shop
            .placer()
            .place(shop.order().line(shop.p1.id, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(StoreError::Unavailable(_))));
        shop.assert_nothing_written().await;
    }

    #[tokio::test]
    async fn catalog_fault_propagates() {
        let shop = Shop::open().await;
        shop.products.set_unavailable(true).await;

        let err = shop
            .placer()
            .place(shop.order().line(shop.p1.id, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Store(StoreError::Unavailable(_))));
        assert!(err.order_error().is_none());
        assert_eq!(shop.orders.order_count().await, 0);
    }
}

/// Catalog that sells one unit of every fetched product right after the
/// fetch, as a concurrent placement would.
#[derive(Clone)]
struct RacingCatalog {
    inner: InMemoryProductStore,
}

#[async_trait]
impl ProductStore for RacingCatalog {
    async fn find_all_by_id(&self, ids: &[ProductId]) -> store::Result<Vec<Product>> {
        let found = self.inner.find_all_by_id(ids).await?;
        for product in &found {
            self.inner
                .update_quantity(vec![StockUpdate::new(
                    product.id,
                    product.quantity.saturating_sub(1),
                )])
                .await?;
        }
        Ok(found)
    }

    async fn update_quantity(&self, updates: Vec<StockUpdate>) -> store::Result<()> {
        self.inner.update_quantity(updates).await
    }
}

mod concurrency_guard {
    use super::*;

    fn racing_placer(
        shop: &Shop,
        policy: PlacementPolicy,
    ) -> OrderPlacer<InMemoryCustomerStore, RacingCatalog, InMemoryOrderStore> {
        OrderPlacer::new(
            shop.customers.clone(),
            RacingCatalog {
                inner: shop.products.clone(),
            },
            shop.orders.clone(),
        )
        .with_policy(policy)
    }

    #[tokio::test]
    async fn unguarded_placement_overwrites_concurrent_sale() {
        let shop = Shop::open().await;

        racing_placer(&shop, PlacementPolicy::default())
            .place(shop.order().line(shop.p1.id, 2))
            .await
            .unwrap();

        // The concurrent sale of one unit is lost
        assert_eq!(shop.stock(shop.p1.id).await, 3);
    }

    #[tokio::test]
    async fn guarded_placement_detects_concurrent_sale() {
        let shop = Shop::open().await;

        let err = racing_placer(&shop, PlacementPolicy::strict())
            .place(shop.order().line(shop.p1.id, 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Store(StoreError::StockConflict {
                expected: 5,
                actual: 4,
                ..
            })
        ));
        assert_eq!(shop.stock(shop.p1.id).await, 4);
        assert_eq!(shop.orders.order_count().await, 0);
    }

    #[tokio::test]
    async fn guarded_placement_without_contention_succeeds() {
        let shop = Shop::open().await;

        let order = shop
            .placer()
            .with_policy(PlacementPolicy::strict())
            .place(shop.order().line(shop.p1.id, 2).line(shop.p2.id, 2))
            .await
            .unwrap();

        assert_eq!(order.lines.len(), 2);
        assert_eq!(shop.stock(shop.p1.id).await, 3);
        assert_eq!(shop.stock(shop.p2.id).await, 0);
    }
}
