use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    Customer, CustomerId, Money, NewOrder, Order, OrderId, OrderLine, OrderLineId, Product,
    ProductId, StockUpdate,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{CustomerStore, OrderStore, ProductStore},
};

/// PostgreSQL-backed implementation of all three stores.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_customer(row: &PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price: Money::from_cents(row.try_get("price_cents")?),
            quantity: from_db_quantity(row.try_get("quantity")?)?,
        })
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        Ok(OrderLine {
            id: OrderLineId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: from_db_quantity(row.try_get("quantity")?)?,
            price: Money::from_cents(row.try_get("price_cents")?),
        })
    }
}

fn from_db_quantity(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| StoreError::InvalidRecord(format!("negative quantity {value}")))
}

fn to_db_quantity(value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::InvalidRecord(format!("quantity {value} out of range")))
}

#[async_trait]
impl CustomerStore for PostgresStore {
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row: Option<PgRow> = sqlx::query("SELECT id, name, email FROM customers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn find_all_by_id(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, name, price_cents, quantity
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    async fn update_quantity(&self, updates: Vec<StockUpdate>) -> Result<()> {
        let ids: Vec<Uuid> = updates.iter().map(|u| u.product_id.as_uuid()).collect();

        let mut tx = self.pool.begin().await?;

        // Lock the affected rows and check every expectation before writing
        let rows = sqlx::query("SELECT id, quantity FROM products WHERE id = ANY($1) FOR UPDATE")
            .bind(ids)
            .fetch_all(&mut *tx)
            .await?;

        let mut current = HashMap::with_capacity(rows.len());
        for row in &rows {
            let id = ProductId::from_uuid(row.try_get::<Uuid, _>("id")?);
            current.insert(id, from_db_quantity(row.try_get("quantity")?)?);
        }

        for update in &updates {
            let actual = *current
                .get(&update.product_id)
                .ok_or(StoreError::ProductNotFound(update.product_id))?;

            if let Some(expected) = update.expected_quantity
                && actual != expected
            {
                return Err(StoreError::StockConflict {
                    product_id: update.product_id,
                    expected,
                    actual,
                });
            }
        }

        for update in &updates {
            sqlx::query("UPDATE products SET quantity = $1, updated_at = NOW() WHERE id = $2")
                .bind(to_db_quantity(update.quantity)?)
                .bind(update.product_id.as_uuid())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(products = updates.len(), "stock updated");
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let order_id = OrderId::new();
        let mut tx = self.pool.begin().await?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            "INSERT INTO orders (id, customer_id) VALUES ($1, $2) RETURNING created_at",
        )
        .bind(order_id.as_uuid())
        .bind(order.customer.id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let mut lines = Vec::with_capacity(order.lines.len());
        for (position, line) in order.lines.into_iter().enumerate() {
            let line_id = OrderLineId::new();
            let position = i32::try_from(position)
                .map_err(|_| StoreError::InvalidRecord("too many order lines".to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, position, product_id, quantity, price_cents)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(line_id.as_uuid())
            .bind(order_id.as_uuid())
            .bind(position)
            .bind(line.product_id.as_uuid())
            .bind(to_db_quantity(line.quantity)?)
            .bind(line.price.cents())
            .execute(&mut *tx)
            .await?;

            lines.push(OrderLine {
                id: line_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            });
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            customer: order.customer,
            lines,
            created_at,
        })
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT o.created_at, c.id, c.name, c.email
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query(
            r#"
            SELECT id, product_id, quantity, price_cents
            FROM order_lines
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Order {
            id,
            customer: Self::row_to_customer(&row)?,
            lines: lines
                .iter()
                .map(Self::row_to_line)
                .collect::<Result<Vec<_>>>()?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
