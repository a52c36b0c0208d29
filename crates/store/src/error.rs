use common::ProductId;
use thiserror::Error;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A guarded stock update found a different quantity than expected.
    /// No update in the batch was applied.
    #[error(
        "Stock conflict for product {product_id}: expected quantity {expected}, found {actual}"
    )]
    StockConflict {
        product_id: ProductId,
        expected: u32,
        actual: u32,
    },

    /// A stock update targeted a product that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A stored row could not be mapped to a record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
