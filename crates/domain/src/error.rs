//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::placement::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request was rejected by validation.
    #[error("Order rejected: {0}")]
    Order(OrderError),

    /// A store call failed; passed through unchanged.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Returns the rejection if this is a validation failure.
    pub fn order_error(&self) -> Option<&OrderError> {
        match self {
            DomainError::Order(e) => Some(e),
            DomainError::Store(_) => None,
        }
    }
}

impl From<OrderError> for DomainError {
    fn from(e: OrderError) -> Self {
        DomainError::Order(e)
    }
}
