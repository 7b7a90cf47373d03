//! Store error types

use std::path::PathBuf;

use uuid::Uuid;

/// Rejected input. Nothing is mutated when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Supplier '{0}' already exists or empty")]
    SupplierRejected(String),

    #[error("Supplier '{0}' does not exist")]
    UnknownSupplier(String),

    #[error("No suppliers available. Add a supplier first")]
    NoSuppliers,

    #[error("Product name must not be empty")]
    EmptyProductName,

    #[error("Price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
}

/// Errors raised by the inventory and supplier stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Product '{0}' not found")]
    ProductNotFound(String),

    #[error("Product {0} not found")]
    ProductIdNotFound(Uuid),

    #[error("Supplier '{0}' not found")]
    SupplierNotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}
