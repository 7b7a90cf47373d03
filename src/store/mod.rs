//! CSV-backed data stores

pub mod error;
pub mod inventory;
pub mod suppliers;
pub mod table;

pub use error::{StoreError, ValidationError};
pub use inventory::{InventoryStore, Product, ProductFields, ProductId, SupplierFilter};
pub use suppliers::{SupplierRecord, SupplierStore};
