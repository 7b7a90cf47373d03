//! Inventory catalog: the two tables and the rules that bind them

pub mod coordinator;
pub mod metrics;

pub use coordinator::{CatalogPaths, ConsistencyCoordinator};
pub use metrics::DashboardMetrics;
