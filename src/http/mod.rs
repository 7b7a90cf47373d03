//! HTTP layer

pub mod inventory;
pub mod middleware;
pub mod routes;
pub mod suppliers;

pub use routes::build_router;
