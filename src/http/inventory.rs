//! Inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::routes::AppError;
use crate::store::{Product, ProductFields, SupplierFilter};

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    /// Case-insensitive substring of the product name
    #[serde(default)]
    search: Option<String>,
    /// Supplier name, or "All"
    #[serde(default)]
    supplier: Option<String>,
}

#[derive(Serialize)]
pub struct InventoryResponse {
    products: Vec<Product>,
    total_value: f64,
}

pub async fn list_inventory_handler(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryResponse>, AppError> {
    let filter: SupplierFilter = query
        .supplier
        .as_deref()
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();

    let mut catalog = state.catalog.lock();
    let inventory = catalog.inventory()?;

    let products: Vec<Product> = match query.search.as_deref().filter(|s| !s.is_empty()) {
        Some(needle) => inventory
            .search(needle)
            .filter(|p| filter.matches(&p.supplier))
            .cloned()
            .collect(),
        None => inventory.filter_by_supplier(&filter).cloned().collect(),
    };
    let total_value = products.iter().map(Product::value).sum();

    Ok(Json(InventoryResponse {
        products,
        total_value,
    }))
}

pub async fn add_product_handler(
    State(state): State<AppState>,
    WithRejection(Json(fields), _): WithRejection<Json<ProductFields>, AppError>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.catalog.lock().add_product(fields)?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product_handler(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(fields), _): WithRejection<Json<ProductFields>, AppError>,
) -> Result<Json<Product>, AppError> {
    let product = state.catalog.lock().update_product(id, fields)?;
    Ok(Json(product))
}

pub async fn delete_product_handler(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<Product>, AppError> {
    let product = state.catalog.lock().delete_product(id)?;
    Ok(Json(product))
}

#[derive(Serialize)]
pub struct AffectedResponse {
    product: String,
    affected: usize,
}

#[derive(Deserialize)]
pub struct StockUpdateRequest {
    name: String,
    quantity: u32,
}

/// Set the stock level of every product with the given name
pub async fn set_stock_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<StockUpdateRequest>, AppError>,
) -> Result<Json<AffectedResponse>, AppError> {
    let affected = state.catalog.lock().set_stock(&req.name, req.quantity)?;
    Ok(Json(AffectedResponse {
        product: req.name,
        affected,
    }))
}

pub async fn update_by_name_handler(
    State(state): State<AppState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(fields), _): WithRejection<Json<ProductFields>, AppError>,
) -> Result<Json<AffectedResponse>, AppError> {
    let affected = state.catalog.lock().update_products_named(&name, fields)?;
    Ok(Json(AffectedResponse {
        product: name,
        affected,
    }))
}

pub async fn delete_by_name_handler(
    State(state): State<AppState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, AppError>,
) -> Result<Json<AffectedResponse>, AppError> {
    let affected = state.catalog.lock().delete_products_named(&name)?;
    Ok(Json(AffectedResponse {
        product: name,
        affected,
    }))
}

/// Inventory as a CSV attachment, same layout as the backing file
pub async fn export_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let csv = state.catalog.lock().export_inventory()?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory.csv\"",
            ),
        ],
        bytes::Bytes::from(csv),
    ))
}
