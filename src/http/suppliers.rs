//! Supplier endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::http::routes::AppError;

#[derive(Serialize)]
pub struct SupplierSummary {
    name: String,
    /// Products currently referencing this supplier
    products: usize,
}

#[derive(Serialize)]
pub struct SuppliersResponse {
    suppliers: Vec<SupplierSummary>,
}

pub async fn list_suppliers_handler(State(state): State<AppState>) -> Result<Json<SuppliersResponse>, AppError> {
    let mut catalog = state.catalog.lock();
    let (inventory, suppliers) = catalog.tables()?;

    let suppliers = suppliers
        .names()
        .map(|name| SupplierSummary {
            name: name.to_string(),
            products: inventory.references(name),
        })
        .collect();

    Ok(Json(SuppliersResponse { suppliers }))
}

#[derive(Deserialize)]
pub struct NewSupplierRequest {
    name: String,
}

pub async fn add_supplier_handler(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<NewSupplierRequest>, AppError>,
) -> Result<(StatusCode, Json<SupplierSummary>), AppError> {
    let record = state.catalog.lock().add_supplier(&req.name)?;

    Ok((
        StatusCode::CREATED,
        Json(SupplierSummary {
            name: record.name,
            products: 0,
        }),
    ))
}

#[derive(Deserialize)]
pub struct RenameSupplierRequest {
    new_name: String,
}

/// Outcome of a supplier change that carried into the inventory
#[derive(Serialize)]
pub struct CascadeResponse {
    supplier: String,
    products_affected: usize,
}

pub async fn rename_supplier_handler(
    State(state): State<AppState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<RenameSupplierRequest>, AppError>,
) -> Result<Json<CascadeResponse>, AppError> {
    let products_affected = state.catalog.lock().rename_supplier(&name, &req.new_name)?;

    Ok(Json(CascadeResponse {
        supplier: req.new_name.trim().to_string(),
        products_affected,
    }))
}

pub async fn delete_supplier_handler(
    State(state): State<AppState>,
    WithRejection(Path(name), _): WithRejection<Path<String>, AppError>,
) -> Result<Json<CascadeResponse>, AppError> {
    let products_affected = state.catalog.lock().delete_supplier(&name)?;

    Ok(Json(CascadeResponse {
        supplier: name,
        products_affected,
    }))
}
