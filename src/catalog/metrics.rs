//! Dashboard metrics

use std::collections::HashMap;

use serde::Serialize;

use super::coordinator::find_orphans;
use crate::store::{InventoryStore, Product, SupplierStore};

/// Stock value of all records sharing a product name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockValue {
    pub product: String,
    pub value: f64,
}

/// Summary figures for the dashboard view
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    /// Distinct product names
    pub total_products: usize,
    pub total_stock: u64,
    pub total_value: f64,
    pub supplier_count: usize,
    /// Per-product share of stock value, in first-seen order
    pub stock_value: Vec<StockValue>,
    /// Products at or below the low-stock threshold
    pub low_stock: Vec<Product>,
    pub orphaned_products: usize,
}

impl DashboardMetrics {
    pub fn compute(inventory: &InventoryStore, suppliers: &SupplierStore, low_stock_threshold: u32) -> Self {
        let mut stock_value: Vec<StockValue> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for product in inventory.products() {
            let existing = index.get(product.name.as_str()).copied();
            match existing {
                Some(i) => stock_value[i].value += product.value(),
                None => {
                    index.insert(&product.name, stock_value.len());
                    stock_value.push(StockValue {
                        product: product.name.clone(),
                        value: product.value(),
                    });
                }
            }
        }

        let low_stock = inventory
            .products()
            .iter()
            .filter(|p| p.quantity <= low_stock_threshold)
            .cloned()
            .collect();

        Self {
            total_products: inventory.distinct_names(),
            total_stock: inventory.total_stock(),
            total_value: inventory.total_value(),
            supplier_count: suppliers.len(),
            stock_value,
            low_stock,
            orphaned_products: find_orphans(inventory, suppliers).len(),
        }
    }
}
