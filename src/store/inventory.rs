//! Product inventory table

use std::collections::HashSet;
use std::convert::Infallible;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::error::{StoreError, ValidationError};
use super::table::TableRow;

/// Synthetic per-record identifier. Never persisted.
pub type ProductId = Uuid;

/// One row of the inventory file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Product")]
    pub name: String,
    #[serde(rename = "Quantity", deserialize_with = "whole_quantity")]
    pub quantity: u32,
    #[serde(rename = "Price")]
    pub price: f64,
    /// Files written before suppliers existed have no such column
    #[serde(rename = "Supplier", default)]
    pub supplier: String,
}

/// Accepts `3` as well as `3.0`; spreadsheet exports write counts as floats
fn whole_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(D::Error::custom(format!(
            "quantity must be a whole non-negative number, got {value}"
        )))
    }
}

impl TableRow for ProductRecord {
    const HEADERS: &'static [&'static str] = &["Product", "Quantity", "Price", "Supplier"];
}

/// Product held in memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub supplier: String,
}

impl Product {
    /// Stock value of this record (quantity x price)
    pub fn value(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }

    fn from_record(record: ProductRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: record.name.trim().to_string(),
            quantity: record.quantity,
            price: record.price,
            supplier: record.supplier.trim().to_string(),
        }
    }

    fn to_record(&self) -> ProductRecord {
        ProductRecord {
            name: self.name.clone(),
            quantity: self.quantity,
            price: self.price,
            supplier: self.supplier.clone(),
        }
    }

    fn apply(&mut self, fields: &ProductFields) {
        self.name = fields.name.clone();
        self.quantity = fields.quantity;
        self.price = fields.price;
        self.supplier = fields.supplier.clone();
    }
}

/// User-supplied values for a new or rewritten product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(default)]
    pub supplier: String,
}

impl ProductFields {
    pub fn new(name: impl Into<String>, quantity: u32, price: f64, supplier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
            supplier: supplier.into(),
        }
    }

    /// Trim text fields and check name and price
    pub fn normalized(&self) -> Result<Self, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProductName);
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::InvalidPrice(self.price));
        }

        Ok(Self {
            name: name.to_string(),
            quantity: self.quantity,
            price: self.price,
            supplier: self.supplier.trim().to_string(),
        })
    }
}

/// Supplier selector for inventory views
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SupplierFilter {
    #[default]
    All,
    Named(String),
}

impl SupplierFilter {
    pub fn matches(&self, supplier: &str) -> bool {
        match self {
            SupplierFilter::All => true,
            SupplierFilter::Named(name) => name == supplier,
        }
    }
}

impl FromStr for SupplierFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "All" {
            Ok(SupplierFilter::All)
        } else {
            Ok(SupplierFilter::Named(s.to_string()))
        }
    }
}

/// Lazy case-insensitive name search. Clone it to iterate again.
#[derive(Debug, Clone)]
pub struct Search<'a> {
    products: std::slice::Iter<'a, Product>,
    needle: String,
}

impl<'a> Iterator for Search<'a> {
    type Item = &'a Product;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.products
            .find(|p| p.name.to_lowercase().contains(needle.as_str()))
    }
}

/// Inventory table operations
#[derive(Debug, Clone, Default)]
pub struct InventoryStore {
    products: Vec<Product>,
}

impl InventoryStore {
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        Self {
            products: records.into_iter().map(Product::from_record).collect(),
        }
    }

    pub fn to_records(&self) -> Vec<ProductRecord> {
        self.products.iter().map(Product::to_record).collect()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Append a product. Duplicate names are allowed.
    pub fn add(&mut self, fields: ProductFields) -> Result<&Product, StoreError> {
        let fields = fields.normalized()?;
        self.products.push(Product {
            id: Uuid::new_v4(),
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            supplier: fields.supplier,
        });

        Ok(&self.products[self.products.len() - 1])
    }

    /// Rewrite every product named `name`; returns how many changed
    pub fn update(&mut self, name: &str, fields: ProductFields) -> Result<usize, StoreError> {
        let fields = fields.normalized()?;
        let mut changed = 0;
        for product in self.products.iter_mut().filter(|p| p.name == name) {
            product.apply(&fields);
            changed += 1;
        }

        if changed == 0 {
            return Err(StoreError::ProductNotFound(name.to_string()));
        }
        Ok(changed)
    }

    pub fn update_by_id(&mut self, id: ProductId, fields: ProductFields) -> Result<&Product, StoreError> {
        let fields = fields.normalized()?;
        let product = self
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::ProductIdNotFound(id))?;
        product.apply(&fields);
        Ok(product)
    }

    /// Set stock level of every product named `name`
    pub fn set_quantity(&mut self, name: &str, quantity: u32) -> Result<usize, StoreError> {
        let mut changed = 0;
        for product in self.products.iter_mut().filter(|p| p.name == name) {
            product.quantity = quantity;
            changed += 1;
        }

        if changed == 0 {
            return Err(StoreError::ProductNotFound(name.to_string()));
        }
        Ok(changed)
    }

    /// Remove every product named `name`
    pub fn delete(&mut self, name: &str) -> Result<usize, StoreError> {
        let before = self.products.len();
        self.products.retain(|p| p.name != name);

        match before - self.products.len() {
            0 => Err(StoreError::ProductNotFound(name.to_string())),
            removed => Ok(removed),
        }
    }

    pub fn delete_by_id(&mut self, id: ProductId) -> Result<Product, StoreError> {
        let index = self
            .products
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::ProductIdNotFound(id))?;
        Ok(self.products.remove(index))
    }

    pub fn search(&self, substring: &str) -> Search<'_> {
        Search {
            products: self.products.iter(),
            needle: substring.to_lowercase(),
        }
    }

    pub fn filter_by_supplier<'a>(
        &'a self,
        filter: &'a SupplierFilter,
    ) -> impl Iterator<Item = &'a Product> + 'a {
        self.products.iter().filter(move |p| filter.matches(&p.supplier))
    }

    pub fn total_value(&self) -> f64 {
        self.products.iter().map(Product::value).sum()
    }

    pub fn total_stock(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.quantity)).sum()
    }

    /// Number of distinct product names
    pub fn distinct_names(&self) -> usize {
        self.products
            .iter()
            .map(|p| p.name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of products referencing `supplier`
    pub fn references(&self, supplier: &str) -> usize {
        self.products.iter().filter(|p| p.supplier == supplier).count()
    }

    /// Point every product of supplier `old` at `new`
    pub fn reassign_supplier(&mut self, old: &str, new: &str) -> usize {
        let mut changed = 0;
        for product in self.products.iter_mut().filter(|p| p.supplier == old) {
            product.supplier = new.to_string();
            changed += 1;
        }
        changed
    }

    /// Drop every product of `supplier`
    pub fn remove_supplier(&mut self, supplier: &str) -> usize {
        let before = self.products.len();
        self.products.retain(|p| p.supplier != supplier);
        before - self.products.len()
    }
}
