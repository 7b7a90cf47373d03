//! Keeps the inventory and supplier tables consistent
//!
//! Every product written through this type references an existing supplier.
//! Supplier renames and deletes are carried into the inventory and both
//! tables are committed together.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::store::inventory::ProductRecord;
use crate::store::table::{commit_all, encode_table, fingerprint, read_table, stage_table, Fingerprint};
use crate::store::{
    InventoryStore, Product, ProductFields, ProductId, StoreError, SupplierRecord, SupplierStore,
    ValidationError,
};

/// Locations of the two backing files
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub inventory: PathBuf,
    pub suppliers: PathBuf,
}

impl CatalogPaths {
    pub fn new(dir: &Path, inventory_file: &str, supplier_file: &str) -> Self {
        Self {
            inventory: dir.join(inventory_file),
            suppliers: dir.join(supplier_file),
        }
    }
}

/// In-memory inventory and supplier tables, synced with their files
pub struct ConsistencyCoordinator {
    paths: CatalogPaths,
    inventory: InventoryStore,
    suppliers: SupplierStore,
    inventory_print: Option<Fingerprint>,
    supplier_print: Option<Fingerprint>,
    /// Set when disk state is unknown after a failed commit
    stale: bool,
}

impl ConsistencyCoordinator {
    /// Load both tables, creating the data directory if needed
    pub fn open(paths: CatalogPaths) -> Result<Self, StoreError> {
        for path in [&paths.inventory, &paths.suppliers] {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
            }
        }

        let mut coordinator = Self {
            paths,
            inventory: InventoryStore::default(),
            suppliers: SupplierStore::default(),
            inventory_print: None,
            supplier_print: None,
            stale: true,
        };
        coordinator.refresh()?;

        info!(
            products = coordinator.inventory.len(),
            suppliers = coordinator.suppliers.len(),
            "Catalog loaded"
        );
        Ok(coordinator)
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// Reload any table whose file changed since it was last read or written
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        let mut reloaded = false;

        let print = fingerprint(&self.paths.inventory)?;
        if self.stale || print != self.inventory_print {
            let records: Vec<ProductRecord> = read_table(&self.paths.inventory)?;
            self.inventory = InventoryStore::from_records(records);
            self.inventory_print = print;
            reloaded = true;
            debug!(path = %self.paths.inventory.display(), products = self.inventory.len(), "Inventory reloaded");
        }

        let print = fingerprint(&self.paths.suppliers)?;
        if self.stale || print != self.supplier_print {
            let records: Vec<SupplierRecord> = read_table(&self.paths.suppliers)?;
            self.suppliers = SupplierStore::from_records(records);
            self.supplier_print = print;
            reloaded = true;
            debug!(path = %self.paths.suppliers.display(), suppliers = self.suppliers.len(), "Suppliers reloaded");
        }

        self.stale = false;
        if reloaded {
            let orphans = find_orphans(&self.inventory, &self.suppliers).len();
            if orphans > 0 {
                warn!(orphans, "Inventory references suppliers that do not exist");
            }
        }
        Ok(())
    }

    pub fn inventory(&mut self) -> Result<&InventoryStore, StoreError> {
        self.refresh()?;
        Ok(&self.inventory)
    }

    /// Both tables, freshly synced
    pub fn tables(&mut self) -> Result<(&InventoryStore, &SupplierStore), StoreError> {
        self.refresh()?;
        Ok((&self.inventory, &self.suppliers))
    }

    /// Products whose supplier is missing from the supplier table
    pub fn orphans(&mut self) -> Result<Vec<Product>, StoreError> {
        self.refresh()?;
        Ok(find_orphans(&self.inventory, &self.suppliers)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Inventory encoded in its on-disk CSV layout
    pub fn export_inventory(&mut self) -> Result<Vec<u8>, StoreError> {
        self.refresh()?;
        encode_table(&self.inventory.to_records())
            .map_err(|e| StoreError::csv(&self.paths.inventory, e))
    }

    pub fn add_product(&mut self, fields: ProductFields) -> Result<Product, StoreError> {
        self.refresh()?;
        let fields = fields.normalized()?;
        self.check_supplier(&fields.supplier)?;

        let mut inventory = self.inventory.clone();
        let product = inventory.add(fields)?.clone();
        self.commit(Some(inventory), None)?;

        info!(product = %product.name, id = %product.id, supplier = %product.supplier, "Product added");
        Ok(product)
    }

    pub fn update_product(&mut self, id: ProductId, fields: ProductFields) -> Result<Product, StoreError> {
        self.refresh()?;
        let fields = fields.normalized()?;
        let current = self
            .inventory
            .get(id)
            .ok_or(StoreError::ProductIdNotFound(id))?;
        if current.supplier != fields.supplier {
            self.check_supplier(&fields.supplier)?;
        }

        let mut inventory = self.inventory.clone();
        let product = inventory.update_by_id(id, fields)?.clone();
        self.commit(Some(inventory), None)?;

        info!(product = %product.name, id = %id, "Product updated");
        Ok(product)
    }

    /// Rewrite every product named `name`
    pub fn update_products_named(&mut self, name: &str, fields: ProductFields) -> Result<usize, StoreError> {
        self.refresh()?;
        let fields = fields.normalized()?;
        let supplier_changes = self
            .inventory
            .products()
            .iter()
            .any(|p| p.name == name && p.supplier != fields.supplier);
        if supplier_changes {
            self.check_supplier(&fields.supplier)?;
        }

        let mut inventory = self.inventory.clone();
        let changed = inventory.update(name, fields)?;
        self.commit(Some(inventory), None)?;

        info!(product = %name, changed, "Products updated by name");
        Ok(changed)
    }

    pub fn set_stock(&mut self, name: &str, quantity: u32) -> Result<usize, StoreError> {
        self.refresh()?;
        let mut inventory = self.inventory.clone();
        let changed = inventory.set_quantity(name, quantity)?;
        self.commit(Some(inventory), None)?;

        info!(product = %name, quantity, changed, "Stock updated");
        Ok(changed)
    }

    pub fn delete_product(&mut self, id: ProductId) -> Result<Product, StoreError> {
        self.refresh()?;
        let mut inventory = self.inventory.clone();
        let removed = inventory.delete_by_id(id)?;
        self.commit(Some(inventory), None)?;

        info!(product = %removed.name, id = %id, "Product deleted");
        Ok(removed)
    }

    pub fn delete_products_named(&mut self, name: &str) -> Result<usize, StoreError> {
        self.refresh()?;
        let mut inventory = self.inventory.clone();
        let removed = inventory.delete(name)?;
        self.commit(Some(inventory), None)?;

        info!(product = %name, removed, "Products deleted by name");
        Ok(removed)
    }

    pub fn add_supplier(&mut self, name: &str) -> Result<SupplierRecord, StoreError> {
        self.refresh()?;
        let mut suppliers = self.suppliers.clone();
        let record = suppliers.add(name)?.clone();
        self.commit(None, Some(suppliers))?;

        info!(supplier = %record.name, "Supplier added");
        Ok(record)
    }

    /// Rename a supplier and repoint its products. Returns the number of products rewritten.
    pub fn rename_supplier(&mut self, old: &str, new: &str) -> Result<usize, StoreError> {
        self.refresh()?;
        let new = new.trim();

        let mut suppliers = self.suppliers.clone();
        suppliers.rename(old, new)?;
        if old == new {
            return Ok(0);
        }

        let mut inventory = self.inventory.clone();
        let changed = inventory.reassign_supplier(old, new);
        let inventory = (changed > 0).then_some(inventory);
        self.commit(inventory, Some(suppliers))?;

        info!(old = %old, new = %new, products = changed, "Supplier renamed");
        Ok(changed)
    }

    /// Delete a supplier and every product it supplies. Returns the number of products removed.
    pub fn delete_supplier(&mut self, name: &str) -> Result<usize, StoreError> {
        self.refresh()?;
        let mut suppliers = self.suppliers.clone();
        suppliers.delete(name)?;

        let mut inventory = self.inventory.clone();
        let removed = inventory.remove_supplier(name);
        let inventory = (removed > 0).then_some(inventory);
        self.commit(inventory, Some(suppliers))?;

        info!(supplier = %name, products = removed, "Supplier deleted");
        Ok(removed)
    }

    fn check_supplier(&self, supplier: &str) -> Result<(), ValidationError> {
        if self.suppliers.is_empty() {
            return Err(ValidationError::NoSuppliers);
        }
        if !self.suppliers.contains(supplier) {
            return Err(ValidationError::UnknownSupplier(supplier.to_string()));
        }
        Ok(())
    }

    /// Write the given tables and adopt them in memory
    ///
    /// Both tables are staged before either is moved into place. If anything
    /// fails the in-memory tables are left as they were and the next refresh
    /// rereads both files.
    fn commit(
        &mut self,
        inventory: Option<InventoryStore>,
        suppliers: Option<SupplierStore>,
    ) -> Result<(), StoreError> {
        let mut staged = Vec::with_capacity(2);
        if let Some(inventory) = &inventory {
            staged.push(stage_table(&self.paths.inventory, &inventory.to_records())?);
        }
        if let Some(suppliers) = &suppliers {
            staged.push(stage_table(&self.paths.suppliers, suppliers.records())?);
        }

        if let Err(e) = commit_all(staged) {
            self.stale = true;
            return Err(e);
        }

        if let Some(inventory) = inventory {
            self.inventory = inventory;
            let path = self.paths.inventory.clone();
            self.inventory_print = self.fingerprint_after_write(&path);
        }
        if let Some(suppliers) = suppliers {
            self.suppliers = suppliers;
            let path = self.paths.suppliers.clone();
            self.supplier_print = self.fingerprint_after_write(&path);
        }
        Ok(())
    }

    fn fingerprint_after_write(&mut self, path: &Path) -> Option<Fingerprint> {
        fingerprint(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Could not fingerprint written table");
            self.stale = true;
            None
        })
    }
}

/// Products with a supplier that is missing from `suppliers`
pub fn find_orphans<'a>(inventory: &'a InventoryStore, suppliers: &SupplierStore) -> Vec<&'a Product> {
    inventory
        .products()
        .iter()
        .filter(|p| !p.supplier.is_empty() && !suppliers.contains(&p.supplier))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn open(dir: &TempDir) -> ConsistencyCoordinator {
        ConsistencyCoordinator::open(CatalogPaths::new(dir.path(), "inventory.csv", "suppliers.csv"))
            .unwrap()
    }

    fn seeded() -> (TempDir, ConsistencyCoordinator) {
        let dir = tempdir().unwrap();
        let mut catalog = open(&dir);
        catalog.add_supplier("Acme").unwrap();
        catalog.add_supplier("Globex").unwrap();
        catalog
            .add_product(ProductFields::new("Bolt-M4", 100, 0.25, "Acme"))
            .unwrap();
        catalog
            .add_product(ProductFields::new("Nut-M4", 80, 0.10, "Acme"))
            .unwrap();
        catalog
            .add_product(ProductFields::new("Spring", 12, 1.75, "Globex"))
            .unwrap();
        (dir, catalog)
    }

    #[test]
    fn rename_repoints_every_product() {
        let (dir, mut catalog) = seeded();

        let changed = catalog.rename_supplier("Acme", "Acme Corp").unwrap();
        assert_eq!(changed, 2);

        let inventory = catalog.inventory().unwrap();
        assert_eq!(inventory.references("Acme"), 0);
        assert_eq!(inventory.references("Acme Corp"), 2);

        let mut reopened = open(&dir);
        assert_eq!(reopened.inventory().unwrap().references("Acme Corp"), 2);
        let (_, suppliers) = reopened.tables().unwrap();
        assert!(suppliers.contains("Acme Corp"));
        assert!(!suppliers.contains("Acme"));
    }

    #[test]
    fn delete_cascades_to_products() {
        let (dir, mut catalog) = seeded();

        assert_eq!(catalog.delete_supplier("Acme").unwrap(), 2);
        assert_eq!(catalog.inventory().unwrap().references("Acme"), 0);
        assert_eq!(catalog.inventory().unwrap().len(), 1);

        let mut reopened = open(&dir);
        assert_eq!(reopened.inventory().unwrap().len(), 1);
        assert!(reopened.orphans().unwrap().is_empty());
    }

    #[test]
    fn delete_unused_supplier_leaves_inventory_file_alone() {
        let (dir, mut catalog) = seeded();
        catalog.add_supplier("Initech").unwrap();
        let before = std::fs::read(dir.path().join("inventory.csv")).unwrap();

        assert_eq!(catalog.delete_supplier("Initech").unwrap(), 0);

        let after = std::fs::read(dir.path().join("inventory.csv")).unwrap();
        assert_eq!(before, after);
        assert_eq!(catalog.inventory().unwrap().len(), 3);
    }

    #[test]
    fn add_with_unknown_supplier_is_rejected() {
        let (_dir, mut catalog) = seeded();
        let before = catalog.inventory().unwrap().to_records();

        let err = catalog
            .add_product(ProductFields::new("Widget", 1, 1.0, "Nobody"))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::UnknownSupplier(ref s)) if s == "Nobody"
        ));
        assert_eq!(catalog.inventory().unwrap().to_records(), before);
    }

    #[test]
    fn add_without_any_supplier_is_rejected() {
        let dir = tempdir().unwrap();
        let mut catalog = open(&dir);

        let err = catalog
            .add_product(ProductFields::new("Widget", 1, 1.0, "Acme"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::NoSuppliers)));
        assert!(!dir.path().join("inventory.csv").exists());
    }

    #[test]
    fn add_raises_total_value() {
        let (_dir, mut catalog) = seeded();
        let before = catalog.inventory().unwrap().total_value();

        catalog
            .add_product(ProductFields::new("Widget", 3, 10.50, "Acme"))
            .unwrap();

        let after = catalog.inventory().unwrap().total_value();
        assert!((after - before - 31.50).abs() < 1e-9);
    }

    #[test]
    fn update_to_unknown_supplier_is_rejected() {
        let (_dir, mut catalog) = seeded();
        let id = catalog.inventory().unwrap().products()[0].id;

        let err = catalog
            .update_product(id, ProductFields::new("Bolt-M4", 1, 0.25, "Nobody"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::UnknownSupplier(_))));

        let updated = catalog
            .update_product(id, ProductFields::new("Bolt-M5", 90, 0.30, "Globex"))
            .unwrap();
        assert_eq!(updated.id, id);
        assert_eq!(updated.supplier, "Globex");
    }

    #[test]
    fn stock_and_name_operations_persist() {
        let (dir, mut catalog) = seeded();

        assert_eq!(catalog.set_stock("Spring", 3).unwrap(), 1);
        assert_eq!(
            catalog
                .update_products_named("Nut-M4", ProductFields::new("Nut-M5", 5, 0.12, "Acme"))
                .unwrap(),
            1
        );
        assert_eq!(catalog.delete_products_named("Bolt-M4").unwrap(), 1);

        let mut reopened = open(&dir);
        let names: Vec<_> = reopened
            .inventory()
            .unwrap()
            .products()
            .iter()
            .map(|p| (p.name.clone(), p.quantity))
            .collect();
        assert_eq!(names, vec![("Nut-M5".to_string(), 5), ("Spring".to_string(), 3)]);
    }

    #[test]
    fn tables_round_trip_through_files() {
        let (dir, mut catalog) = seeded();
        let records = catalog.inventory().unwrap().to_records();

        let mut reopened = open(&dir);
        let (inventory, suppliers) = reopened.tables().unwrap();
        assert_eq!(inventory.to_records(), records);
        assert_eq!(suppliers.names().collect::<Vec<_>>(), vec!["Acme", "Globex"]);
    }

    #[test]
    fn padded_supplier_fields_still_match() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("inventory.csv"),
            "Product,Quantity,Price,Supplier\nWidget,3,10.5, Acme\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("suppliers.csv"), "Supplier\n Acme\n").unwrap();

        let mut catalog = open(&dir);
        assert!(catalog.orphans().unwrap().is_empty());

        assert_eq!(catalog.delete_supplier("Acme").unwrap(), 1);
        assert_eq!(catalog.inventory().unwrap().len(), 0);
    }

    #[test]
    fn failed_commit_keeps_memory_and_rereads_both_files() {
        let (dir, mut catalog) = seeded();
        let suppliers_path = dir.path().join("suppliers.csv");

        // The supplier rename lands on a non-empty directory and fails
        let blocked = dir.path().join("blocked");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"x").unwrap();
        catalog.paths.suppliers = blocked;

        let mut inventory = catalog.inventory.clone();
        inventory.remove_supplier("Acme");
        let mut suppliers = catalog.suppliers.clone();
        suppliers.delete("Acme").unwrap();

        let err = catalog.commit(Some(inventory), Some(suppliers)).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(catalog.stale);
        assert_eq!(catalog.inventory.len(), 3);
        assert!(catalog.suppliers.contains("Acme"));

        // Inventory was renamed first, so disk holds the new inventory and the old suppliers
        catalog.paths.suppliers = suppliers_path;
        catalog.refresh().unwrap();
        assert!(!catalog.stale);
        let (inventory, suppliers) = catalog.tables().unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.references("Acme"), 0);
        assert!(suppliers.contains("Acme"));
    }

    #[test]
    fn failed_staging_leaves_files_and_memory_untouched() {
        let (dir, mut catalog) = seeded();
        let inventory_path = dir.path().join("inventory.csv");
        let before = std::fs::read(&inventory_path).unwrap();
        let suppliers_path = catalog.paths.suppliers.clone();
        catalog.paths.suppliers = dir.path().join("missing").join("suppliers.csv");

        let mut inventory = catalog.inventory.clone();
        inventory.remove_supplier("Acme");
        let mut suppliers = catalog.suppliers.clone();
        suppliers.delete("Acme").unwrap();

        assert!(catalog.commit(Some(inventory), Some(suppliers)).is_err());
        assert!(!catalog.stale);
        assert_eq!(catalog.inventory.len(), 3);
        assert_eq!(std::fs::read(&inventory_path).unwrap(), before);

        catalog.paths.suppliers = suppliers_path;
        assert_eq!(catalog.inventory().unwrap().len(), 3);
    }

    #[test]
    fn external_edit_is_picked_up() {
        let (dir, mut catalog) = seeded();
        std::fs::write(
            dir.path().join("inventory.csv"),
            "Product,Quantity,Price,Supplier\nHammer,2,15.0,Acme\nSaw,1,22.5,Hooli\n",
        )
        .unwrap();

        let inventory = catalog.inventory().unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.products()[0].name, "Hammer");

        let orphans = catalog.orphans().unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].supplier, "Hooli");
    }

    #[test]
    fn legacy_inventory_without_supplier_column_loads() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("inventory.csv"),
            "Product,Quantity,Price\nPen,10,1.5\n",
        )
        .unwrap();

        let mut catalog = open(&dir);
        let inventory = catalog.inventory().unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory.products()[0].supplier, "");
        assert!(catalog.orphans().unwrap().is_empty());

        assert_eq!(catalog.set_stock("Pen", 4).unwrap(), 1);
    }

    #[test]
    fn export_matches_file_layout() {
        let (_dir, mut catalog) = seeded();
        let csv = String::from_utf8(catalog.export_inventory().unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("Product,Quantity,Price,Supplier"));
        assert_eq!(lines.next(), Some("Bolt-M4,100,0.25,Acme"));
        assert_eq!(lines.count(), 2);
    }
}
