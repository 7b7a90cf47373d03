//! Supplier table

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{StoreError, ValidationError};
use super::table::TableRow;

/// One row of the supplier file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    #[serde(rename = "Supplier")]
    pub name: String,
}

impl SupplierRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TableRow for SupplierRecord {
    const HEADERS: &'static [&'static str] = &["Supplier"];
}

/// Supplier table operations. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct SupplierStore {
    suppliers: Vec<SupplierRecord>,
}

impl SupplierStore {
    /// Build from file rows, keeping the first of any repeated or blank name
    pub fn from_records(records: Vec<SupplierRecord>) -> Self {
        let mut store = Self::default();
        for record in records {
            let name = record.name.trim();
            if name.is_empty() || store.contains(name) {
                warn!(supplier = %record.name, "Skipping blank or duplicate supplier row");
                continue;
            }
            store.suppliers.push(SupplierRecord::new(name));
        }
        store
    }

    pub fn records(&self) -> &[SupplierRecord] {
        &self.suppliers
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.suppliers.iter().map(|s| s.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.suppliers.iter().any(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    pub fn add(&mut self, name: &str) -> Result<&SupplierRecord, StoreError> {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return Err(ValidationError::SupplierRejected(name.to_string()).into());
        }

        self.suppliers.push(SupplierRecord::new(name));
        Ok(&self.suppliers[self.suppliers.len() - 1])
    }

    /// Rename in place. Renaming to the current name is a no-op.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let new = new.trim();
        let index = self
            .suppliers
            .iter()
            .position(|s| s.name == old)
            .ok_or_else(|| StoreError::SupplierNotFound(old.to_string()))?;

        if new == old {
            return Ok(());
        }
        if new.is_empty() || self.contains(new) {
            return Err(ValidationError::SupplierRejected(new.to_string()).into());
        }

        self.suppliers[index].name = new.to_string();
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> Result<SupplierRecord, StoreError> {
        let index = self
            .suppliers
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| StoreError::SupplierNotFound(name.to_string()))?;
        Ok(self.suppliers.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_rejects_empty_and_duplicates() {
        let mut store = SupplierStore::default();
        store.add("Acme").unwrap();

        for name in ["", "   ", "Acme", " Acme "] {
            let err = store.add(name).unwrap_err();
            assert!(matches!(
                err,
                StoreError::Validation(ValidationError::SupplierRejected(_))
            ));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn rename_keeps_position() {
        let mut store = SupplierStore::default();
        store.add("Acme").unwrap();
        store.add("Globex").unwrap();

        store.rename("Acme", "Acme Corp").unwrap();
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Acme Corp", "Globex"]);
    }

    #[test]
    fn rename_failures() {
        let mut store = SupplierStore::default();
        store.add("Acme").unwrap();
        store.add("Globex").unwrap();

        assert!(matches!(
            store.rename("Initech", "Initrode"),
            Err(StoreError::SupplierNotFound(_))
        ));
        assert!(matches!(
            store.rename("Acme", "Globex"),
            Err(StoreError::Validation(ValidationError::SupplierRejected(_)))
        ));
        assert!(store.rename("Acme", "Acme").is_ok());
    }

    #[test]
    fn delete_removes_record() {
        let mut store = SupplierStore::default();
        store.add("Acme").unwrap();

        assert_eq!(store.delete("Acme").unwrap().name, "Acme");
        assert!(store.is_empty());
        assert!(matches!(store.delete("Acme"), Err(StoreError::SupplierNotFound(_))));
    }

    #[test]
    fn load_drops_duplicate_rows() {
        let store = SupplierStore::from_records(vec![
            SupplierRecord::new("Acme"),
            SupplierRecord::new("Acme"),
            SupplierRecord::new(""),
            SupplierRecord::new("Globex"),
        ]);
        assert_eq!(store.names().collect::<Vec<_>>(), vec!["Acme", "Globex"]);
    }
}
