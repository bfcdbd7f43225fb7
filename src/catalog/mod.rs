//! Table lifecycle and schema persistence.
//!
//! Filesystem layout, one directory per table under the engine's base
//! directory:
//!
//! ```text
//! <base>/<table>/metadata.dat   -- bincode-serialized TableSchema
//! <base>/<table>/<table>.dat    -- heap file (crate::storage::RecordFile)
//! <base>/<table>/<column>.idx   -- one index file per column
//! ```
//!
//! This supersedes a single shared catalog file: each table's metadata
//! lives next to its own data, so `DROP TABLE` is one `remove_dir_all`.

use crate::error::{Result, StorageError};
use crate::index::manager::IndexManager;
use crate::storage::RecordFile;
use crate::types::TableSchema;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

struct OpenTable {
    schema: TableSchema,
    record_file: Rc<RefCell<RecordFile>>,
}

/// Owns every open table's schema, heap file, and index handles.
pub struct Catalog {
    base_dir: PathBuf,
    tables: HashMap<String, OpenTable>,
    index_mgr: IndexManager,
}

impl Catalog {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        let mut catalog = Self { index_mgr: IndexManager::new(&base_dir), base_dir, tables: HashMap::new() };
        catalog.load_existing_tables()?;
        Ok(catalog)
    }

    fn load_existing_tables(&mut self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.metadata_path(&name).exists() {
                self.open_table(&name)?;
            }
        }
        Ok(())
    }

    fn table_dir(&self, table: &str) -> PathBuf {
        self.base_dir.join(table)
    }

    fn metadata_path(&self, table: &str) -> PathBuf {
        self.table_dir(table).join("metadata.dat")
    }

    fn heap_path(&self, table: &str) -> PathBuf {
        self.table_dir(table).join(format!("{}.dat", table))
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table) || self.metadata_path(table).exists()
    }

    pub fn schema(&self, table: &str) -> Result<&TableSchema> {
        Ok(&self.table(table)?.schema)
    }

    pub fn record_file(&mut self, table: &str) -> Result<Rc<RefCell<RecordFile>>> {
        Ok(self.table(table)?.record_file.clone())
    }

    pub fn index_manager(&mut self) -> &mut IndexManager {
        &mut self.index_mgr
    }

    fn table(&self, table: &str) -> Result<&OpenTable> {
        self.tables.get(table).ok_or_else(|| StorageError::TableNotFound(table.to_string()))
    }

    fn open_table(&mut self, table: &str) -> Result<()> {
        if self.tables.contains_key(table) {
            return Ok(());
        }
        let bytes = std::fs::read(self.metadata_path(table))?;
        let schema: TableSchema = bincode::deserialize(&bytes)?;
        let record_file = Rc::new(RefCell::new(RecordFile::open(self.heap_path(table), schema.clone())?));
        self.tables.insert(table.to_string(), OpenTable { schema, record_file });
        Ok(())
    }

    /// Creates a new table's directory, writes its schema, and registers it
    /// as open. Returns an error unless the caller has already checked
    /// `if_not_exists`/existence per the statement's semantics.
    pub fn create_table(&mut self, schema: TableSchema) -> Result<()> {
        let table = schema.table_name.clone();
        if self.table_exists(&table) {
            return Err(StorageError::TableAlreadyExists(table));
        }
        std::fs::create_dir_all(self.table_dir(&table))?;
        self.write_schema(&schema)?;
        let record_file = Rc::new(RefCell::new(RecordFile::open(self.heap_path(&table), schema.clone())?));
        self.tables.insert(table, OpenTable { schema, record_file });
        Ok(())
    }

    fn write_schema(&self, schema: &TableSchema) -> Result<()> {
        let bytes = bincode::serialize(schema)?;
        std::fs::write(self.metadata_path(&schema.table_name), bytes)?;
        Ok(())
    }

    /// Persists an updated schema (e.g. after `CREATE INDEX`/`DROP INDEX`
    /// flips a column's `index_kind`) for an already-open table.
    pub fn update_schema(&mut self, table: &str, schema: TableSchema) -> Result<()> {
        self.write_schema(&schema)?;
        let entry = self.tables.get_mut(table).ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        entry.schema = schema;
        Ok(())
    }

    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        if !self.table_exists(table) {
            return Err(StorageError::TableNotFound(table.to_string()));
        }
        self.tables.remove(table);
        self.index_mgr.invalidate_table(table);
        let dir = self.table_dir(table);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType};

    #[test]
    fn create_persists_schema_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cat = Catalog::new(dir.path()).unwrap();
            let schema = TableSchema::new("t", vec![Column::new("id", DataType::Int)]);
            cat.create_table(schema).unwrap();
        }
        let cat = Catalog::new(dir.path()).unwrap();
        assert!(cat.table_exists("t"));
        assert_eq!(cat.schema("t").unwrap().columns.len(), 1);
    }

    #[test]
    fn drop_table_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = Catalog::new(dir.path()).unwrap();
        let schema = TableSchema::new("t", vec![Column::new("id", DataType::Int)]);
        cat.create_table(schema).unwrap();
        cat.drop_table("t").unwrap();
        assert!(!cat.table_exists("t"));
        assert!(!dir.path().join("t").exists());
    }

    #[test]
    fn create_table_twice_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut cat = Catalog::new(dir.path()).unwrap();
        let schema = TableSchema::new("t", vec![Column::new("id", DataType::Int)]);
        cat.create_table(schema.clone()).unwrap();
        assert!(cat.create_table(schema).is_err());
    }
}
