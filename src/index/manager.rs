//! Caches one live index handle per `(table, column)` pair so repeated
//! lookups reuse the same open structure instead of reopening it from disk
//! every time, mirroring the original engine's `get_index` factory+cache.

use crate::error::Result;
use crate::index::avl::AvlIndex;
use crate::index::bplus::BPlusIndex;
use crate::index::ehash::HashIndex;
use crate::index::isam::IsamIndex;
use crate::index::noindex::NoIndex;
use crate::index::rtree::RTreeIndex;
use crate::index::{Bound, Index};
use crate::storage::RecordFile;
use crate::types::{Column, IndexKind, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A concrete index structure, dispatched to uniformly through [`Index`].
pub enum IndexHandle {
    None(NoIndex),
    Avl(AvlIndex),
    Isam(IsamIndex),
    Hash(HashIndex),
    BPlusTree(BPlusIndex),
    RTree(RTreeIndex),
}

impl IndexHandle {
    /// Bulk-builds an ISAM index from the table's existing contents.
    /// No-op for every other index kind (they build incrementally via `insert`).
    pub fn build_isam(&mut self, pairs: Vec<(Value, i64)>) -> Result<()> {
        if let IndexHandle::Isam(isam) = self {
            isam.build(pairs)?;
        }
        Ok(())
    }
}

impl Index for IndexHandle {
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()> {
        match self {
            IndexHandle::None(i) => i.insert(slot, key),
            IndexHandle::Avl(i) => i.insert(slot, key),
            IndexHandle::Isam(i) => i.insert(slot, key),
            IndexHandle::Hash(i) => i.insert(slot, key),
            IndexHandle::BPlusTree(i) => i.insert(slot, key),
            IndexHandle::RTree(i) => i.insert(slot, key),
        }
    }

    fn delete(&mut self, key: &Value) -> Result<()> {
        match self {
            IndexHandle::None(i) => i.delete(key),
            IndexHandle::Avl(i) => i.delete(key),
            IndexHandle::Isam(i) => i.delete(key),
            IndexHandle::Hash(i) => i.delete(key),
            IndexHandle::BPlusTree(i) => i.delete(key),
            IndexHandle::RTree(i) => i.delete(key),
        }
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        match self {
            IndexHandle::None(i) => i.search(key),
            IndexHandle::Avl(i) => i.search(key),
            IndexHandle::Isam(i) => i.search(key),
            IndexHandle::Hash(i) => i.search(key),
            IndexHandle::BPlusTree(i) => i.search(key),
            IndexHandle::RTree(i) => i.search(key),
        }
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        match self {
            IndexHandle::None(i) => i.range_search(lo, hi),
            IndexHandle::Avl(i) => i.range_search(lo, hi),
            IndexHandle::Isam(i) => i.range_search(lo, hi),
            IndexHandle::Hash(i) => i.range_search(lo, hi),
            IndexHandle::BPlusTree(i) => i.range_search(lo, hi),
            IndexHandle::RTree(i) => i.range_search(lo, hi),
        }
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        match self {
            IndexHandle::None(i) => i.get_all(),
            IndexHandle::Avl(i) => i.get_all(),
            IndexHandle::Isam(i) => i.get_all(),
            IndexHandle::Hash(i) => i.get_all(),
            IndexHandle::BPlusTree(i) => i.get_all(),
            IndexHandle::RTree(i) => i.get_all(),
        }
    }

    fn clear(&mut self) -> Result<()> {
        match self {
            IndexHandle::None(i) => i.clear(),
            IndexHandle::Avl(i) => i.clear(),
            IndexHandle::Isam(i) => i.clear(),
            IndexHandle::Hash(i) => i.clear(),
            IndexHandle::BPlusTree(i) => i.clear(),
            IndexHandle::RTree(i) => i.clear(),
        }
    }

    fn range_search_rect(&mut self, rect: (f64, f64, f64, f64)) -> Result<Vec<i64>> {
        match self {
            IndexHandle::RTree(i) => i.range_search_rect(rect),
            _ => Err(crate::error::StorageError::DomainError(
                "this index does not support rectangle queries".into(),
            )),
        }
    }

    fn range_search_circle(&mut self, circle: (f64, f64, f64)) -> Result<Vec<i64>> {
        match self {
            IndexHandle::RTree(i) => i.range_search_circle(circle),
            _ => Err(crate::error::StorageError::DomainError(
                "this index does not support circle queries".into(),
            )),
        }
    }

    fn knn_search(&mut self, x: f64, y: f64, k: usize) -> Result<Vec<i64>> {
        match self {
            IndexHandle::RTree(i) => i.knn_search(x, y, k),
            _ => Err(crate::error::StorageError::DomainError(
                "this index does not support KNN queries".into(),
            )),
        }
    }
}

/// Opens and caches one [`IndexHandle`] per `(table, column)` pair.
pub struct IndexManager {
    base_dir: PathBuf,
    cache: HashMap<String, IndexHandle>,
}

impl IndexManager {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self { base_dir: base_dir.as_ref().to_path_buf(), cache: HashMap::new() }
    }

    fn cache_key(table: &str, column: &str) -> String {
        format!("{}.{}", table, column)
    }

    /// Returns the handle for `table.column`, opening it from disk on first
    /// use. `record_file` is only consulted when the column has no index
    /// structure of its own (a [`NoIndex`] full-table-scan fallback).
    pub fn get(
        &mut self,
        table: &str,
        column: &Column,
        column_index: usize,
        record_file: Rc<RefCell<RecordFile>>,
    ) -> Result<&mut IndexHandle> {
        let key = Self::cache_key(table, &column.name);
        if !self.cache.contains_key(&key) {
            let handle = self.open(table, column, column_index, record_file)?;
            self.cache.insert(key.clone(), handle);
        }
        Ok(self.cache.get_mut(&key).unwrap())
    }

    fn path_for(&self, table: &str, column: &str) -> PathBuf {
        self.base_dir.join(table).join(format!("{}.idx", column))
    }

    fn open(
        &self,
        table: &str,
        column: &Column,
        column_index: usize,
        record_file: Rc<RefCell<RecordFile>>,
    ) -> Result<IndexHandle> {
        let path = self.path_for(table, &column.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(match column.index_kind {
            IndexKind::None => IndexHandle::None(NoIndex::new(record_file, column_index, column.data_type)),
            IndexKind::Avl => IndexHandle::Avl(AvlIndex::open(path, column.data_type)?),
            IndexKind::Isam => IndexHandle::Isam(IsamIndex::open(path, column.data_type)?),
            IndexKind::Hash => IndexHandle::Hash(HashIndex::open(path, column.data_type)?),
            IndexKind::BPlusTree => IndexHandle::BPlusTree(BPlusIndex::open(path, column.data_type)?),
            IndexKind::RTree => IndexHandle::RTree(RTreeIndex::open(path, column.data_type)?),
        })
    }

    /// Evicts a single column's cached handle, e.g. after `DROP INDEX`.
    pub fn invalidate(&mut self, table: &str, column: &str) {
        self.cache.remove(&Self::cache_key(table, column));
    }

    /// Evicts every cached handle belonging to `table`, e.g. after `DROP TABLE`.
    pub fn invalidate_table(&mut self, table: &str) {
        let prefix = format!("{}.", table);
        self.cache.retain(|k, _| !k.starts_with(&prefix));
    }
}
