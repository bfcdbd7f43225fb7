//! Pluggable single-column index structures.
//!
//! Every index type implements the same contract ([`Index`]) so the query
//! executor ([`crate::query`]) can treat them interchangeably. Indexes never
//! own the heap file; they map a column value to the [`crate::storage::RecordFile`]
//! slot id(s) that hold it.

pub mod avl;
pub mod bplus;
pub mod ehash;
pub mod isam;
pub mod manager;
pub mod noindex;
pub mod rtree;

pub use manager::IndexHandle;

use crate::error::Result;
use crate::types::Value;

/// Inclusive range bound for [`Index::range_search`]. `None` means "open",
/// i.e. replaced internally by the column's type-appropriate sentinel.
pub type Bound = Option<Value>;

/// Common contract implemented by every index structure.
///
/// `insert`/`delete` operate on a single `(slot, key)` pair; callers are
/// responsible for driving these across every column of a record, since in
/// this engine every column always has an index handle (possibly a
/// [`noindex::NoIndex`] full-scan fallback).
pub trait Index {
    /// Associates `slot` with `key`.
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()>;

    /// Removes the association for `key`. For indexes that key on value
    /// rather than slot (AVL, B+Tree, ISAM, Hash) this removes the first
    /// match; R-tree and No-index key on the fully-qualified `(key, slot)`
    /// pair internally and so this only needs `key`.
    fn delete(&mut self, key: &Value) -> Result<()>;

    /// Exact match: every slot whose indexed value equals `key`.
    fn search(&mut self, key: &Value) -> Result<Vec<i64>>;

    /// Inclusive range scan; `None` bounds are replaced by the column's
    /// min/max sentinel.
    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>>;

    /// All slots currently indexed, for bulk load / integrity checks.
    fn get_all(&mut self) -> Result<Vec<i64>>;

    /// Drops the index's backing storage entirely (used by `DROP INDEX`
    /// and as the first step of a rebuild).
    fn clear(&mut self) -> Result<()>;

    /// Spatial range search over a rectangle. Only meaningful for R-tree
    /// indexes over a `Point` column; other indexes return a domain error.
    fn range_search_rect(&mut self, _rect: (f64, f64, f64, f64)) -> Result<Vec<i64>> {
        Err(crate::error::StorageError::DomainError(
            "this index does not support rectangle queries".into(),
        ))
    }

    /// Spatial range search over a circle (closed disk).
    fn range_search_circle(&mut self, _circle: (f64, f64, f64)) -> Result<Vec<i64>> {
        Err(crate::error::StorageError::DomainError(
            "this index does not support circle queries".into(),
        ))
    }

    /// k nearest neighbors to `(x, y)`.
    fn knn_search(&mut self, _x: f64, _y: f64, _k: usize) -> Result<Vec<i64>> {
        Err(crate::error::StorageError::DomainError(
            "this index does not support KNN queries".into(),
        ))
    }
}
