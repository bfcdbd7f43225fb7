//! Full-scan fallback index (`IndexKind::None`).
//!
//! Keeps no structure of its own; every operation scans the heap file
//! directly through a shared handle. Grounded on the original engine's
//! `NoIndex`, whose `insert`/`clear` are no-ops for the same reason.

use crate::error::Result;
use crate::index::{Bound, Index};
use crate::storage::RecordFile;
use crate::types::{max_value, min_value, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub struct NoIndex {
    record_file: Rc<RefCell<RecordFile>>,
    column_index: usize,
    data_type: crate::types::DataType,
}

impl NoIndex {
    pub fn new(record_file: Rc<RefCell<RecordFile>>, column_index: usize, data_type: crate::types::DataType) -> Self {
        Self { record_file, column_index, data_type }
    }

    fn scan(&mut self, mut keep: impl FnMut(&Value) -> bool) -> Result<Vec<i64>> {
        let mut rf = self.record_file.borrow_mut();
        let max_id = rf.max_id()?;
        let mut out = Vec::new();
        for pos in 0..max_id {
            if let Some(record) = rf.read(pos)? {
                let v = &record.values[self.column_index];
                if keep(v) {
                    out.push(pos);
                }
            }
        }
        Ok(out)
    }
}

impl Index for NoIndex {
    fn insert(&mut self, _slot: i64, _key: &Value) -> Result<()> {
        Ok(())
    }

    fn delete(&mut self, _key: &Value) -> Result<()> {
        Ok(())
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        let key = key.clone();
        self.scan(|v| v == &key)
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        let lo = lo.unwrap_or_else(|| min_value(self.data_type));
        let hi = hi.unwrap_or_else(|| max_value(self.data_type));
        self.scan(|v| {
            v.partial_cmp_value(&lo).map(|o| o != std::cmp::Ordering::Less).unwrap_or(false)
                && v.partial_cmp_value(&hi).map(|o| o != std::cmp::Ordering::Greater).unwrap_or(false)
        })
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        self.scan(|_| true)
    }

    fn clear(&mut self) -> Result<()> {
        Ok(())
    }
}
