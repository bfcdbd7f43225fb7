//! Extendible hash index over a single column.
//!
//! A directory of `2^global_depth` slots maps onto a growable set of
//! buckets; each bucket tracks its own local depth and is split (doubling
//! the directory if needed) once it exceeds a fixed capacity. String keys
//! are hashed with SHA-256 for good bit distribution; fixed-width numeric
//! keys are hashed from their bit pattern directly. The whole structure
//! is persisted as one `bincode` blob per mutation, the same whole-tree
//! persistence used by the B+Tree index.
//!
//! Hash indexes have no intrinsic ordering, so `range_search` falls back
//! to a full scan over every bucket rather than a structural traversal.

use crate::error::Result;
use crate::index::{Bound, Index};
use crate::types::{max_value, min_value, DataType, Value};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Entries per bucket before a split is attempted.
const BUCKET_CAPACITY: usize = 4;
/// Local depth at which a bucket stops splitting and simply overflows,
/// guarding against runaway directory growth when many keys collide.
const MAX_LOCAL_DEPTH: u32 = 32;

#[derive(Serialize, Deserialize, Clone)]
struct Bucket {
    local_depth: u32,
    entries: Vec<(Value, i64)>,
}

#[derive(Serialize, Deserialize)]
struct Directory {
    global_depth: u32,
    slots: Vec<usize>,
    buckets: Vec<Bucket>,
}

impl Default for Directory {
    fn default() -> Self {
        Self { global_depth: 0, slots: vec![0], buckets: vec![Bucket { local_depth: 0, entries: Vec::new() }] }
    }
}

pub struct HashIndex {
    dir: Directory,
    path: PathBuf,
    data_type: DataType,
}

fn hash_key(key: &Value) -> u64 {
    match key {
        Value::Int(v) => *v as u64,
        Value::Float(v) => v.to_bits(),
        Value::Bool(v) => *v as u64,
        Value::Point(x, y) => x.to_bits() ^ y.to_bits().rotate_left(32),
        Value::Varchar(s) => {
            let digest = Sha256::digest(s.as_bytes());
            u64::from_le_bytes(digest[0..8].try_into().unwrap())
        }
        Value::Rect(..) | Value::Circle(..) | Value::Knn(..) => 0,
    }
}

impl HashIndex {
    pub fn open(path: impl AsRef<Path>, data_type: DataType) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let dir = if path.exists() {
            let bytes = std::fs::read(&path)?;
            bincode::deserialize(&bytes)?
        } else {
            Directory::default()
        };
        Ok(Self { dir, path, data_type })
    }

    fn save(&self) -> Result<()> {
        let bytes = bincode::serialize(&self.dir)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn dir_index(&self, key: &Value) -> usize {
        let mask = (1u64 << self.dir.global_depth) - 1;
        (hash_key(key) & mask) as usize
    }

    fn split(&mut self, bucket_id: usize) {
        let old_local_depth = self.dir.buckets[bucket_id].local_depth;
        if old_local_depth == self.dir.global_depth {
            self.dir.global_depth += 1;
            let doubled: Vec<usize> = self.dir.slots.iter().chain(self.dir.slots.iter()).copied().collect();
            self.dir.slots = doubled;
        }
        let new_local_depth = old_local_depth + 1;
        let new_bucket_id = self.dir.buckets.len();
        self.dir.buckets.push(Bucket { local_depth: new_local_depth, entries: Vec::new() });
        self.dir.buckets[bucket_id].local_depth = new_local_depth;

        for idx in 0..self.dir.slots.len() {
            if self.dir.slots[idx] == bucket_id && (idx >> (new_local_depth - 1)) & 1 == 1 {
                self.dir.slots[idx] = new_bucket_id;
            }
        }

        let old_entries = std::mem::take(&mut self.dir.buckets[bucket_id].entries);
        for (k, p) in old_entries {
            let idx = self.dir_index(&k);
            let target = self.dir.slots[idx];
            self.dir.buckets[target].entries.push((k, p));
        }
    }
}

impl Index for HashIndex {
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()> {
        loop {
            let idx = self.dir_index(key);
            let bucket_id = self.dir.slots[idx];
            if self.dir.buckets[bucket_id].entries.len() < BUCKET_CAPACITY
                || self.dir.buckets[bucket_id].local_depth >= MAX_LOCAL_DEPTH
            {
                self.dir.buckets[bucket_id].entries.push((key.clone(), slot));
                break;
            }
            self.split(bucket_id);
        }
        self.save()
    }

    fn delete(&mut self, key: &Value) -> Result<()> {
        let idx = self.dir_index(key);
        let bucket_id = self.dir.slots[idx];
        let entries = &mut self.dir.buckets[bucket_id].entries;
        if let Some(pos) = entries.iter().position(|(k, _)| k == key) {
            entries.remove(pos);
        }
        self.save()
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        let idx = self.dir_index(key);
        let bucket_id = self.dir.slots[idx];
        Ok(self.dir.buckets[bucket_id]
            .entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, p)| *p)
            .collect())
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        let lo = lo.unwrap_or_else(|| min_value(self.data_type));
        let hi = hi.unwrap_or_else(|| max_value(self.data_type));
        let mut out = Vec::new();
        for bucket in &self.dir.buckets {
            for (k, p) in &bucket.entries {
                let ge_lo = k.partial_cmp_value(&lo).map(|o| o != std::cmp::Ordering::Less).unwrap_or(false);
                let le_hi = k.partial_cmp_value(&hi).map(|o| o != std::cmp::Ordering::Greater).unwrap_or(false);
                if ge_lo && le_hi {
                    out.push(*p);
                }
            }
        }
        Ok(out)
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        Ok(self.dir.buckets.iter().flat_map(|b| b.entries.iter().map(|(_, p)| *p)).collect())
    }

    fn clear(&mut self) -> Result<()> {
        self.dir = Directory::default();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_search_survives_splits() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = HashIndex::open(dir.path().join("c.hash"), DataType::Int).unwrap();
        for i in 0..50i64 {
            idx.insert(i, &Value::Int(i)).unwrap();
        }
        for i in 0..50i64 {
            assert_eq!(idx.search(&Value::Int(i)).unwrap(), vec![i]);
        }
        assert!(idx.dir.global_depth > 0, "directory should have grown past its initial depth");
    }

    #[test]
    fn string_keys_hash_via_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = HashIndex::open(dir.path().join("c.hash"), DataType::Varchar(16)).unwrap();
        idx.insert(0, &Value::Varchar("alice".into())).unwrap();
        idx.insert(1, &Value::Varchar("bob".into())).unwrap();
        assert_eq!(idx.search(&Value::Varchar("alice".into())).unwrap(), vec![0]);
        idx.delete(&Value::Varchar("alice".into())).unwrap();
        assert!(idx.search(&Value::Varchar("alice".into())).unwrap().is_empty());
    }
}
