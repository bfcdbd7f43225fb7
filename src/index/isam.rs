//! Static three-level ISAM index (root -> level-1 -> leaf) over a single
//! column, bulk-built from a sorted key set and maintained afterwards
//! through per-leaf overflow chains rather than restructuring.
//!
//! The original design pads fixed-width on-disk pages with sentinel
//! boundary keys; here leaves and index pages are variable-length
//! in-memory vectors persisted as one `bincode` blob, so no padding
//! scheme is needed — see DESIGN.md for the rationale. Separator
//! selection (first key of each child page) and the overflow-on-insert
//! discipline are kept faithful to the original structure.

use crate::error::Result;
use crate::index::{Bound, Index};
use crate::types::{max_value, min_value, DataType, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

const LEAF_CAPACITY: usize = 4;
const LEVEL1_FANOUT: usize = 4;

#[derive(Serialize, Deserialize, Clone)]
struct Leaf {
    keys: Vec<Value>,
    pointers: Vec<i64>,
    overflow: Vec<(Value, i64)>,
}

impl Leaf {
    fn empty() -> Self {
        Self { keys: Vec::new(), pointers: Vec::new(), overflow: Vec::new() }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct IndexPage {
    separators: Vec<Value>,
    children: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct Tree {
    leaves: Vec<Leaf>,
    level1: Vec<IndexPage>,
    root: IndexPage,
}

fn find_child(separators: &[Value], key: &Value) -> usize {
    let mut idx = 0;
    for (i, s) in separators.iter().enumerate() {
        if key.partial_cmp_value(s).map(|o| o != Ordering::Less).unwrap_or(false) {
            idx = i;
        } else {
            break;
        }
    }
    idx
}

impl Tree {
    fn single_empty_leaf() -> Self {
        let leaves = vec![Leaf::empty()];
        let level1 = vec![IndexPage { separators: vec![], children: vec![0] }];
        let root = IndexPage { separators: vec![], children: vec![0] };
        Self { leaves, level1, root }
    }

    fn leaf_index(&self, key: &Value) -> usize {
        let l1_pos = find_child(&self.root.separators, key);
        let level1_page = &self.level1[self.root.children[l1_pos]];
        let leaf_pos = find_child(&level1_page.separators, key);
        level1_page.children[leaf_pos]
    }
}

pub struct IsamIndex {
    tree: Tree,
    path: PathBuf,
    data_type: DataType,
}

impl IsamIndex {
    pub fn open(path: impl AsRef<Path>, data_type: DataType) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tree = if path.exists() {
            let bytes = std::fs::read(&path)?;
            bincode::deserialize(&bytes)?
        } else {
            Tree::single_empty_leaf()
        };
        Ok(Self { tree, path, data_type })
    }

    fn save(&self) -> Result<()> {
        let bytes = bincode::serialize(&self.tree)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Bulk-builds the static structure from a full key set, replacing
    /// whatever was there before. Used by `CREATE INDEX` to materialize
    /// the index from the existing table contents in one pass.
    pub fn build(&mut self, mut pairs: Vec<(Value, i64)>) -> Result<()> {
        pairs.sort_by(|a, b| a.0.partial_cmp_value(&b.0).unwrap_or(Ordering::Equal));

        let leaves: Vec<Leaf> = if pairs.is_empty() {
            vec![Leaf::empty()]
        } else {
            pairs
                .chunks(LEAF_CAPACITY)
                .map(|chunk| {
                    let keys = chunk.iter().map(|(k, _)| k.clone()).collect();
                    let pointers = chunk.iter().map(|(_, p)| *p).collect();
                    Leaf { keys, pointers, overflow: Vec::new() }
                })
                .collect()
        };

        let leaf_groups: Vec<Vec<usize>> = (0..leaves.len())
            .collect::<Vec<_>>()
            .chunks(LEVEL1_FANOUT)
            .map(|c| c.to_vec())
            .collect();

        let level1: Vec<IndexPage> = leaf_groups
            .iter()
            .map(|group| {
                let separators = group
                    .iter()
                    .map(|&i| leaves[i].keys.first().cloned().unwrap_or_else(|| min_value(self.data_type)))
                    .collect();
                IndexPage { separators, children: group.clone() }
            })
            .collect();

        let root_separators = level1
            .iter()
            .map(|p| p.separators.first().cloned().unwrap_or_else(|| min_value(self.data_type)))
            .collect();
        let root = IndexPage { separators: root_separators, children: (0..level1.len()).collect() };

        self.tree = Tree { leaves, level1, root };
        self.save()
    }
}

impl Index for IsamIndex {
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()> {
        let idx = self.tree.leaf_index(key);
        self.tree.leaves[idx].overflow.push((key.clone(), slot));
        self.save()
    }

    fn delete(&mut self, key: &Value) -> Result<()> {
        let idx = self.tree.leaf_index(key);
        let leaf = &mut self.tree.leaves[idx];
        if let Some(pos) = leaf.keys.iter().position(|k| k == key) {
            leaf.keys.remove(pos);
            leaf.pointers.remove(pos);
        } else if let Some(pos) = leaf.overflow.iter().position(|(k, _)| k == key) {
            leaf.overflow.remove(pos);
        }
        self.save()
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        let idx = self.tree.leaf_index(key);
        let leaf = &self.tree.leaves[idx];
        let mut out: Vec<i64> = leaf
            .keys
            .iter()
            .zip(leaf.pointers.iter())
            .filter(|(k, _)| *k == key)
            .map(|(_, p)| *p)
            .collect();
        out.extend(leaf.overflow.iter().filter(|(k, _)| k == key).map(|(_, p)| *p));
        Ok(out)
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        let lo = lo.unwrap_or_else(|| min_value(self.data_type));
        let hi = hi.unwrap_or_else(|| max_value(self.data_type));
        let start = self.tree.leaf_index(&lo);
        let mut out = Vec::new();
        for leaf in &self.tree.leaves[start..] {
            for (k, p) in leaf.keys.iter().zip(leaf.pointers.iter()) {
                if k.partial_cmp_value(&lo).map(|o| o != Ordering::Less).unwrap_or(false)
                    && k.partial_cmp_value(&hi).map(|o| o != Ordering::Greater).unwrap_or(false)
                {
                    out.push(*p);
                }
            }
            for (k, p) in &leaf.overflow {
                if k.partial_cmp_value(&lo).map(|o| o != Ordering::Less).unwrap_or(false)
                    && k.partial_cmp_value(&hi).map(|o| o != Ordering::Greater).unwrap_or(false)
                {
                    out.push(*p);
                }
            }
            if let Some(first) = leaf.keys.first() {
                if first.partial_cmp_value(&hi).map(|o| o == Ordering::Greater).unwrap_or(false) {
                    break;
                }
            }
        }
        Ok(out)
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        self.range_search(None, None)
    }

    fn clear(&mut self) -> Result<()> {
        self.tree = Tree::single_empty_leaf();
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
    fn build_then_search_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = IsamIndex::open(dir.path().join("c.isam"), DataType::Int).unwrap();
        let pairs: Vec<(Value, i64)> = (0..30i64).map(|i| (Value::Int(i), i)).collect();
        idx.build(pairs).unwrap();

        assert_eq!(idx.search(&Value::Int(17)).unwrap(), vec![17]);

        let mut range = idx.range_search(Some(Value::Int(10)), Some(Value::Int(15))).unwrap();
        range.sort();
        assert_eq!(range, vec![10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn insert_goes_to_overflow_and_is_findable() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = IsamIndex::open(dir.path().join("c.isam"), DataType::Int).unwrap();
        idx.build((0..10i64).map(|i| (Value::Int(i), i)).collect()).unwrap();
        idx.insert(99, &Value::Int(5)).unwrap();
        let mut hits = idx.search(&Value::Int(5)).unwrap();
        hits.sort();
        assert_eq!(hits, vec![5, 99]);
    }

    #[test]
    fn delete_removes_from_main_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = IsamIndex::open(dir.path().join("c.isam"), DataType::Int).unwrap();
        idx.build((0..10i64).map(|i| (Value::Int(i), i)).collect()).unwrap();
        idx.delete(&Value::Int(3)).unwrap();
        assert!(idx.search(&Value::Int(3)).unwrap().is_empty());
    }
}
