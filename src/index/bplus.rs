//! B+Tree index over a single column.
//!
//! The whole tree is held in memory as a vector of nodes and persisted as
//! one `bincode` blob per mutation, the same whole-structure persistence
//! the catalog uses for table schemas — appropriate here since there is
//! only ever one writer and no crash recovery to design for.
//!
//! Node capacity is derived from a block factor of 3, matching the
//! original design: each node holds at most `2 * BLOCK_FACTOR` keys.

use crate::error::Result;
use crate::index::{Bound, Index};
use crate::types::{max_value, min_value, DataType, Value};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BLOCK_FACTOR: usize = 3;
const CAPACITY: usize = 2 * BLOCK_FACTOR;

#[derive(Serialize, Deserialize, Clone)]
enum Node {
    Leaf { keys: Vec<Value>, pointers: Vec<i64>, next_leaf: Option<usize> },
    Internal { keys: Vec<Value>, children: Vec<usize> },
}

#[derive(Serialize, Deserialize, Default)]
struct Tree {
    root: Option<usize>,
    nodes: Vec<Node>,
}

pub struct BPlusIndex {
    tree: Tree,
    path: PathBuf,
    data_type: DataType,
}

impl BPlusIndex {
    pub fn open(path: impl AsRef<Path>, data_type: DataType) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tree = if path.exists() {
            let bytes = std::fs::read(&path)?;
            bincode::deserialize(&bytes)?
        } else {
            Tree::default()
        };
        Ok(Self { tree, path, data_type })
    }

    fn save(&self) -> Result<()> {
        let bytes = bincode::serialize(&self.tree)?;
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn lt(&self, a: &Value, b: &Value) -> bool {
        a.partial_cmp_value(b) == Some(std::cmp::Ordering::Less)
    }

    /// Inserts into the subtree rooted at `node_idx`. Returns `Some((promoted_key,
    /// new_sibling_idx))` if this node split.
    fn insert_into(&mut self, node_idx: usize, key: Value, pointer: i64) -> Option<(Value, usize)> {
        match self.tree.nodes[node_idx].clone() {
            Node::Leaf { mut keys, mut pointers, next_leaf } => {
                let pos = keys.iter().position(|k| self.lt(&key, k)).unwrap_or(keys.len());
                keys.insert(pos, key);
                pointers.insert(pos, pointer);
                if keys.len() <= CAPACITY {
                    self.tree.nodes[node_idx] = Node::Leaf { keys, pointers, next_leaf };
                    None
                } else {
                    let mid = keys.len() / 2;
                    let right_keys = keys.split_off(mid);
                    let right_pointers = pointers.split_off(mid);
                    let promoted = right_keys[0].clone();
                    let new_idx = self.tree.nodes.len();
                    self.tree.nodes.push(Node::Leaf { keys: right_keys, pointers: right_pointers, next_leaf });
                    self.tree.nodes[node_idx] = Node::Leaf { keys, pointers, next_leaf: Some(new_idx) };
                    Some((promoted, new_idx))
                }
            }
            Node::Internal { mut keys, mut children } => {
                let child_pos = keys.iter().position(|k| self.lt(&key, k)).unwrap_or(keys.len());
                let child_idx = children[child_pos];
                if let Some((promoted, new_child)) = self.insert_into(child_idx, key, pointer) {
                    keys.insert(child_pos, promoted);
                    children.insert(child_pos + 1, new_child);
                    if keys.len() <= CAPACITY {
                        self.tree.nodes[node_idx] = Node::Internal { keys, children };
                        None
                    } else {
                        let mid = keys.len() / 2;
                        let up_key = keys[mid].clone();
                        let right_keys = keys.split_off(mid + 1);
                        keys.pop(); // drop the promoted key itself from the left side
                        let right_children = children.split_off(mid + 1);
                        let new_idx = self.tree.nodes.len();
                        self.tree.nodes.push(Node::Internal { keys: right_keys, children: right_children });
                        self.tree.nodes[node_idx] = Node::Internal { keys, children };
                        Some((up_key, new_idx))
                    }
                } else {
                    self.tree.nodes[node_idx] = Node::Internal { keys, children };
                    None
                }
            }
        }
    }

    fn find_leaf(&self, key: &Value) -> Option<usize> {
        let mut cur = self.tree.root?;
        loop {
            match &self.tree.nodes[cur] {
                Node::Leaf { .. } => return Some(cur),
                Node::Internal { keys, children } => {
                    let pos = keys.iter().position(|k| self.lt(key, k)).unwrap_or(keys.len());
                    cur = children[pos];
                }
            }
        }
    }
}

impl Index for BPlusIndex {
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()> {
        if self.tree.root.is_none() {
            self.tree.nodes.push(Node::Leaf { keys: vec![key.clone()], pointers: vec![slot], next_leaf: None });
            self.tree.root = Some(0);
        } else {
            let root = self.tree.root.unwrap();
            if let Some((promoted, new_idx)) = self.insert_into(root, key.clone(), slot) {
                let new_root = self.tree.nodes.len();
                self.tree.nodes.push(Node::Internal { keys: vec![promoted], children: vec![root, new_idx] });
                self.tree.root = Some(new_root);
            }
        }
        self.save()
    }

    /// Removes the first matching `(key, pointer)` entry found in its leaf.
    /// Underflowed leaves are left in place rather than merged/redistributed:
    /// a documented simplification (see DESIGN.md) rather than a silent stub.
    fn delete(&mut self, key: &Value) -> Result<()> {
        if let Some(leaf_idx) = self.find_leaf(key) {
            if let Node::Leaf { keys, pointers, .. } = &mut self.tree.nodes[leaf_idx] {
                if let Some(pos) = keys.iter().position(|k| k == key) {
                    keys.remove(pos);
                    pointers.remove(pos);
                }
            }
        }
        self.save()
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        self.range_search(Some(key.clone()), Some(key.clone()))
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        let lo = lo.unwrap_or_else(|| min_value(self.data_type));
        let hi = hi.unwrap_or_else(|| max_value(self.data_type));
        let mut out = Vec::new();
        let Some(mut leaf_idx) = self.find_leaf(&lo) else { return Ok(out) };
        'outer: loop {
            let (keys, pointers, next) = match &self.tree.nodes[leaf_idx] {
                Node::Leaf { keys, pointers, next_leaf } => (keys.clone(), pointers.clone(), *next_leaf),
                Node::Internal { .. } => unreachable!("find_leaf always returns a leaf"),
            };
            for (k, p) in keys.iter().zip(pointers.iter()) {
                if k.partial_cmp_value(&hi).map(|o| o == std::cmp::Ordering::Greater).unwrap_or(false) {
                    break 'outer;
                }
                if k.partial_cmp_value(&lo).map(|o| o != std::cmp::Ordering::Less).unwrap_or(false) {
                    out.push(*p);
                }
            }
            match next {
                Some(n) => leaf_idx = n,
                None => break,
            }
        }
        Ok(out)
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        self.range_search(None, None)
    }

    fn clear(&mut self) -> Result<()> {
        self.tree = Tree::default();
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
    fn insert_and_range_search_across_splits() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = BPlusIndex::open(dir.path().join("c.bpt"), DataType::Int).unwrap();
        for i in 0..20i64 {
            idx.insert(i, &Value::Int(i)).unwrap();
        }
        let mut all = idx.get_all().unwrap();
        all.sort();
        assert_eq!(all, (0..20).collect::<Vec<_>>());

        let mut range = idx.range_search(Some(Value::Int(5)), Some(Value::Int(9))).unwrap();
        range.sort();
        assert_eq!(range, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = BPlusIndex::open(dir.path().join("c.bpt"), DataType::Int).unwrap();
        idx.insert(0, &Value::Int(1)).unwrap();
        idx.insert(1, &Value::Int(2)).unwrap();
        idx.delete(&Value::Int(1)).unwrap();
        assert!(idx.search(&Value::Int(1)).unwrap().is_empty());
    }
}
