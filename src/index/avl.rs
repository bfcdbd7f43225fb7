//! AVL-tree index over a single column.
//!
//! On-disk node: `key | pointer(i64) | left(i64) | right(i64) | height(i32)`.
//! `height == -2` tombstones a deleted node: its slot is never reclaimed,
//! and readers skip it, mirroring the original engine's choice to keep
//! deletion cheap at the cost of unbounded (if sparse) growth.

use crate::error::Result;
use crate::index::{Bound, Index};
use crate::types::{max_value, min_value, pack_value, unpack_value, DataType, Value};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const TOMBSTONE: i32 = -2;
const NIL: i64 = -1;

struct Node {
    key: Value,
    pointer: i64,
    left: i64,
    right: i64,
    height: i32,
}

pub struct AvlIndex {
    file: File,
    path: PathBuf,
    data_type: DataType,
    key_width: usize,
    node_size: u64,
}

impl AvlIndex {
    pub fn open(path: impl AsRef<Path>, data_type: DataType) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let is_new = !path.exists();
        let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        if is_new {
            file.write_all(&NIL.to_le_bytes())?;
        }
        let key_width = data_type.packed_size();
        let node_size = (key_width + 8 * 3 + 4) as u64;
        Ok(Self { file, path, data_type, key_width, node_size })
    }

    fn read_root(&mut self) -> Result<i64> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; 8];
        self.file.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn write_root(&mut self, root: i64) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&root.to_le_bytes())?;
        Ok(())
    }

    fn node_count(&mut self) -> Result<i64> {
        let len = self.file.metadata()?.len();
        Ok(((len.saturating_sub(8)) / self.node_size) as i64)
    }

    fn read_node(&mut self, pos: i64) -> Result<Node> {
        let offset = 8 + (pos as u64) * self.node_size;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.node_size as usize];
        self.file.read_exact(&mut buf)?;
        let key = unpack_value(self.data_type, &buf[0..self.key_width]);
        let mut o = self.key_width;
        let pointer = i64::from_le_bytes(buf[o..o + 8].try_into().unwrap());
        o += 8;
        let left = i64::from_le_bytes(buf[o..o + 8].try_into().unwrap());
        o += 8;
        let right = i64::from_le_bytes(buf[o..o + 8].try_into().unwrap());
        o += 8;
        let height = i32::from_le_bytes(buf[o..o + 4].try_into().unwrap());
        Ok(Node { key, pointer, left, right, height })
    }

    fn write_node(&mut self, pos: i64, node: &Node) -> Result<()> {
        let offset = 8 + (pos as u64) * self.node_size;
        let mut buf = vec![0u8; self.node_size as usize];
        pack_value(self.data_type, &node.key, &mut buf[0..self.key_width]);
        let mut o = self.key_width;
        buf[o..o + 8].copy_from_slice(&node.pointer.to_le_bytes());
        o += 8;
        buf[o..o + 8].copy_from_slice(&node.left.to_le_bytes());
        o += 8;
        buf[o..o + 8].copy_from_slice(&node.right.to_le_bytes());
        o += 8;
        buf[o..o + 4].copy_from_slice(&node.height.to_le_bytes());
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    fn append_node(&mut self, node: Node) -> Result<i64> {
        let pos = self.node_count()?;
        self.write_node(pos, &node)?;
        Ok(pos)
    }

    fn height(&mut self, pos: i64) -> Result<i32> {
        if pos == NIL {
            return Ok(0);
        }
        let n = self.read_node(pos)?;
        Ok(if n.height == TOMBSTONE { 0 } else { n.height })
    }

    fn balance(&mut self, pos: i64) -> Result<i32> {
        if pos == NIL {
            return Ok(0);
        }
        let n = self.read_node(pos)?;
        Ok(self.height(n.left)? - self.height(n.right)?)
    }

    fn update_height(&mut self, pos: i64) -> Result<()> {
        let mut n = self.read_node(pos)?;
        if n.height == TOMBSTONE {
            // A tombstoned node contributes zero height to its parent but
            // keeps its own sentinel forever; it is never structurally
            // rebalanced again.
            return Ok(());
        }
        n.height = 1 + self.height(n.left)?.max(self.height(n.right)?);
        self.write_node(pos, &n)?;
        Ok(())
    }

    fn rotate_right(&mut self, pos: i64) -> Result<i64> {
        let mut n = self.read_node(pos)?;
        let left_pos = n.left;
        let mut left = self.read_node(left_pos)?;
        n.left = left.right;
        left.right = pos;
        self.write_node(pos, &n)?;
        self.write_node(left_pos, &left)?;
        self.update_height(pos)?;
        self.update_height(left_pos)?;
        Ok(left_pos)
    }

    fn rotate_left(&mut self, pos: i64) -> Result<i64> {
        let mut n = self.read_node(pos)?;
        let right_pos = n.right;
        let mut right = self.read_node(right_pos)?;
        n.right = right.left;
        right.left = pos;
        self.write_node(pos, &n)?;
        self.write_node(right_pos, &right)?;
        self.update_height(pos)?;
        self.update_height(right_pos)?;
        Ok(right_pos)
    }

    fn rebalance(&mut self, pos: i64) -> Result<i64> {
        self.update_height(pos)?;
        let bf = self.balance(pos)?;
        let n = self.read_node(pos)?;
        if bf > 1 {
            if self.balance(n.left)? < 0 {
                let new_left = self.rotate_left(n.left)?;
                let mut n2 = self.read_node(pos)?;
                n2.left = new_left;
                self.write_node(pos, &n2)?;
            }
            return self.rotate_right(pos);
        }
        if bf < -1 {
            if self.balance(n.right)? > 0 {
                let new_right = self.rotate_right(n.right)?;
                let mut n2 = self.read_node(pos)?;
                n2.right = new_right;
                self.write_node(pos, &n2)?;
            }
            return self.rotate_left(pos);
        }
        Ok(pos)
    }

    fn insert_aux(&mut self, pos: i64, key: &Value, pointer: i64) -> Result<i64> {
        if pos == NIL {
            return self.append_node(Node { key: key.clone(), pointer, left: NIL, right: NIL, height: 1 });
        }
        let mut n = self.read_node(pos)?;
        // A tombstoned node's key is still a valid BST pivot for its
        // (untouched) subtree, so comparisons ignore the tombstone flag.
        match key.partial_cmp_value(&n.key) {
            Some(std::cmp::Ordering::Less) => {
                n.left = self.insert_aux(n.left, key, pointer)?;
            }
            _ => {
                n.right = self.insert_aux(n.right, key, pointer)?;
            }
        }
        self.write_node(pos, &n)?;
        self.rebalance(pos)
    }

    fn range_aux(&mut self, pos: i64, lo: &Value, hi: &Value, out: &mut Vec<i64>) -> Result<()> {
        if pos == NIL {
            return Ok(());
        }
        let n = self.read_node(pos)?;
        if lo.partial_cmp_value(&n.key).map(|o| o != std::cmp::Ordering::Greater).unwrap_or(false) {
            self.range_aux(n.left, lo, hi, out)?;
        }
        if n.height != TOMBSTONE {
            let ge_lo = n.key.partial_cmp_value(lo).map(|o| o != std::cmp::Ordering::Less).unwrap_or(false);
            let le_hi = n.key.partial_cmp_value(hi).map(|o| o != std::cmp::Ordering::Greater).unwrap_or(false);
            if ge_lo && le_hi {
                out.push(n.pointer);
            }
        }
        if hi.partial_cmp_value(&n.key).map(|o| o != std::cmp::Ordering::Less).unwrap_or(false) {
            self.range_aux(n.right, lo, hi, out)?;
        }
        Ok(())
    }

    fn find_and_tombstone(&mut self, pos: i64, key: &Value) -> Result<bool> {
        if pos == NIL {
            return Ok(false);
        }
        let mut n = self.read_node(pos)?;
        if n.height != TOMBSTONE {
            match key.partial_cmp_value(&n.key) {
                Some(std::cmp::Ordering::Equal) => {
                    n.height = TOMBSTONE;
                    self.write_node(pos, &n)?;
                    return Ok(true);
                }
                Some(std::cmp::Ordering::Less) => return self.find_and_tombstone(n.left, key),
                _ => return self.find_and_tombstone(n.right, key),
            }
        }
        if self.find_and_tombstone(n.left, key)? {
            return Ok(true);
        }
        self.find_and_tombstone(n.right, key)
    }
}

impl Index for AvlIndex {
    fn insert(&mut self, slot: i64, key: &Value) -> Result<()> {
        let root = self.read_root()?;
        let new_root = self.insert_aux(root, key, slot)?;
        self.write_root(new_root)
    }

    fn delete(&mut self, key: &Value) -> Result<()> {
        let root = self.read_root()?;
        self.find_and_tombstone(root, key)?;
        Ok(())
    }

    fn search(&mut self, key: &Value) -> Result<Vec<i64>> {
        self.range_search(Some(key.clone()), Some(key.clone()))
    }

    fn range_search(&mut self, lo: Bound, hi: Bound) -> Result<Vec<i64>> {
        let lo = lo.unwrap_or_else(|| min_value(self.data_type));
        let hi = hi.unwrap_or_else(|| max_value(self.data_type));
        let root = self.read_root()?;
        let mut out = Vec::new();
        self.range_aux(root, &lo, &hi, &mut out)?;
        Ok(out)
    }

    fn get_all(&mut self) -> Result<Vec<i64>> {
        self.range_search(None, None)
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        let mut file = OpenOptions::new().read(true).write(true).create(true).open(&self.path)?;
        file.write_all(&NIL.to_le_bytes())?;
        self.file = file;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_search_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = AvlIndex::open(dir.path().join("c.avl"), DataType::Int).unwrap();
        for (slot, v) in [(0, 5), (1, 3), (2, 8), (3, 1), (4, 4)] {
            idx.insert(slot, &Value::Int(v)).unwrap();
        }
        let mut hits = idx.search(&Value::Int(4)).unwrap();
        hits.sort();
        assert_eq!(hits, vec![4]);

        let mut range = idx.range_search(Some(Value::Int(3)), Some(Value::Int(5))).unwrap();
        range.sort();
        assert_eq!(range, vec![0, 1, 4]);
    }

    #[test]
    fn delete_tombstones_without_reclaiming() {
        let dir = tempfile::tempdir().unwrap();
        let mut idx = AvlIndex::open(dir.path().join("c.avl"), DataType::Int).unwrap();
        idx.insert(0, &Value::Int(10)).unwrap();
        idx.insert(1, &Value::Int(20)).unwrap();
        idx.delete(&Value::Int(10)).unwrap();
        assert!(idx.search(&Value::Int(10)).unwrap().is_empty());
        assert_eq!(idx.search(&Value::Int(20)).unwrap(), vec![1]);
    }
}
