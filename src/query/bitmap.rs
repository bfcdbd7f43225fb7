//! Record-id bitmaps with tail-flag compression.
//!
//! Bit 0 is a tail flag: when set, every record id `>= len(bits) - 1` is
//! considered present even though no explicit bit was ever stored for it.
//! Real record-id bits start at offset 1 (record id `r` lives at bit `r + 1`).
//! This lets `NOT` over an open-ended universe (e.g. "not equal to X") stay a
//! finite-length bitmap instead of growing to the size of the table.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<bool>,
}

impl Bitmap {
    /// An empty bitmap: tail flag unset, no record ids present.
    pub fn empty() -> Self {
        Self { bits: vec![false] }
    }

    /// A bitmap with the tail flag set: every record id is present.
    pub fn universe() -> Self {
        Self { bits: vec![true] }
    }

    pub fn from_ids(ids: &[i64]) -> Self {
        let mut bm = Self::empty();
        for &id in ids {
            bm.set(id);
        }
        bm
    }

    fn tail(&self) -> bool {
        self.bits[0]
    }

    pub fn set(&mut self, record_id: i64) {
        let idx = record_id as usize + 1;
        if idx >= self.bits.len() {
            self.bits.resize(idx + 1, self.tail());
        }
        self.bits[idx] = true;
    }

    pub fn get(&self, record_id: i64) -> bool {
        let idx = record_id as usize + 1;
        if idx < self.bits.len() {
            self.bits[idx]
        } else {
            self.tail()
        }
    }

    /// Extends `self` to be at least `len` bits long, padding new positions
    /// with the current tail flag.
    fn extend_to(&mut self, len: usize) {
        if len > self.bits.len() {
            let tail = self.tail();
            self.bits.resize(len, tail);
        }
    }

    pub fn or(&self, other: &Bitmap) -> Bitmap {
        let len = self.bits.len().max(other.bits.len());
        let mut a = self.clone();
        let mut b = other.clone();
        a.extend_to(len);
        b.extend_to(len);
        let bits = a.bits.iter().zip(b.bits.iter()).map(|(x, y)| x | y).collect();
        Bitmap { bits }
    }

    pub fn and(&self, other: &Bitmap) -> Bitmap {
        let len = self.bits.len().max(other.bits.len());
        let mut a = self.clone();
        let mut b = other.clone();
        a.extend_to(len);
        b.extend_to(len);
        let bits = a.bits.iter().zip(b.bits.iter()).map(|(x, y)| x & y).collect();
        Bitmap { bits }
    }

    pub fn not(&self) -> Bitmap {
        Bitmap { bits: self.bits.iter().map(|b| !b).collect() }
    }

    /// `AND(a, NOT b)`.
    pub fn diff(&self, other: &Bitmap) -> Bitmap {
        self.and(&other.not())
    }

    /// Record ids present, up to (and not including) `limit`. The tail flag
    /// is resolved against `limit`, which callers set to the table's current
    /// highest record id + 1 (the heap's slot count).
    pub fn to_ids(&self, limit: i64) -> Vec<i64> {
        let mut out = Vec::new();
        for id in 0..limit {
            if self.get(id) {
                out.push(id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_round_trip() {
        let mut bm = Bitmap::empty();
        bm.set(0);
        bm.set(5);
        assert!(bm.get(0));
        assert!(bm.get(5));
        assert!(!bm.get(1));
        assert_eq!(bm.to_ids(6), vec![0, 5]);
    }

    #[test]
    fn universe_reports_present_past_its_explicit_bits() {
        let bm = Bitmap::universe();
        assert!(bm.get(0));
        assert!(bm.get(1_000_000));
    }

    #[test]
    fn or_extends_shorter_operand_by_its_tail_flag() {
        let a = Bitmap::from_ids(&[0, 1]); // tail unset, length 3
        let mut b = Bitmap::universe();
        b.set(10); // tail set, length 12
        let combined = a.or(&b);
        // b's tail flag is set, so every id is present regardless of a.
        assert!(combined.get(0));
        assert!(combined.get(50));
    }

    #[test]
    fn and_of_disjoint_sets_is_empty_when_tails_unset() {
        let a = Bitmap::from_ids(&[0, 1]);
        let b = Bitmap::from_ids(&[2, 3]);
        let combined = a.and(&b);
        for id in 0..4 {
            assert!(!combined.get(id));
        }
    }

    #[test]
    fn not_flips_tail_flag_too() {
        let a = Bitmap::from_ids(&[0]);
        let not_a = a.not();
        assert!(!not_a.get(0));
        assert!(not_a.get(100)); // tail flipped from false to true
    }

    #[test]
    fn diff_removes_b_members_from_a() {
        let a = Bitmap::from_ids(&[0, 1, 2]);
        let b = Bitmap::from_ids(&[1]);
        let d = a.diff(&b);
        assert_eq!(d.to_ids(3), vec![0, 2]);
    }
}
