//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables the component design calls out as implementation choices: the
/// ISAM fill factor and page size used to size static levels (§4.6), and the
/// extendible hash bucket capacity (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding one subdirectory per table.
    pub base_dir: PathBuf,
    /// Target fraction of each ISAM leaf page to fill during bulk build.
    pub isam_fill_factor: f64,
    /// Records per extendible-hash bucket before it splits.
    pub hash_bucket_capacity: usize,
    /// Page size used to derive ISAM leaf/level1 capacities from a key width.
    pub page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./data"),
            isam_fill_factor: 0.75,
            hash_bucket_capacity: 4,
            page_size: 4096,
        }
    }
}

impl EngineConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), ..Self::default() }
    }

    /// A smaller-capacity preset useful for tests exercising bucket splits
    /// and page overflow without inserting thousands of rows.
    pub fn compact(base_dir: impl Into<PathBuf>) -> Self {
        Self { hash_bucket_capacity: 2, isam_fill_factor: 0.5, ..Self::new(base_dir) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_sane_bucket_capacity() {
        let cfg = EngineConfig::default();
        assert!(cfg.hash_bucket_capacity > 0);
    }
}
