//! Physical storage layer: a fixed-schema heap file with a free list.

pub mod record_file;

pub use record_file::RecordFile;
