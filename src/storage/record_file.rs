//! Fixed-schema heap file with a LIFO free list.
//!
//! Layout: a 4-byte header (`i64` offset of the free-list head, `-1` if
//! empty), followed by fixed-size slots. Each slot holds a packed `Record`
//! plus an 8-byte `next_free` tag: `-2` marks a live record, any other
//! value is either the next free slot's id or `-1` to terminate the chain.

use crate::error::{Result, StorageError};
use crate::types::{pack_value, unpack_value, DataType, Record, TableSchema, Value};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const HEADER_SIZE: u64 = 8;
const LIVE: i64 = -2;
const LIST_END: i64 = -1;

pub struct RecordFile {
    file: File,
    path: PathBuf,
    record_size: usize,
    node_size: u64,
    schema: TableSchema,
}

impl RecordFile {
    pub fn open(path: impl AsRef<Path>, schema: TableSchema) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let is_new = !path.exists();
        let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;

        if is_new {
            file.write_all(&LIST_END.to_le_bytes())?;
        }

        let record_size = schema.record_size();
        let node_size = (record_size + 8) as u64;

        Ok(Self { file, path, record_size, node_size, schema })
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn read_header(&mut self) -> Result<i64> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; 8];
        self.file.read_exact(&mut buf)?;
        Ok(i64::from_le_bytes(buf))
    }

    fn write_header(&mut self, head: i64) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&head.to_le_bytes())?;
        Ok(())
    }

    fn slot_offset(&self, pos: i64) -> u64 {
        HEADER_SIZE + (pos as u64) * self.node_size
    }

    fn read_node(&mut self, pos: i64) -> Result<(Record, i64)> {
        let offset = self.slot_offset(pos);
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; self.node_size as usize];
        self.file.read_exact(&mut buf)?;
        let record = unpack_record(&self.schema, &buf[..self.record_size]);
        let next_free = i64::from_le_bytes(buf[self.record_size..self.record_size + 8].try_into().unwrap());
        Ok((record, next_free))
    }

    fn write_node(&mut self, pos: i64, record: &Record, next_free: i64) -> Result<()> {
        let offset = self.slot_offset(pos);
        let mut buf = vec![0u8; self.node_size as usize];
        pack_record(&self.schema, record, &mut buf[..self.record_size]);
        buf[self.record_size..self.record_size + 8].copy_from_slice(&next_free.to_le_bytes());
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Number of slots physically present in the file (live or free).
    pub fn max_id(&self) -> Result<i64> {
        let len = self.file.metadata()?.len();
        if len <= HEADER_SIZE {
            return Ok(0);
        }
        Ok(((len - HEADER_SIZE) / self.node_size) as i64)
    }

    /// Appends a record, reusing a free slot if one is available. Returns
    /// the record's slot id.
    pub fn append(&mut self, record: &Record) -> Result<i64> {
        let head = self.read_header()?;
        if head == LIST_END {
            let pos = self.max_id()?;
            self.write_node(pos, record, LIVE)?;
            Ok(pos)
        } else {
            let (_, old_next) = self.read_node(head)?;
            self.write_node(head, record, LIVE)?;
            self.write_header(old_next)?;
            Ok(head)
        }
    }

    /// Reads the record at `pos`, or `None` if that slot is deleted/absent.
    pub fn read(&mut self, pos: i64) -> Result<Option<Record>> {
        if pos < 0 || pos >= self.max_id()? {
            return Ok(None);
        }
        let (record, next_free) = self.read_node(pos)?;
        if next_free == LIVE {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }

    /// Deletes the record at `pos` by pushing its slot onto the free list.
    pub fn delete(&mut self, pos: i64) -> Result<()> {
        let (record, next_free) = self.read_node(pos)?;
        if next_free != LIVE {
            return Err(StorageError::DomainError(format!("slot {} is already free", pos)));
        }
        let head = self.read_header()?;
        self.write_node(pos, &record, head)?;
        self.write_header(pos)?;
        Ok(())
    }

    /// Removes the backing file entirely.
    pub fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

fn pack_record(schema: &TableSchema, record: &Record, out: &mut [u8]) {
    let mut offset = 0usize;
    for (col, value) in schema.columns.iter().zip(record.values.iter()) {
        let width = col.data_type.packed_size();
        let slot = &mut out[offset..offset + width];
        pack_value(col.data_type, value, slot);
        offset += width;
    }
}

fn unpack_record(schema: &TableSchema, buf: &[u8]) -> Record {
    let mut offset = 0usize;
    let mut values = Vec::with_capacity(schema.columns.len());
    for col in &schema.columns {
        let width = col.data_type.packed_size();
        let slot = &buf[offset..offset + width];
        values.push(unpack_value(col.data_type, slot));
        offset += width;
    }
    Record::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn schema() -> TableSchema {
        TableSchema::new(
            "t",
            vec![
                Column::new("id", DataType::Int),
                Column::new("name", DataType::Varchar(8)),
            ],
        )
    }

    #[test]
    fn append_and_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut rf = RecordFile::open(dir.path().join("t.dat"), schema()).unwrap();
        let pos = rf.append(&Record::new(vec![Value::Int(1), Value::Varchar("alice".into())])).unwrap();
        let rec = rf.read(pos).unwrap().unwrap();
        assert_eq!(rec.values[0], Value::Int(1));
        assert_eq!(rec.values[1], Value::Varchar("alice".into()));
    }

    #[test]
    fn delete_reuses_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut rf = RecordFile::open(dir.path().join("t.dat"), schema()).unwrap();
        let p0 = rf.append(&Record::new(vec![Value::Int(1), Value::Varchar("a".into())])).unwrap();
        let p1 = rf.append(&Record::new(vec![Value::Int(2), Value::Varchar("b".into())])).unwrap();
        rf.delete(p0).unwrap();
        assert!(rf.read(p0).unwrap().is_none());
        let p2 = rf.append(&Record::new(vec![Value::Int(3), Value::Varchar("c".into())])).unwrap();
        assert_eq!(p2, p0, "deleted slot should be reused before growing the file");
        assert_ne!(p1, p2);
    }

    #[test]
    fn max_id_tracks_slot_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut rf = RecordFile::open(dir.path().join("t.dat"), schema()).unwrap();
        assert_eq!(rf.max_id().unwrap(), 0);
        rf.append(&Record::new(vec![Value::Int(1), Value::Varchar("a".into())])).unwrap();
        assert_eq!(rf.max_id().unwrap(), 1);
    }
}
