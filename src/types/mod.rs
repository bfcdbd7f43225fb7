//! Data model: column types, schemas, records, and runtime values.

use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    /// Fixed-length, null-padded string of the given length.
    Varchar(u16),
    Date,
    Bool,
    /// 2-D point, stored as two f64 coordinates.
    Point,
}

impl DataType {
    /// Byte width of this type's packed on-disk representation. INT/FLOAT
    /// pack as 32-bit (4 bytes); POINT as two 32-bit floats (8 bytes) —
    /// `Value` itself stays `i64`/`f64` for ergonomic arithmetic, narrowed
    /// to 32 bits only at the pack/unpack boundary (see `pack_value`).
    pub fn packed_size(&self) -> usize {
        match self {
            DataType::Int => 4,
            DataType::Float => 4,
            DataType::Varchar(len) => *len as usize,
            DataType::Date => 4,
            DataType::Bool => 1,
            DataType::Point => 8,
        }
    }
}

/// The kind of index structure attached to a column, or `None` for no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    None,
    Avl,
    Isam,
    Hash,
    BPlusTree,
    RTree,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub is_primary: bool,
    pub index_kind: IndexKind,
    pub index_name: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary: false,
            index_kind: IndexKind::None,
            index_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self { table_name: table_name.into(), columns }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary)
    }

    /// Byte size of one packed record, excluding the free-list `next_free` field.
    pub fn record_size(&self) -> usize {
        self.columns.iter().map(|c| c.data_type.packed_size()).sum()
    }
}

/// A runtime value flowing through the parser, executor, and indexes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Varchar(String),
    Bool(bool),
    Point(f64, f64),
    /// Axis-aligned rectangle (xmin, ymin, xmax, ymax) — a query-only shape,
    /// never stored in a record.
    Rect(f64, f64, f64, f64),
    /// Circle (cx, cy, r) — a query-only shape.
    Circle(f64, f64, f64),
    /// (x, y, k) for a k-nearest-neighbors query — query-only.
    Knn(f64, f64, i64),
}

impl Value {
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Varchar(_) => Some(DataType::Varchar(0)),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Point(_, _) => Some(DataType::Point),
            Value::Rect(..) | Value::Circle(..) | Value::Knn(..) => None,
        }
    }

    /// Structural equality ignoring Varchar's length tag on `DataType`.
    pub fn matches_type(&self, dt: DataType) -> bool {
        matches!(
            (self, dt),
            (Value::Int(_), DataType::Int)
                | (Value::Float(_), DataType::Float)
                | (Value::Varchar(_), DataType::Varchar(_))
                | (Value::Bool(_), DataType::Bool)
                | (Value::Point(_, _), DataType::Point)
        )
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn partial_cmp_value(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Varchar(a), Value::Varchar(b)) => a.partial_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp_value(other) == Some(std::cmp::Ordering::Equal)
    }
}

/// Per-type sentinel used as the "empty"/padding value, grounded on the
/// original engine's `get_empty_value`.
pub fn empty_value(dt: DataType) -> Value {
    match dt {
        DataType::Int => Value::Int(-1),
        DataType::Float => Value::Float(-1.0),
        DataType::Varchar(_) => Value::Varchar(String::new()),
        DataType::Date => Value::Int(-1),
        DataType::Bool => Value::Bool(false),
        DataType::Point => Value::Point(0.0, 0.0),
    }
}

/// Per-type minimum sentinel used to replace an absent lower bound in a
/// range search, grounded on the original engine's `get_min_value`. INT/DATE
/// stay within the 32-bit range their packed representation can hold (see
/// `packed_size`/`pack_value`).
pub fn min_value(dt: DataType) -> Value {
    match dt {
        DataType::Int | DataType::Date => Value::Int(i32::MIN as i64 + 1),
        DataType::Float => Value::Float(-1e18),
        DataType::Varchar(_) => Value::Varchar(String::new()),
        DataType::Bool => Value::Bool(false),
        DataType::Point => Value::Point(f64::MIN, f64::MIN),
    }
}

/// Per-type maximum sentinel used to replace an absent upper bound in a
/// range search, grounded on the original engine's `get_max_value`.
pub fn max_value(dt: DataType) -> Value {
    match dt {
        DataType::Int | DataType::Date => Value::Int(i32::MAX as i64 - 1),
        DataType::Float => Value::Float(1e18),
        DataType::Varchar(_) => Value::Varchar("\u{10FFFF}".repeat(10)),
        DataType::Bool => Value::Bool(true),
        DataType::Point => Value::Point(f64::MAX, f64::MAX),
    }
}

/// A single row's values, in schema column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

/// Validates a value against a column's declared type (and, for Varchar,
/// its declared length, and for Int/Date, the 32-bit range its on-disk
/// packed form can hold), returning a type-checked value.
pub fn check_value(column: &Column, value: Value) -> Result<Value> {
    if !value.matches_type(column.data_type) {
        return Err(StorageError::TypeError(format!(
            "column '{}' expects {:?}, got {:?}",
            column.name, column.data_type, value
        )));
    }
    if let (DataType::Varchar(len), Value::Varchar(ref s)) = (column.data_type, &value) {
        if s.len() > len as usize {
            return Err(StorageError::DomainError(format!(
                "value '{}' exceeds varchar({}) for column '{}'",
                s, len, column.name
            )));
        }
    }
    if matches!(column.data_type, DataType::Int | DataType::Date) {
        if let Value::Int(v) = value {
            if v < i32::MIN as i64 || v > i32::MAX as i64 {
                return Err(StorageError::DomainError(format!(
                    "value {} exceeds the 32-bit INT range for column '{}'",
                    v, column.name
                )));
            }
        }
    }
    Ok(value)
}

/// Column-name -> value map produced by `INSERT ... (cols) VALUES (...)`
/// before it is reordered into schema order.
pub type NamedValues = HashMap<String, Value>;

/// Packs `value` into `slot`, a byte buffer exactly `dt.packed_size()` wide.
/// Shared by the heap file and every on-disk index structure so all of
/// them agree on one binary encoding per `DataType`. INT/DATE narrow to a
/// 32-bit little-endian integer and FLOAT/POINT to 32-bit IEEE floats;
/// `check_value` has already rejected any `Int` outside `i32`'s range, so
/// the narrowing here is lossless for every value that reaches storage.
pub fn pack_value(dt: DataType, value: &Value, slot: &mut [u8]) {
    match (dt, value) {
        (DataType::Int, Value::Int(v)) | (DataType::Date, Value::Int(v)) => {
            slot.copy_from_slice(&(*v as i32).to_le_bytes());
        }
        (DataType::Float, Value::Float(v)) => {
            slot.copy_from_slice(&(*v as f32).to_le_bytes());
        }
        (DataType::Bool, Value::Bool(v)) => {
            slot[0] = *v as u8;
        }
        (DataType::Point, Value::Point(x, y)) => {
            slot[0..4].copy_from_slice(&(*x as f32).to_le_bytes());
            slot[4..8].copy_from_slice(&(*y as f32).to_le_bytes());
        }
        (DataType::Varchar(len), Value::Varchar(s)) => {
            let bytes = s.as_bytes();
            let n = bytes.len().min(len as usize);
            slot[..n].copy_from_slice(&bytes[..n]);
            for b in slot[n..].iter_mut() {
                *b = 0;
            }
        }
        _ => panic!("value/type mismatch during packing"),
    }
}

/// Inverse of [`pack_value`], widening the 32-bit on-disk form back to
/// `Value`'s `i64`/`f64` representation.
pub fn unpack_value(dt: DataType, slot: &[u8]) -> Value {
    match dt {
        DataType::Int | DataType::Date => Value::Int(i32::from_le_bytes(slot.try_into().unwrap()) as i64),
        DataType::Float => Value::Float(f32::from_le_bytes(slot.try_into().unwrap()) as f64),
        DataType::Bool => Value::Bool(slot[0] != 0),
        DataType::Point => {
            let x = f32::from_le_bytes(slot[0..4].try_into().unwrap()) as f64;
            let y = f32::from_le_bytes(slot[4..8].try_into().unwrap()) as f64;
            Value::Point(x, y)
        }
        DataType::Varchar(_) => {
            let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
            Value::Varchar(String::from_utf8_lossy(&slot[..end]).into_owned())
        }
    }
}
