//! Evaluates a parsed `WHERE`/predicate tree into a [`Bitmap`] of matching
//! record ids, driving each column's index through the shared [`Index`]
//! contract.

use super::bitmap::Bitmap;
use crate::error::{Result, StorageError};
use crate::index::manager::IndexManager;
use crate::index::Index;
use crate::sql::ast::{CompareOp, Condition, Shape};
use crate::storage::RecordFile;
use crate::types::{DataType, TableSchema, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub fn evaluate(
    condition: &Condition,
    schema: &TableSchema,
    table: &str,
    index_mgr: &mut IndexManager,
    record_file: Rc<RefCell<RecordFile>>,
) -> Result<Bitmap> {
    match condition {
        Condition::And(a, b) => {
            let a = evaluate(a, schema, table, index_mgr, record_file.clone())?;
            let b = evaluate(b, schema, table, index_mgr, record_file)?;
            Ok(a.and(&b))
        }
        Condition::Or(a, b) => {
            let a = evaluate(a, schema, table, index_mgr, record_file.clone())?;
            let b = evaluate(b, schema, table, index_mgr, record_file)?;
            Ok(a.or(&b))
        }
        Condition::Not(inner) => {
            let bm = evaluate(inner, schema, table, index_mgr, record_file)?;
            Ok(bm.not())
        }
        Condition::Compare { column, op, value } => {
            let (idx, col) = lookup_column(schema, column)?;
            check_operand_type(col, value)?;
            let handle = index_mgr.get(table, col, idx, record_file)?;
            match op {
                CompareOp::Eq => Ok(Bitmap::from_ids(&handle.search(value)?)),
                CompareOp::Ne => Ok(Bitmap::universe().diff(&Bitmap::from_ids(&handle.search(value)?))),
                CompareOp::Le => Ok(Bitmap::from_ids(&handle.range_search(None, Some(value.clone()))?)),
                CompareOp::Ge => Ok(Bitmap::from_ids(&handle.range_search(Some(value.clone()), None)?)),
                CompareOp::Lt => {
                    let le = Bitmap::from_ids(&handle.range_search(None, Some(value.clone()))?);
                    let eq = Bitmap::from_ids(&handle.search(value)?);
                    Ok(le.diff(&eq))
                }
                CompareOp::Gt => {
                    let ge = Bitmap::from_ids(&handle.range_search(Some(value.clone()), None)?);
                    let eq = Bitmap::from_ids(&handle.search(value)?);
                    Ok(ge.diff(&eq))
                }
            }
        }
        Condition::Between { column, lo, hi } => {
            let (idx, col) = lookup_column(schema, column)?;
            if col.data_type == DataType::Point {
                return Err(StorageError::TypeError(format!(
                    "column '{}': BETWEEN is not supported on POINT columns",
                    col.name
                )));
            }
            check_operand_type(col, lo)?;
            check_operand_type(col, hi)?;
            let handle = index_mgr.get(table, col, idx, record_file)?;
            Ok(Bitmap::from_ids(&handle.range_search(Some(lo.clone()), Some(hi.clone()))?))
        }
        Condition::Within { column, shape } => {
            let (idx, col) = lookup_column(schema, column)?;
            check_point_column(col)?;
            let handle = index_mgr.get(table, col, idx, record_file)?;
            let ids = match *shape {
                Shape::Rectangle(xmin, ymin, xmax, ymax) => {
                    if xmin > xmax || ymin > ymax {
                        return Err(StorageError::DomainError(format!(
                            "invalid MBR ({}, {}, {}, {}): min must not exceed max",
                            xmin, ymin, xmax, ymax
                        )));
                    }
                    handle.range_search_rect((xmin, ymin, xmax, ymax))?
                }
                Shape::Circle(cx, cy, r) => {
                    if r < 0.0 {
                        return Err(StorageError::DomainError(format!("negative circle radius: {}", r)));
                    }
                    handle.range_search_circle((cx, cy, r))?
                }
            };
            Ok(Bitmap::from_ids(&ids))
        }
        Condition::Knn { column, x, y, k } => {
            let (idx, col) = lookup_column(schema, column)?;
            check_point_column(col)?;
            if *k <= 0 {
                return Err(StorageError::DomainError(format!("non-positive k in KNN: {}", k)));
            }
            let handle = index_mgr.get(table, col, idx, record_file)?;
            let ids = handle.knn_search(*x, *y, *k as usize)?;
            Ok(Bitmap::from_ids(&ids))
        }
        Condition::BooleanColumn(column) => {
            let (idx, col) = lookup_column(schema, column)?;
            if col.data_type != DataType::Bool {
                return Err(StorageError::TypeError(format!(
                    "column '{}' is not BOOL and cannot be used as a bare predicate",
                    col.name
                )));
            }
            let handle = index_mgr.get(table, col, idx, record_file)?;
            Ok(Bitmap::from_ids(&handle.search(&Value::Bool(true))?))
        }
    }
}

fn lookup_column<'a>(schema: &'a TableSchema, name: &str) -> Result<(usize, &'a crate::types::Column)> {
    let idx = schema.column_index(name).ok_or_else(|| StorageError::ColumnNotFound(name.to_string()))?;
    Ok((idx, &schema.columns[idx]))
}

/// Enforces the right-hand operand's inferred type matching the column's
/// declared type; a type mismatch is a runtime error, not an empty result.
fn check_operand_type(col: &crate::types::Column, value: &Value) -> Result<()> {
    if !value.matches_type(col.data_type) {
        return Err(StorageError::TypeError(format!(
            "column '{}' expects {:?}, got {:?}",
            col.name, col.data_type, value
        )));
    }
    Ok(())
}

fn check_point_column(col: &crate::types::Column) -> Result<()> {
    if col.data_type != DataType::Point {
        return Err(StorageError::TypeError(format!(
            "column '{}' is not POINT and cannot be used in a spatial predicate",
            col.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::CompareOp;
    use crate::types::{Column, DataType, IndexKind, Record, Value};

    fn setup() -> (tempfile::TempDir, TableSchema, IndexManager, Rc<RefCell<RecordFile>>) {
        let dir = tempfile::tempdir().unwrap();
        let mut columns = vec![Column::new("id", DataType::Int), Column::new("age", DataType::Int)];
        columns[1].index_kind = IndexKind::Avl;
        let schema = TableSchema::new("people", columns);
        let rf_path = dir.path().join("people").join("people.dat");
        std::fs::create_dir_all(rf_path.parent().unwrap()).unwrap();
        let record_file = Rc::new(RefCell::new(RecordFile::open(rf_path, schema.clone()).unwrap()));
        for (id, age) in [(0, 10), (1, 20), (2, 20), (3, 30)] {
            let pos = record_file.borrow_mut().append(&Record::new(vec![Value::Int(id), Value::Int(age)])).unwrap();
            let mut mgr = IndexManager::new(dir.path());
            let handle = mgr.get("people", &schema.columns[1], 1, record_file.clone()).unwrap();
            handle.insert(pos, &Value::Int(age)).unwrap();
        }
        (dir, schema, IndexManager::new(dir.path().to_path_buf()), record_file)
    }

    #[test]
    fn compare_gt_excludes_equal_values() {
        let (_dir, schema, mut mgr, rf) = setup();
        let cond = Condition::Compare { column: "age".into(), op: CompareOp::Gt, value: Value::Int(20) };
        let bm = evaluate(&cond, &schema, "people", &mut mgr, rf.clone()).unwrap();
        let ids = bm.to_ids(rf.borrow_mut().max_id().unwrap());
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn compare_le_is_inclusive() {
        let (_dir, schema, mut mgr, rf) = setup();
        let cond = Condition::Compare { column: "age".into(), op: CompareOp::Le, value: Value::Int(20) };
        let bm = evaluate(&cond, &schema, "people", &mut mgr, rf.clone()).unwrap();
        let mut ids = bm.to_ids(rf.borrow_mut().max_id().unwrap());
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn and_intersects_two_predicates() {
        let (_dir, schema, mut mgr, rf) = setup();
        let left = Condition::Compare { column: "age".into(), op: CompareOp::Ge, value: Value::Int(20) };
        let right = Condition::Compare { column: "age".into(), op: CompareOp::Le, value: Value::Int(20) };
        let cond = Condition::And(Box::new(left), Box::new(right));
        let bm = evaluate(&cond, &schema, "people", &mut mgr, rf.clone()).unwrap();
        let mut ids = bm.to_ids(rf.borrow_mut().max_id().unwrap());
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn compare_against_the_wrong_type_is_a_type_error() {
        let (_dir, schema, mut mgr, rf) = setup();
        let cond = Condition::Compare { column: "age".into(), op: CompareOp::Eq, value: Value::Varchar("x".into()) };
        let err = evaluate(&cond, &schema, "people", &mut mgr, rf).unwrap_err();
        assert!(matches!(err, StorageError::TypeError(_)));
    }

    #[test]
    fn between_rejects_mismatched_bound_type() {
        let (_dir, schema, mut mgr, rf) = setup();
        let cond = Condition::Between { column: "age".into(), lo: Value::Int(10), hi: Value::Varchar("z".into()) };
        let err = evaluate(&cond, &schema, "people", &mut mgr, rf).unwrap_err();
        assert!(matches!(err, StorageError::TypeError(_)));
    }

    #[test]
    fn boolean_column_predicate_requires_a_bool_column() {
        let (_dir, schema, mut mgr, rf) = setup();
        let cond = Condition::BooleanColumn("age".into());
        let err = evaluate(&cond, &schema, "people", &mut mgr, rf).unwrap_err();
        assert!(matches!(err, StorageError::TypeError(_)));
    }

    #[test]
    fn knn_and_within_reject_a_non_point_column() {
        let (_dir, schema, mut mgr, rf) = setup();
        let knn = Condition::Knn { column: "age".into(), x: 0.0, y: 0.0, k: 1 };
        assert!(matches!(evaluate(&knn, &schema, "people", &mut mgr, rf.clone()).unwrap_err(), StorageError::TypeError(_)));
        let within = Condition::Within { column: "age".into(), shape: crate::sql::ast::Shape::Circle(0.0, 0.0, 1.0) };
        assert!(matches!(evaluate(&within, &schema, "people", &mut mgr, rf).unwrap_err(), StorageError::TypeError(_)));
    }
}
