//! `Engine`: the process-local entry point that owns a [`Catalog`] and
//! interprets parsed statements against it. Constructed once at startup and
//! passed to callers (the reference design's alternative to a process-wide
//! singleton `DBManager`).

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::{Result, StorageError};
use crate::index::{Index, IndexHandle};
use crate::query;
use crate::sql::ast::{
    CreateIndexStmt, CreateTableStmt, DeleteStmt, DropIndexStmt, DropTableStmt, IndexKindSpec, InsertStmt,
    OrderDirection, SelectColumns, SelectStmt, Statement,
};
use crate::sql::{Lexer, Parser};
use crate::types::{check_value, Column, IndexKind, Record, TableSchema, Value};

/// A `SELECT`'s reply: column names plus rows in the same order, with any
/// `Point` value rendered as its textual tuple form.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub records: Vec<Vec<Value>>,
}

pub struct Engine {
    catalog: Catalog,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self { catalog: Catalog::new(config.base_dir)? })
    }

    pub fn open(base_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Self::new(EngineConfig::new(base_dir))
    }

    /// Parses and runs every statement in `sql_text`, returning the last
    /// statement's result (if it was a `SELECT`) and a human-readable status
    /// message, mirroring `execute_sql(sql_text) -> (result | none, message)`.
    pub fn execute_sql(&mut self, sql_text: &str) -> Result<(Option<QueryResult>, String)> {
        let tokens = Lexer::new(sql_text).tokenize()?;
        let statements = Parser::new(tokens).parse_all()?;
        let mut result = None;
        let mut message = "OK".to_string();
        for stmt in statements {
            let (r, m) = self.execute_statement(stmt)?;
            result = r;
            message = m;
        }
        Ok((result, message))
    }

    pub fn execute_statement(&mut self, stmt: Statement) -> Result<(Option<QueryResult>, String)> {
        match stmt {
            Statement::CreateTable(s) => {
                self.create_table(s)?;
                Ok((None, "table created".to_string()))
            }
            Statement::DropTable(s) => {
                self.drop_table(s)?;
                Ok((None, "table dropped".to_string()))
            }
            Statement::Insert(s) => {
                self.insert(s)?;
                Ok((None, "1 row inserted".to_string()))
            }
            Statement::Delete(s) => {
                let n = self.delete(s)?;
                Ok((None, format!("{} row(s) deleted", n)))
            }
            Statement::CreateIndex(s) => {
                self.create_index(s)?;
                Ok((None, "index created".to_string()))
            }
            Statement::DropIndex(s) => {
                self.drop_index(s)?;
                Ok((None, "index dropped".to_string()))
            }
            Statement::Select(s) => {
                let result = self.select(s)?;
                let n = result.records.len();
                Ok((Some(result), format!("{} row(s) returned", n)))
            }
        }
    }

    fn create_table(&mut self, stmt: CreateTableStmt) -> Result<()> {
        let table_name = stmt.table.to_lowercase();
        if stmt.if_not_exists && self.catalog.table_exists(&table_name) {
            return Ok(());
        }

        let mut columns = Vec::with_capacity(stmt.columns.len());
        let mut seen = std::collections::HashSet::new();
        let mut primary_count = 0;
        for def in &stmt.columns {
            if !seen.insert(def.name.to_lowercase()) {
                return Err(StorageError::SchemaError(format!("duplicate column '{}'", def.name)));
            }
            if def.is_primary {
                primary_count += 1;
            }
            let mut index_kind = match def.index_kind {
                None => IndexKind::None,
                Some(spec) => spec_to_kind(spec)?,
            };
            if def.is_primary && index_kind == IndexKind::None {
                index_kind = if def.data_type == crate::types::DataType::Point { IndexKind::RTree } else { IndexKind::Hash };
            }
            if index_kind == IndexKind::RTree && def.data_type != crate::types::DataType::Point {
                return Err(StorageError::SchemaError(format!("column '{}': RTREE requires a POINT column", def.name)));
            }
            if def.data_type == crate::types::DataType::Point && index_kind != IndexKind::RTree {
                return Err(StorageError::SchemaError(format!("column '{}': POINT columns only support RTREE", def.name)));
            }
            if let crate::types::DataType::Varchar(len) = def.data_type {
                if len == 0 {
                    return Err(StorageError::SchemaError(format!("column '{}': VARCHAR requires a positive length", def.name)));
                }
            }
            let mut column = Column::new(def.name.clone(), def.data_type);
            column.is_primary = def.is_primary;
            column.index_kind = index_kind;
            columns.push(column);
        }
        if primary_count != 1 {
            return Err(StorageError::SchemaError(format!(
                "table '{}' must have exactly one primary key column, found {}",
                table_name, primary_count
            )));
        }

        let schema = TableSchema::new(table_name, columns);
        self.catalog.create_table(schema)?;
        Ok(())
    }

    fn drop_table(&mut self, stmt: DropTableStmt) -> Result<()> {
        let table = stmt.table.to_lowercase();
        if stmt.if_exists && !self.catalog.table_exists(&table) {
            return Ok(());
        }
        self.catalog.drop_table(&table)
    }

    fn insert(&mut self, stmt: InsertStmt) -> Result<()> {
        let table = stmt.table.to_lowercase();
        let schema = self.catalog.schema(&table)?.clone();

        let values = match stmt.columns {
            None => {
                if stmt.values.len() != schema.columns.len() {
                    return Err(StorageError::SchemaError(format!(
                        "expected {} values, got {}",
                        schema.columns.len(),
                        stmt.values.len()
                    )));
                }
                stmt.values
            }
            Some(names) => {
                if names.len() != stmt.values.len() {
                    return Err(StorageError::SchemaError("column list and value list lengths differ".to_string()));
                }
                let mut ordered: Vec<Option<Value>> = vec![None; schema.columns.len()];
                for (name, value) in names.into_iter().zip(stmt.values.into_iter()) {
                    let idx = schema
                        .column_index(&name)
                        .ok_or_else(|| StorageError::ColumnNotFound(name.clone()))?;
                    if ordered[idx].is_some() {
                        return Err(StorageError::SchemaError(format!("duplicate column '{}' in INSERT", name)));
                    }
                    ordered[idx] = Some(value);
                }
                ordered
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.ok_or_else(|| StorageError::SchemaError(format!("missing value for column '{}'", schema.columns[i].name))))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let mut checked = Vec::with_capacity(values.len());
        for (col, value) in schema.columns.iter().zip(values.into_iter()) {
            checked.push(check_value(col, value)?);
        }

        let record_file = self.catalog.record_file(&table)?;
        let slot = record_file.borrow_mut().append(&Record::new(checked.clone()))?;

        for (i, col) in schema.columns.iter().enumerate() {
            let handle = self.catalog.index_manager().get(&table, col, i, record_file.clone())?;
            handle.insert(slot, &checked[i])?;
        }
        Ok(())
    }

    fn delete(&mut self, stmt: DeleteStmt) -> Result<usize> {
        let table = stmt.table.to_lowercase();
        let schema = self.catalog.schema(&table)?.clone();
        let record_file = self.catalog.record_file(&table)?;

        let ids = match &stmt.condition {
            Some(cond) => {
                let bm = query::evaluate(cond, &schema, &table, self.catalog.index_manager(), record_file.clone())?;
                let max_id = record_file.borrow_mut().max_id()?;
                bm.to_ids(max_id)
            }
            None => {
                let max_id = record_file.borrow_mut().max_id()?;
                (0..max_id).filter(|&id| record_file.borrow_mut().read(id).map(|r| r.is_some()).unwrap_or(false)).collect()
            }
        };

        let mut deleted = 0;
        for slot in ids {
            let record = match record_file.borrow_mut().read(slot)? {
                Some(r) => r,
                None => continue,
            };
            record_file.borrow_mut().delete(slot)?;
            for (i, col) in schema.columns.iter().enumerate() {
                let handle = self.catalog.index_manager().get(&table, col, i, record_file.clone())?;
                handle.delete(&record.values[i])?;
            }
            deleted += 1;
        }
        Ok(deleted)
    }

    fn select(&mut self, stmt: SelectStmt) -> Result<QueryResult> {
        let table = stmt.table.to_lowercase();
        let schema = self.catalog.schema(&table)?.clone();
        let record_file = self.catalog.record_file(&table)?;

        let limit = match stmt.limit {
            Some(n) if n <= 0 => {
                return Err(StorageError::DomainError(format!("non-positive LIMIT: {}", n)));
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let ids = match &stmt.condition {
            Some(cond) => {
                let bm = query::evaluate(cond, &schema, &table, self.catalog.index_manager(), record_file.clone())?;
                let max_id = record_file.borrow_mut().max_id()?;
                bm.to_ids(max_id)
            }
            None => {
                let max_id = record_file.borrow_mut().max_id()?;
                let mut out = Vec::new();
                for id in 0..max_id {
                    if record_file.borrow_mut().read(id)?.is_some() {
                        out.push(id);
                    }
                }
                out
            }
        };

        let mut rows: Vec<Record> = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = record_file.borrow_mut().read(id)? {
                rows.push(record);
            }
        }

        let projection: Vec<usize> = match &stmt.columns {
            SelectColumns::All => (0..schema.columns.len()).collect(),
            SelectColumns::List(names) => {
                let mut seen = std::collections::HashSet::new();
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    if !seen.insert(name.to_lowercase()) {
                        return Err(StorageError::SchemaError(format!("duplicate column '{}' in SELECT list", name)));
                    }
                    indices.push(schema.column_index(name).ok_or_else(|| StorageError::ColumnNotFound(name.clone()))?);
                }
                indices
            }
        };

        if let Some((order_col, dir)) = &stmt.order_by {
            let order_idx = schema.column_index(order_col).ok_or_else(|| StorageError::ColumnNotFound(order_col.clone()))?;
            order_rows(&mut rows, order_idx, *dir, limit);
        }

        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        let columns = projection.iter().map(|&i| schema.columns[i].name.clone()).collect();
        let records = rows
            .into_iter()
            .map(|r| projection.iter().map(|&i| render_value(&r.values[i])).collect())
            .collect();

        Ok(QueryResult { columns, records })
    }

    fn create_index(&mut self, stmt: CreateIndexStmt) -> Result<()> {
        let table = stmt.table.to_lowercase();
        if stmt.columns.len() != 1 {
            return Err(StorageError::NotImplemented("composite indexes are not supported".to_string()));
        }
        let column_name = &stmt.columns[0];
        let mut schema = self.catalog.schema(&table)?.clone();
        let col_idx = schema.column_index(column_name).ok_or_else(|| StorageError::ColumnNotFound(column_name.clone()))?;

        if schema.columns[col_idx].index_kind != IndexKind::None {
            return Err(StorageError::IndexAlreadyExists(format!("{}.{}", table, column_name)));
        }
        let new_kind = spec_to_kind(stmt.index_kind)?;
        if new_kind == IndexKind::RTree && schema.columns[col_idx].data_type != crate::types::DataType::Point {
            return Err(StorageError::SchemaError("RTREE requires a POINT column".to_string()));
        }
        if schema.columns[col_idx].data_type == crate::types::DataType::Point && new_kind != IndexKind::RTree {
            return Err(StorageError::SchemaError("POINT columns only support RTREE".to_string()));
        }

        // Bulk-load the new structure from existing slots before the schema
        // is updated, so a failed build never leaves the column flagged as
        // indexed without a backing structure.
        let record_file = self.catalog.record_file(&table)?;
        let max_id = record_file.borrow_mut().max_id()?;
        let mut pairs = Vec::new();
        for slot in 0..max_id {
            if let Some(record) = record_file.borrow_mut().read(slot)? {
                pairs.push((record.values[col_idx].clone(), slot));
            }
        }

        schema.columns[col_idx].index_kind = new_kind;
        schema.columns[col_idx].index_name = Some(stmt.index_name.clone());
        self.catalog.index_manager().invalidate(&table, column_name);

        {
            let handle = self.catalog.index_manager().get(&table, &schema.columns[col_idx], col_idx, record_file.clone())?;
            handle.clear()?;
            if new_kind == IndexKind::Isam {
                handle_build_isam(handle, pairs)?;
            } else {
                for (value, slot) in pairs {
                    handle.insert(slot, &value)?;
                }
            }
        }

        self.catalog.update_schema(&table, schema)?;
        Ok(())
    }

    fn drop_index(&mut self, stmt: DropIndexStmt) -> Result<()> {
        let table = stmt.table.to_lowercase();
        let mut schema = self.catalog.schema(&table)?.clone();
        let col_idx = schema
            .columns
            .iter()
            .position(|c| c.index_name.as_deref() == Some(stmt.index_name.as_str()))
            .ok_or_else(|| StorageError::IndexNotFound(stmt.index_name.clone()))?;

        if schema.columns[col_idx].index_kind == IndexKind::None {
            return Err(StorageError::IndexNotFound(stmt.index_name.clone()));
        }
        if schema.columns[col_idx].is_primary {
            return Err(StorageError::SchemaError("cannot drop the primary key's index".to_string()));
        }

        let column_name = schema.columns[col_idx].name.clone();
        let record_file = self.catalog.record_file(&table)?;
        {
            let handle = self.catalog.index_manager().get(&table, &schema.columns[col_idx], col_idx, record_file)?;
            handle.clear()?;
        }
        self.catalog.index_manager().invalidate(&table, &column_name);

        schema.columns[col_idx].index_kind = IndexKind::None;
        schema.columns[col_idx].index_name = None;
        self.catalog.update_schema(&table, schema)?;
        Ok(())
    }
}

fn handle_build_isam(handle: &mut IndexHandle, mut pairs: Vec<(Value, i64)>) -> Result<()> {
    pairs.sort_by(|a, b| a.0.partial_cmp_value(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    handle.build_isam(pairs)
}

fn spec_to_kind(spec: IndexKindSpec) -> Result<IndexKind> {
    match spec {
        IndexKindSpec::None => Ok(IndexKind::None),
        IndexKindSpec::Avl => Ok(IndexKind::Avl),
        IndexKindSpec::Isam => Ok(IndexKind::Isam),
        IndexKindSpec::Hash => Ok(IndexKind::Hash),
        IndexKindSpec::Btree => Ok(IndexKind::BPlusTree),
        IndexKindSpec::Rtree => Ok(IndexKind::RTree),
        IndexKindSpec::Brin => Err(StorageError::NotImplemented("BRIN indexes are not implemented".to_string())),
    }
}

fn render_value(value: &Value) -> Value {
    match value {
        Value::Point(x, y) => Value::Varchar(format!("({}, {})", x, y)),
        other => other.clone(),
    }
}

/// Orders `rows` by column `idx`. When `limit` is given and smaller than
/// half the candidate set, takes a bounded partial selection instead of
/// sorting the whole vector.
fn order_rows(rows: &mut Vec<Record>, idx: usize, dir: OrderDirection, limit: Option<usize>) {
    let cmp = |a: &Record, b: &Record| {
        let ord = a.values[idx].partial_cmp_value(&b.values[idx]).unwrap_or(std::cmp::Ordering::Equal);
        match dir {
            OrderDirection::Asc => ord,
            OrderDirection::Desc => ord.reverse(),
        }
    };

    if let Some(limit) = limit {
        let limit = limit.min(rows.len());
        if limit > 0 && limit < rows.len() / 2 {
            rows.select_nth_unstable_by(limit.saturating_sub(1).min(rows.len().saturating_sub(1)), cmp);
            rows.truncate(limit);
        }
    }
    rows.sort_by(cmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (tempfile::TempDir, Engine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::open(dir.path()).unwrap();
        (dir, engine)
    }

    #[test]
    fn create_insert_select_roundtrip() {
        let (_dir, mut engine) = engine();
        engine
            .execute_sql("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR(16));")
            .unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1, 'a');").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (2, 'b');").unwrap();
        let (result, _msg) = engine.execute_sql("SELECT * FROM t WHERE id = 2;").unwrap();
        let result = result.unwrap();
        assert_eq!(result.columns, vec!["id", "name"]);
        assert_eq!(result.records, vec![vec![Value::Int(2), Value::Varchar("b".into())]]);
    }

    #[test]
    fn delete_removes_from_every_column_index() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, age INT INDEX AVL);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1, 30);").unwrap();
        engine.execute_sql("DELETE FROM t WHERE id = 1;").unwrap();
        let (result, _) = engine.execute_sql("SELECT * FROM t WHERE age = 30;").unwrap();
        assert!(result.unwrap().records.is_empty());
    }

    #[test]
    fn create_index_rejects_point_mismatch() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, loc POINT INDEX RTREE);").unwrap();
        let err = engine.execute_sql("CREATE INDEX idx ON t USING BTREE (loc);");
        assert!(err.is_err());
    }

    #[test]
    fn order_by_with_limit_returns_correct_top_k() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, score FLOAT);").unwrap();
        for (id, score) in [(1, 5.0), (2, 1.0), (3, 9.0), (4, 3.0)] {
            engine.execute_sql(&format!("INSERT INTO t VALUES ({}, {:.1});", id, score)).unwrap();
        }
        let (result, _) = engine.execute_sql("SELECT id FROM t ORDER BY score ASC LIMIT 2;").unwrap();
        let ids: Vec<_> = result.unwrap().records.into_iter().map(|r| r[0].clone()).collect();
        assert_eq!(ids, vec![Value::Int(2), Value::Int(4)]);
    }

    #[test]
    fn drop_table_then_recreate_starts_empty() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1);").unwrap();
        engine.execute_sql("DROP TABLE t;").unwrap();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY);").unwrap();
        let (result, _) = engine.execute_sql("SELECT * FROM t;").unwrap();
        assert!(result.unwrap().records.is_empty());
    }

    #[test]
    fn s1_btree_indexed_float_column_exact_match() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, x FLOAT INDEX BTREE);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1, 1.5); INSERT INTO t VALUES (2, 2.5);").unwrap();
        let (result, _) = engine.execute_sql("SELECT x FROM t WHERE id = 2;").unwrap();
        let result = result.unwrap();
        assert_eq!(result.columns, vec!["x"]);
        assert_eq!(result.records, vec![vec![Value::Float(2.5)]]);
    }

    #[test]
    fn s2_between_is_inclusive_on_both_ends() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, x FLOAT INDEX BTREE);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1, 1.5); INSERT INTO t VALUES (2, 2.5);").unwrap();
        let (result, _) = engine.execute_sql("SELECT * FROM t WHERE x BETWEEN 1.0 AND 2.0;").unwrap();
        assert_eq!(result.unwrap().records, vec![vec![Value::Int(1), Value::Float(1.5)]]);
    }

    #[test]
    fn s3_rtree_within_circle() {
        let (_dir, mut engine) = engine();
        engine
            .execute_sql("CREATE TABLE p (id INT PRIMARY KEY, loc POINT INDEX RTREE);")
            .unwrap();
        engine
            .execute_sql(
                "INSERT INTO p VALUES (1, (0.0, 0.0)); \
                 INSERT INTO p VALUES (2, (3.0, 4.0)); \
                 INSERT INTO p VALUES (3, (10.0, 10.0));",
            )
            .unwrap();
        let (result, _) = engine
            .execute_sql("SELECT id FROM p WHERE loc WITHIN CIRCLE (0.0, 0.0, 5.0);")
            .unwrap();
        let mut ids: Vec<_> = result.unwrap().records.into_iter().map(|r| r[0].clone()).collect();
        ids.sort_by_key(|v| match v {
            Value::Int(n) => *n,
            _ => 0,
        });
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn s4_rtree_knn_returns_the_two_nearest() {
        let (_dir, mut engine) = engine();
        engine
            .execute_sql("CREATE TABLE p (id INT PRIMARY KEY, loc POINT INDEX RTREE);")
            .unwrap();
        engine
            .execute_sql(
                "INSERT INTO p VALUES (1, (0.0, 0.0)); \
                 INSERT INTO p VALUES (2, (3.0, 4.0)); \
                 INSERT INTO p VALUES (3, (10.0, 10.0));",
            )
            .unwrap();
        let (result, _) = engine.execute_sql("SELECT id FROM p WHERE loc KNN (0.0, 0.0, 2);").unwrap();
        let mut ids: Vec<_> = result.unwrap().records.into_iter().map(|r| r[0].clone()).collect();
        ids.sort_by_key(|v| match v {
            Value::Int(n) => *n,
            _ => 0,
        });
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn s5_delete_then_insert_reuses_the_free_slot() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY, x FLOAT INDEX BTREE);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1, 1.5); INSERT INTO t VALUES (2, 2.5);").unwrap();
        engine.execute_sql("DELETE FROM t WHERE id = 1; INSERT INTO t VALUES (3, 3.5);").unwrap();
        let (result, _) = engine.execute_sql("SELECT * FROM t ORDER BY id ASC;").unwrap();
        assert_eq!(
            result.unwrap().records,
            vec![
                vec![Value::Int(2), Value::Float(2.5)],
                vec![Value::Int(3), Value::Float(3.5)],
            ]
        );
    }

    #[test]
    fn s6_hash_index_exact_match_survives_a_bucket_split() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE h (k VARCHAR(4) PRIMARY KEY);").unwrap();
        engine.execute_sql("INSERT INTO h VALUES ('abc'); INSERT INTO h VALUES ('abd');").unwrap();
        let (result, _) = engine.execute_sql("SELECT * FROM h WHERE k = 'abc';").unwrap();
        assert_eq!(result.unwrap().records, vec![vec![Value::Varchar("abc".into())]]);
    }

    #[test]
    fn select_rejects_non_positive_limit() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1);").unwrap();
        assert!(engine.execute_sql("SELECT * FROM t LIMIT 0;").is_err());
        assert!(engine.execute_sql("SELECT * FROM t LIMIT -1;").is_err());
    }

    #[test]
    fn where_clause_type_mismatch_is_a_runtime_error() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY);").unwrap();
        engine.execute_sql("INSERT INTO t VALUES (1);").unwrap();
        assert!(engine.execute_sql("SELECT * FROM t WHERE id = 'abc';").is_err());
    }

    #[test]
    fn between_is_rejected_on_a_point_column() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE p (id INT PRIMARY KEY, loc POINT INDEX RTREE);").unwrap();
        engine.execute_sql("INSERT INTO p VALUES (1, (0.0, 0.0));").unwrap();
        assert!(engine.execute_sql("SELECT * FROM p WHERE loc BETWEEN 0.0 AND 1.0;").is_err());
    }

    #[test]
    fn knn_rejects_non_positive_k_and_circle_rejects_negative_radius() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE p (id INT PRIMARY KEY, loc POINT INDEX RTREE);").unwrap();
        engine.execute_sql("INSERT INTO p VALUES (1, (0.0, 0.0));").unwrap();
        assert!(engine.execute_sql("SELECT id FROM p WHERE loc KNN (0.0, 0.0, 0);").is_err());
        assert!(engine.execute_sql("SELECT id FROM p WHERE loc WITHIN CIRCLE (0.0, 0.0, -1.0);").is_err());
    }

    #[test]
    fn insert_rejects_int_value_outside_32_bit_range() {
        let (_dir, mut engine) = engine();
        engine.execute_sql("CREATE TABLE t (id INT PRIMARY KEY);").unwrap();
        assert!(engine.execute_sql("SELECT * FROM t;").unwrap().0.unwrap().records.is_empty());
        assert!(engine.execute_sql("INSERT INTO t VALUES (5000000000);").is_err());
    }
}
