//! Statement and condition tree produced by the parser.

use crate::types::Value;

#[derive(Debug, Clone)]
pub enum Statement {
    Select(SelectStmt),
    CreateTable(CreateTableStmt),
    DropTable(DropTableStmt),
    Insert(InsertStmt),
    Delete(DeleteStmt),
    CreateIndex(CreateIndexStmt),
    DropIndex(DropIndexStmt),
}

#[derive(Debug, Clone)]
pub enum SelectColumns {
    All,
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub columns: SelectColumns,
    pub table: String,
    pub condition: Option<Condition>,
    pub order_by: Option<(String, OrderDirection)>,
    pub limit: Option<i64>,
}

/// An index type as written in `CREATE INDEX ... USING <kind>`. `Brin` is
/// parseable (it appears in the grammar) but has no backing structure and
/// is rejected at statement-execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKindSpec {
    None,
    Avl,
    Isam,
    Hash,
    Btree,
    Rtree,
    Brin,
}

#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: crate::types::DataType,
    pub is_primary: bool,
    pub index_kind: Option<IndexKindSpec>,
}

#[derive(Debug, Clone)]
pub struct CreateTableStmt {
    pub table: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone)]
pub struct DropTableStmt {
    pub table: String,
    pub if_exists: bool,
}

#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Option<Vec<String>>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct DeleteStmt {
    pub table: String,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone)]
pub struct CreateIndexStmt {
    pub index_name: String,
    pub table: String,
    pub index_kind: IndexKindSpec,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DropIndexStmt {
    pub index_name: String,
    pub table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Rectangle(f64, f64, f64, f64),
    Circle(f64, f64, f64),
}

/// A parsed `WHERE`/predicate tree, evaluated against a table's bitmaps by
/// [`crate::query`].
#[derive(Debug, Clone)]
pub enum Condition {
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
    Compare { column: String, op: CompareOp, value: Value },
    Between { column: String, lo: Value, hi: Value },
    Within { column: String, shape: Shape },
    Knn { column: String, x: f64, y: f64, k: i64 },
    BooleanColumn(String),
}
