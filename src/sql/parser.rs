//! Recursive-descent parser: token stream -> statement tree.
//!
//! Condition precedence, low to high: `OR` > `AND` > `NOT` > primary.

use super::ast::*;
use super::token::{Token, TokenType};
use crate::error::{Result, StorageError};
use crate::types::{DataType, Value};

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, position: 0 }
    }

    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = match &self.current().token_type {
            TokenType::Select => Statement::Select(self.parse_select()?),
            TokenType::Insert => Statement::Insert(self.parse_insert()?),
            TokenType::Delete => Statement::Delete(self.parse_delete()?),
            TokenType::Create => self.parse_create()?,
            TokenType::Drop => self.parse_drop()?,
            _ => return Err(self.error("expected SELECT, INSERT, DELETE, CREATE, or DROP")),
        };
        if matches!(self.current().token_type, TokenType::Semicolon) {
            self.advance();
        }
        Ok(stmt)
    }

    /// Parses every statement in `sql`, each terminated by `;`.
    pub fn parse_all(&mut self) -> Result<Vec<Statement>> {
        let mut stmts = Vec::new();
        while !matches!(self.current().token_type, TokenType::Eof) {
            stmts.push(self.parse()?);
        }
        Ok(stmts)
    }

    fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect(TokenType::Select)?;
        let columns = if self.match_token(TokenType::Star) {
            SelectColumns::All
        } else {
            SelectColumns::List(self.parse_ident_list()?)
        };

        self.expect(TokenType::From)?;
        let table = self.parse_identifier()?;

        let condition = if self.match_token(TokenType::Where) { Some(self.parse_or()?) } else { None };

        let order_by = if self.match_token(TokenType::Order) {
            self.expect(TokenType::By)?;
            let col = self.parse_identifier()?;
            let dir = if self.match_token(TokenType::Asc) {
                OrderDirection::Asc
            } else if self.match_token(TokenType::Desc) {
                OrderDirection::Desc
            } else {
                OrderDirection::Asc
            };
            Some((col, dir))
        } else {
            None
        };

        let limit = if self.match_token(TokenType::Limit) { Some(self.parse_int()?) } else { None };

        Ok(SelectStmt { columns, table, condition, order_by, limit })
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(TokenType::Create)?;
        match self.current().token_type {
            TokenType::Table => Ok(Statement::CreateTable(self.parse_create_table()?)),
            TokenType::Index => Ok(Statement::CreateIndex(self.parse_create_index()?)),
            _ => Err(self.error("expected TABLE or INDEX after CREATE")),
        }
    }

    fn parse_create_table(&mut self) -> Result<CreateTableStmt> {
        self.expect(TokenType::Table)?;
        let if_not_exists = if self.match_token(TokenType::If) {
            self.expect(TokenType::Not)?;
            self.expect(TokenType::Exists)?;
            true
        } else {
            false
        };
        let table = self.parse_identifier()?;
        self.expect(TokenType::LParen)?;
        let mut columns = vec![self.parse_column_def()?];
        while self.match_token(TokenType::Comma) {
            columns.push(self.parse_column_def()?);
        }
        self.expect(TokenType::RParen)?;
        Ok(CreateTableStmt { table, if_not_exists, columns })
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.parse_identifier()?;
        let data_type = self.parse_datatype()?;
        let is_primary = if self.match_token(TokenType::Primary) {
            self.expect(TokenType::Key)?;
            true
        } else {
            false
        };
        let index_kind = if self.match_token(TokenType::Index) { Some(self.parse_index_kind()?) } else { None };
        Ok(ColumnDef { name, data_type, is_primary, index_kind })
    }

    fn parse_datatype(&mut self) -> Result<DataType> {
        let dt = match self.current().token_type {
            TokenType::Int => {
                self.advance();
                DataType::Int
            }
            TokenType::Float => {
                self.advance();
                DataType::Float
            }
            TokenType::Date => {
                self.advance();
                DataType::Date
            }
            TokenType::Bool => {
                self.advance();
                DataType::Bool
            }
            TokenType::Point => {
                self.advance();
                DataType::Point
            }
            TokenType::Varchar => {
                self.advance();
                self.expect(TokenType::LParen)?;
                let len = self.parse_int()?;
                self.expect(TokenType::RParen)?;
                DataType::Varchar(len as u16)
            }
            _ => return Err(self.error("expected a data type")),
        };
        Ok(dt)
    }

    fn parse_index_kind(&mut self) -> Result<IndexKindSpec> {
        let kind = match self.current().token_type {
            TokenType::Avl => IndexKindSpec::Avl,
            TokenType::Isam => IndexKindSpec::Isam,
            TokenType::Hash => IndexKindSpec::Hash,
            TokenType::Btree => IndexKindSpec::Btree,
            TokenType::Rtree => IndexKindSpec::Rtree,
            TokenType::Brin => IndexKindSpec::Brin,
            _ => return Err(self.error("expected an index type (AVL, ISAM, HASH, BTREE, RTREE, BRIN)")),
        };
        self.advance();
        Ok(kind)
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(TokenType::Drop)?;
        match self.current().token_type {
            TokenType::Table => {
                self.advance();
                let if_exists = if self.match_token(TokenType::If) {
                    self.expect(TokenType::Exists)?;
                    true
                } else {
                    false
                };
                let table = self.parse_identifier()?;
                Ok(Statement::DropTable(DropTableStmt { table, if_exists }))
            }
            TokenType::Index => {
                self.advance();
                let index_name = self.parse_identifier()?;
                self.expect(TokenType::On)?;
                let table = self.parse_identifier()?;
                Ok(Statement::DropIndex(DropIndexStmt { index_name, table }))
            }
            _ => Err(self.error("expected TABLE or INDEX after DROP")),
        }
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexStmt> {
        self.expect(TokenType::Index)?;
        let index_name = self.parse_identifier()?;
        self.expect(TokenType::On)?;
        let table = self.parse_identifier()?;
        let index_kind = if self.match_token(TokenType::Using) { self.parse_index_kind()? } else { IndexKindSpec::None };
        self.expect(TokenType::LParen)?;
        let columns = self.parse_ident_list()?;
        self.expect(TokenType::RParen)?;
        Ok(CreateIndexStmt { index_name, table, index_kind, columns })
    }

    fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect(TokenType::Insert)?;
        self.expect(TokenType::Into)?;
        let table = self.parse_identifier()?;
        let columns = if matches!(self.current().token_type, TokenType::LParen) {
            self.advance();
            let cols = self.parse_ident_list()?;
            self.expect(TokenType::RParen)?;
            Some(cols)
        } else {
            None
        };
        self.expect(TokenType::Values)?;
        self.expect(TokenType::LParen)?;
        let mut values = vec![self.parse_value()?];
        while self.match_token(TokenType::Comma) {
            values.push(self.parse_value()?);
        }
        self.expect(TokenType::RParen)?;
        Ok(InsertStmt { table, columns, values })
    }

    fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect(TokenType::Delete)?;
        self.expect(TokenType::From)?;
        let table = self.parse_identifier()?;
        let condition = if self.match_token(TokenType::Where) { Some(self.parse_or()?) } else { None };
        Ok(DeleteStmt { table, condition })
    }

    // --- condition grammar: or_cond -> and_cond -> not_cond -> predicate ---

    fn parse_or(&mut self) -> Result<Condition> {
        let mut lhs = self.parse_and()?;
        while self.match_token(TokenType::Or) {
            let rhs = self.parse_and()?;
            lhs = Condition::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Condition> {
        let mut lhs = self.parse_not()?;
        while self.match_token(TokenType::And) {
            let rhs = self.parse_not()?;
            lhs = Condition::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Condition> {
        if self.match_token(TokenType::Not) {
            Ok(Condition::Not(Box::new(self.parse_predicate()?)))
        } else {
            self.parse_predicate()
        }
    }

    fn parse_predicate(&mut self) -> Result<Condition> {
        if self.match_token(TokenType::LParen) {
            let inner = self.parse_or()?;
            self.expect(TokenType::RParen)?;
            return Ok(inner);
        }

        let column = self.parse_identifier()?;

        if self.match_token(TokenType::Between) {
            let lo = self.parse_value()?;
            self.expect(TokenType::And)?;
            let hi = self.parse_value()?;
            return Ok(Condition::Between { column, lo, hi });
        }

        if self.match_token(TokenType::Within) {
            let shape = if self.match_token(TokenType::Rectangle) {
                self.expect(TokenType::LParen)?;
                let xmin = self.parse_float()?;
                self.expect(TokenType::Comma)?;
                let ymin = self.parse_float()?;
                self.expect(TokenType::Comma)?;
                let xmax = self.parse_float()?;
                self.expect(TokenType::Comma)?;
                let ymax = self.parse_float()?;
                self.expect(TokenType::RParen)?;
                Shape::Rectangle(xmin, ymin, xmax, ymax)
            } else if self.match_token(TokenType::Circle) {
                self.expect(TokenType::LParen)?;
                let cx = self.parse_float()?;
                self.expect(TokenType::Comma)?;
                let cy = self.parse_float()?;
                self.expect(TokenType::Comma)?;
                let r = self.parse_float()?;
                self.expect(TokenType::RParen)?;
                Shape::Circle(cx, cy, r)
            } else {
                return Err(self.error("expected RECTANGLE or CIRCLE after WITHIN"));
            };
            return Ok(Condition::Within { column, shape });
        }

        if self.match_token(TokenType::Knn) {
            self.expect(TokenType::LParen)?;
            let x = self.parse_float()?;
            self.expect(TokenType::Comma)?;
            let y = self.parse_float()?;
            self.expect(TokenType::Comma)?;
            let k = self.parse_int()?;
            self.expect(TokenType::RParen)?;
            return Ok(Condition::Knn { column, x, y, k });
        }

        if let Some(op) = self.match_compare_op() {
            let value = self.parse_value()?;
            return Ok(Condition::Compare { column, op, value });
        }

        Ok(Condition::BooleanColumn(column))
    }

    fn match_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.current().token_type {
            TokenType::Eq => CompareOp::Eq,
            TokenType::Ne => CompareOp::Ne,
            TokenType::Lt => CompareOp::Lt,
            TokenType::Gt => CompareOp::Gt,
            TokenType::Le => CompareOp::Le,
            TokenType::Ge => CompareOp::Ge,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn parse_value(&mut self) -> Result<Value> {
        if matches!(self.current().token_type, TokenType::LParen) {
            self.advance();
            let x = self.parse_float()?;
            self.expect(TokenType::Comma)?;
            let y = self.parse_float()?;
            self.expect(TokenType::RParen)?;
            return Ok(Value::Point(x, y));
        }
        let negate = self.match_token(TokenType::Minus);
        match self.current().token_type.clone() {
            TokenType::Number(n, has_dot) => {
                self.advance();
                let n = if negate { -n } else { n };
                if has_dot {
                    Ok(Value::Float(n))
                } else {
                    Ok(Value::Int(n as i64))
                }
            }
            TokenType::String(s) => {
                self.advance();
                Ok(Value::Varchar(s))
            }
            TokenType::True => {
                self.advance();
                Ok(Value::Bool(true))
            }
            TokenType::False => {
                self.advance();
                Ok(Value::Bool(false))
            }
            _ => Err(self.error("expected a literal value")),
        }
    }

    fn parse_float(&mut self) -> Result<f64> {
        let negate = self.match_token(TokenType::Minus);
        match self.current().token_type {
            TokenType::Number(n, _) => {
                self.advance();
                Ok(if negate { -n } else { n })
            }
            _ => Err(self.error("expected a number")),
        }
    }

    fn parse_int(&mut self) -> Result<i64> {
        Ok(self.parse_float()? as i64)
    }

    fn parse_ident_list(&mut self) -> Result<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.match_token(TokenType::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        match self.current().token_type.clone() {
            TokenType::Identifier(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) -> &Token {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        &self.tokens[self.position - 1]
    }

    fn match_token(&mut self, expected: TokenType) -> bool {
        if self.current().token_type == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: TokenType) -> Result<()> {
        if self.match_token(expected.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}, found {:?}", expected, self.current().token_type)))
        }
    }

    fn error(&self, msg: &str) -> StorageError {
        let tok = self.current();
        StorageError::ParseError(format!("{} at {}:{}", msg, tok.line, tok.column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::lexer::Lexer;

    fn parse_one(sql: &str) -> Statement {
        let tokens = Lexer::new(sql).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    #[test]
    fn parses_create_table_with_index_kinds() {
        let stmt = parse_one(
            "CREATE TABLE IF NOT EXISTS cities (id INT PRIMARY KEY, name VARCHAR(32), loc POINT INDEX RTREE);",
        );
        match stmt {
            Statement::CreateTable(c) => {
                assert_eq!(c.table, "cities");
                assert!(c.if_not_exists);
                assert_eq!(c.columns.len(), 3);
                assert!(c.columns[0].is_primary);
                assert_eq!(c.columns[2].index_kind, Some(IndexKindSpec::Rtree));
            }
            _ => panic!("expected CreateTable"),
        }
    }

    #[test]
    fn parses_select_star_with_where_order_limit() {
        let stmt = parse_one("SELECT * FROM cities WHERE pop > 1000 ORDER BY pop DESC LIMIT 5;");
        match stmt {
            Statement::Select(s) => {
                assert!(matches!(s.columns, SelectColumns::All));
                assert!(matches!(s.condition, Some(Condition::Compare { op: CompareOp::Gt, .. })));
                assert_eq!(s.order_by.as_ref().unwrap().1, OrderDirection::Desc);
                assert_eq!(s.limit, Some(5));
            }
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn parses_and_or_not_precedence() {
        // NOT binds tighter than AND, AND tighter than OR.
        let stmt = parse_one("SELECT id FROM t WHERE a = 1 OR NOT b = 2 AND c = 3;");
        match stmt {
            Statement::Select(s) => match s.condition.unwrap() {
                Condition::Or(lhs, rhs) => {
                    assert!(matches!(*lhs, Condition::Compare { .. }));
                    assert!(matches!(*rhs, Condition::And(_, _)));
                }
                other => panic!("expected Or at top level, got {:?}", other),
            },
            _ => panic!("expected Select"),
        }
    }

    #[test]
    fn parses_between_within_and_knn_predicates() {
        let stmt = parse_one("SELECT id FROM t WHERE age BETWEEN 10 AND 20;");
        assert!(matches!(
            stmt,
            Statement::Select(SelectStmt { condition: Some(Condition::Between { .. }), .. })
        ));

        let stmt = parse_one("SELECT id FROM t WHERE loc WITHIN CIRCLE(1, 2, 3);");
        assert!(matches!(
            stmt,
            Statement::Select(SelectStmt { condition: Some(Condition::Within { shape: Shape::Circle(..), .. }), .. })
        ));

        let stmt = parse_one("SELECT id FROM t WHERE loc KNN(1, 2, 5);");
        assert!(matches!(stmt, Statement::Select(SelectStmt { condition: Some(Condition::Knn { .. }), .. })));
    }

    #[test]
    fn parses_insert_with_explicit_columns_and_point_literal() {
        let stmt = parse_one("INSERT INTO cities (id, name, loc) VALUES (1, 'nyc', (1.0, 2.0));");
        match stmt {
            Statement::Insert(i) => {
                assert_eq!(i.columns, Some(vec!["id".to_string(), "name".to_string(), "loc".to_string()]));
                assert_eq!(i.values.len(), 3);
                assert!(matches!(i.values[2], Value::Point(1.0, 2.0)));
            }
            _ => panic!("expected Insert"),
        }
    }

    #[test]
    fn parses_create_and_drop_index() {
        let stmt = parse_one("CREATE INDEX idx_pop ON cities USING BTREE (pop);");
        match stmt {
            Statement::CreateIndex(c) => {
                assert_eq!(c.index_kind, IndexKindSpec::Btree);
                assert_eq!(c.columns, vec!["pop".to_string()]);
            }
            _ => panic!("expected CreateIndex"),
        }

        let stmt = parse_one("DROP INDEX idx_pop ON cities;");
        assert!(matches!(stmt, Statement::DropIndex(_)));
    }

    #[test]
    fn parses_multiple_statements() {
        let tokens = Lexer::new("DELETE FROM t WHERE id = 1; SELECT * FROM t;").tokenize().unwrap();
        let stmts = Parser::new(tokens).parse_all().unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0], Statement::Delete(_)));
        assert!(matches!(stmts[1], Statement::Select(_)));
    }
}
