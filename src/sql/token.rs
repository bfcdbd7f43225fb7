//! Token types for the SQL lexer.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Statement keywords
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Delete,
    Create,
    Table,
    Index,
    Drop,
    And,
    Or,
    Not,
    Between,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Primary,
    Key,
    Using,
    On,
    If,
    Exists,
    Within,
    Rectangle,
    Circle,
    Knn,

    // Data types
    Int,
    Float,
    Varchar,
    Date,
    Bool,
    Point,

    // Index types
    Avl,
    Isam,
    Hash,
    Btree,
    Rtree,
    Brin,

    // Operators
    Eq,   // =
    Ne,   // <> or !=
    Lt,   // <
    Gt,   // >
    Le,   // <=
    Ge,   // >=
    Minus,

    // Delimiters
    LParen,
    RParen,
    Comma,
    Semicolon,
    Star,

    // Literals. The bool marks whether the source text had a decimal point,
    // which the parser uses to pick Value::Int vs Value::Float rather than
    // guessing from the parsed magnitude (so "5.0" and "5" stay distinct).
    Number(f64, bool),
    String(String),
    Identifier(String),
    True,
    False,

    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize, column: usize) -> Self {
        Self { token_type, line, column }
    }
}

impl TokenType {
    /// Maps a lowercased identifier to its keyword token, if it is one.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "select" => Some(TokenType::Select),
            "from" => Some(TokenType::From),
            "where" => Some(TokenType::Where),
            "insert" => Some(TokenType::Insert),
            "into" => Some(TokenType::Into),
            "values" => Some(TokenType::Values),
            "delete" => Some(TokenType::Delete),
            "create" => Some(TokenType::Create),
            "table" => Some(TokenType::Table),
            "index" => Some(TokenType::Index),
            "drop" => Some(TokenType::Drop),
            "and" => Some(TokenType::And),
            "or" => Some(TokenType::Or),
            "not" => Some(TokenType::Not),
            "between" => Some(TokenType::Between),
            "order" => Some(TokenType::Order),
            "by" => Some(TokenType::By),
            "asc" => Some(TokenType::Asc),
            "desc" => Some(TokenType::Desc),
            "limit" => Some(TokenType::Limit),
            "primary" => Some(TokenType::Primary),
            "key" => Some(TokenType::Key),
            "using" => Some(TokenType::Using),
            "on" => Some(TokenType::On),
            "if" => Some(TokenType::If),
            "exists" => Some(TokenType::Exists),
            "within" => Some(TokenType::Within),
            "rectangle" => Some(TokenType::Rectangle),
            "circle" => Some(TokenType::Circle),
            "knn" => Some(TokenType::Knn),
            "int" | "integer" => Some(TokenType::Int),
            "float" | "real" | "double" => Some(TokenType::Float),
            "varchar" => Some(TokenType::Varchar),
            "date" => Some(TokenType::Date),
            "bool" | "boolean" => Some(TokenType::Bool),
            "point" => Some(TokenType::Point),
            "avl" => Some(TokenType::Avl),
            "isam" => Some(TokenType::Isam),
            "hash" => Some(TokenType::Hash),
            "btree" => Some(TokenType::Btree),
            "rtree" => Some(TokenType::Rtree),
            "brin" => Some(TokenType::Brin),
            "true" => Some(TokenType::True),
            "false" => Some(TokenType::False),
            _ => None,
        }
    }
}
