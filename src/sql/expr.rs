use super::Dialect;
use crate::model::{ModelColumn, ModelColumns, SourceExpr};
use serde::Deserialize;
use std::fmt;

/// Renders a query element as dialect-specific SQL text.
pub trait ToSql {
    fn to_sql(&self, dialect: Dialect) -> String;
}

/// Comparison operators accepted in join conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl BinaryOperator {
    /// Parses a flow comparator (`==`, `!=`, `>`, `>=`, `<`, `<=`).
    pub fn from_comparator(comparator: &str) -> Option<Self> {
        match comparator {
            "==" | "=" => Some(BinaryOperator::Eq),
            "!=" | "<>" => Some(BinaryOperator::NotEq),
            ">" => Some(BinaryOperator::Gt),
            ">=" => Some(BinaryOperator::GtEq),
            "<" => Some(BinaryOperator::Lt),
            "<=" => Some(BinaryOperator::LtEq),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
        }
    }
}

/// Aggregate functions offered by the flow's aggregate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Median,
    Count,
    #[serde(rename = "COUNTD")]
    CountDistinct,
    Min,
    Max,
    Stdev,
    #[serde(rename = "STDEVP")]
    StdevPop,
    Var,
    #[serde(rename = "VARP")]
    VarPop,
}

impl AggregateFunction {
    /// The SQL function name.
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Median => "MEDIAN",
            AggregateFunction::Count | AggregateFunction::CountDistinct => "COUNT",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Stdev => "STDDEV",
            AggregateFunction::StdevPop => "STDDEV_POP",
            AggregateFunction::Var => "VARIANCE",
            AggregateFunction::VarPop => "VARIANCE_POP",
        }
    }

    pub fn call(&self, column: impl Into<String>) -> Expr {
        Expr::Function {
            name: self.sql_name().to_string(),
            args: vec![Expr::column(column)],
            distinct: matches!(self, AggregateFunction::CountDistinct),
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunction::CountDistinct => "COUNTD",
            AggregateFunction::StdevPop => "STDEVP",
            AggregateFunction::VarPop => "VARP",
            other => other.sql_name(),
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(String),
    String(String),
}

impl Literal {
    /// Decodes a JSON-encoded literal such as `"\"shipped\""`, `"null"` or `"3"`.
    /// Text that is not valid JSON is taken as a plain string.
    pub fn from_json_text(text: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Null) => Literal::Null,
            Ok(serde_json::Value::Bool(b)) => Literal::Bool(b),
            Ok(serde_json::Value::Number(n)) => Literal::Number(n.to_string()),
            Ok(serde_json::Value::String(s)) => Literal::String(s),
            Ok(other) => Literal::String(other.to_string()),
            Err(_) => Literal::String(text.to_string()),
        }
    }
}

impl ToSql for Literal {
    fn to_sql(&self, _dialect: Dialect) -> String {
        match self {
            Literal::Null => "NULL".to_string(),
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Number(n) => n.clone(),
            Literal::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Expression tree of the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column {
        table: Option<String>,
        name: String,
    },
    Literal(Literal),
    /// Flow calculation text, translated at render time.
    Calculation(String),
    Wildcard,
    Binary {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    IsNull(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Function {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    Cast {
        expr: Box<Expr>,
        data_type: String,
    },
    Case {
        whens: Vec<(Expr, Expr)>,
        else_expr: Option<Box<Expr>>,
    },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull(Box::new(self))
    }

    pub fn cast(self, data_type: impl Into<String>) -> Self {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.into(),
        }
    }

    /// The expression producing a model column's value.
    pub fn from_source(source: &SourceExpr) -> Self {
        match source {
            SourceExpr::Column(name) => Expr::column(name.clone()),
            SourceExpr::Calculation(text) => Expr::Calculation(text.clone()),
            SourceExpr::Aggregate { function, column } => function.call(column.clone()),
        }
    }
}

fn join_rendered(exprs: &[Expr], dialect: Dialect, separator: &str) -> String {
    exprs
        .iter()
        .map(|e| e.to_sql(dialect))
        .collect::<Vec<_>>()
        .join(separator)
}

impl ToSql for Expr {
    fn to_sql(&self, dialect: Dialect) -> String {
        match self {
            Expr::Column { table, name } => match table {
                Some(table) => format!(
                    "{}.{}",
                    dialect.quote_identifier(table),
                    dialect.quote_identifier(name)
                ),
                None => dialect.quote_identifier(name),
            },
            Expr::Literal(literal) => literal.to_sql(dialect),
            Expr::Calculation(text) => translate_calculation(text, dialect),
            Expr::Wildcard => "*".to_string(),
            Expr::Binary { left, op, right } => format!(
                "{} {} {}",
                left.to_sql(dialect),
                op.symbol(),
                right.to_sql(dialect)
            ),
            Expr::IsNull(inner) => format!("{} IS NULL", inner.to_sql(dialect)),
            Expr::And(exprs) => join_rendered(exprs, dialect, " AND "),
            Expr::Or(exprs) => match exprs.len() {
                0 | 1 => join_rendered(exprs, dialect, ""),
                _ => format!("({})", join_rendered(exprs, dialect, " OR ")),
            },
            Expr::Function {
                name,
                args,
                distinct,
            } => {
                let args = join_rendered(args, dialect, ", ");
                if *distinct {
                    format!("{}(DISTINCT {})", name, args)
                } else {
                    format!("{}({})", name, args)
                }
            }
            Expr::Cast { expr, data_type } => format!(
                "CAST({} AS {})",
                expr.to_sql(dialect),
                dialect.type_name(data_type)
            ),
            Expr::Case { whens, else_expr } => {
                let mut sql = String::from("CASE");
                for (condition, result) in whens {
                    sql.push_str(&format!(
                        " WHEN {} THEN {}",
                        condition.to_sql(dialect),
                        result.to_sql(dialect)
                    ));
                }
                if let Some(else_expr) = else_expr {
                    sql.push_str(&format!(" ELSE {}", else_expr.to_sql(dialect)));
                }
                sql.push_str(" END");
                sql
            }
        }
    }
}

/// One item of a projection list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    pub fn wildcard() -> Self {
        Self::new(Expr::Wildcard)
    }

    /// `<source> AS name` for derived columns, the bare name otherwise.
    pub fn from_column(column: &ModelColumn) -> Self {
        match &column.source {
            Some(source) => Self::aliased(Expr::from_source(source), column.name.clone()),
            None => Self::new(Expr::column(column.name.clone())),
        }
    }

    /// The projection of a column set: one item per column, or `*` when the
    /// columns are not known.
    pub fn from_columns(columns: &ModelColumns) -> Vec<Self> {
        if columns.is_computed() {
            columns.columns().iter().map(Self::from_column).collect()
        } else {
            vec![Self::wildcard()]
        }
    }
}

impl ToSql for SelectItem {
    fn to_sql(&self, dialect: Dialect) -> String {
        match &self.alias {
            Some(alias) => format!(
                "{} AS {}",
                self.expr.to_sql(dialect),
                dialect.quote_identifier(alias)
            ),
            None => self.expr.to_sql(dialect),
        }
    }
}

/// Translates flow calculation text: `[Field]` becomes a quoted identifier
/// (`]]` inside brackets is an escaped `]`) and `==` becomes `=`.
/// Quoted string literals are copied unchanged.
pub fn translate_calculation(text: &str, dialect: Dialect) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                out.push(c);
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == c {
                        break;
                    }
                }
            }
            '[' => {
                let mut name = String::new();
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    if inner == ']' {
                        if chars.peek() == Some(&']') {
                            chars.next();
                            name.push(']');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        name.push(inner);
                    }
                }
                if closed {
                    out.push_str(&dialect.quote_identifier(&name));
                } else {
                    out.push('[');
                    out.push_str(&name);
                }
            }
            '=' if chars.peek() == Some(&'=') => {
                chars.next();
                out.push('=');
            }
            other => out.push(other),
        }
    }
    out
}
