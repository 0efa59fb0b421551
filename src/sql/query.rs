use super::{Dialect, Expr, SelectItem, ToSql};

/// A table in a FROM or JOIN clause.
///
/// Upstream models and sources are written verbatim so the templating pass can
/// find them; named sub-queries are quoted like any identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableName {
    Model(String),
    Cte(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: TableName,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn model(name: impl Into<String>) -> Self {
        Self {
            name: TableName::Model(name.into()),
            alias: None,
        }
    }

    pub fn cte(name: impl Into<String>) -> Self {
        Self {
            name: TableName::Cte(name.into()),
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn name(&self) -> &str {
        match &self.name {
            TableName::Model(name) | TableName::Cte(name) => name,
        }
    }
}

impl ToSql for TableRef {
    fn to_sql(&self, dialect: Dialect) -> String {
        let table = match &self.name {
            TableName::Model(name) => name.clone(),
            TableName::Cte(name) => dialect.quote_identifier(name),
        };
        match &self.alias {
            Some(alias) => format!("{} AS {}", table, dialect.quote_identifier(alias)),
            None => table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOperator {
    Inner,
    LeftOuter,
    FullOuter,
}

impl JoinOperator {
    fn keyword(&self) -> &'static str {
        match self {
            JoinOperator::Inner => "JOIN",
            JoinOperator::LeftOuter => "LEFT OUTER JOIN",
            JoinOperator::FullOuter => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub operator: JoinOperator,
    pub table: TableRef,
    pub on: Expr,
}

fn comment_line(comment: &Option<String>) -> String {
    match comment {
        Some(text) => format!("-- {}\n", text.replace(['\r', '\n'], " ")),
        None => String::new(),
    }
}

/// A single SELECT with an optional leading comment line.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub comment: Option<String>,
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl Select {
    pub fn from(table: TableRef) -> Self {
        Self {
            comment: None,
            projection: Vec::new(),
            from: table,
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn project(mut self, items: impl IntoIterator<Item = SelectItem>) -> Self {
        self.projection.extend(items);
        self
    }

    pub fn join(mut self, operator: JoinOperator, table: TableRef, on: Expr) -> Self {
        self.joins.push(JoinClause {
            operator,
            table,
            on,
        });
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn group_by(mut self, exprs: impl IntoIterator<Item = Expr>) -> Self {
        self.group_by.extend(exprs);
        self
    }
}

impl ToSql for Select {
    fn to_sql(&self, dialect: Dialect) -> String {
        let mut sql = comment_line(&self.comment);

        if self.projection.is_empty() {
            sql.push_str("SELECT *");
        } else if let [item] = self.projection.as_slice() {
            sql.push_str(&format!("SELECT {}", item.to_sql(dialect)));
        } else {
            let items = self
                .projection
                .iter()
                .map(|item| format!("    {}", item.to_sql(dialect)))
                .collect::<Vec<_>>()
                .join(",\n");
            sql.push_str(&format!("SELECT\n{}", items));
        }

        sql.push_str(&format!("\nFROM {}", self.from.to_sql(dialect)));
        for join in &self.joins {
            sql.push_str(&format!(
                "\n{} {} ON {}",
                join.operator.keyword(),
                join.table.to_sql(dialect),
                join.on.to_sql(dialect)
            ));
        }
        if let Some(filter) = &self.filter {
            sql.push_str(&format!("\nWHERE {}", filter.to_sql(dialect)));
        }
        if !self.group_by.is_empty() {
            let terms = self
                .group_by
                .iter()
                .map(|e| e.to_sql(dialect))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!("\nGROUP BY {}", terms));
        }
        sql
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionAll {
    pub comment: Option<String>,
    pub selects: Vec<Select>,
}

impl ToSql for UnionAll {
    fn to_sql(&self, dialect: Dialect) -> String {
        let body = self
            .selects
            .iter()
            .map(|s| s.to_sql(dialect))
            .collect::<Vec<_>>()
            .join("\nUNION ALL\n");
        format!("{}{}", comment_line(&self.comment), body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Select(Select),
    UnionAll(UnionAll),
}

impl From<Select> for Query {
    fn from(select: Select) -> Self {
        Query::Select(select)
    }
}

impl From<UnionAll> for Query {
    fn from(union: UnionAll) -> Self {
        Query::UnionAll(union)
    }
}

impl ToSql for Query {
    fn to_sql(&self, dialect: Dialect) -> String {
        match self {
            Query::Select(select) => select.to_sql(dialect),
            Query::UnionAll(union) => union.to_sql(dialect),
        }
    }
}

/// A named sub-query.
#[derive(Debug, Clone, PartialEq)]
pub struct Cte {
    pub name: String,
    pub query: Query,
}

/// `WITH a AS (...), b AS (...) SELECT * FROM <last>`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub ctes: Vec<Cte>,
}

impl Statement {
    pub fn cte_names(&self) -> Vec<&str> {
        self.ctes.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Cte> {
        self.ctes.iter().find(|c| c.name == name)
    }
}

impl ToSql for Statement {
    fn to_sql(&self, dialect: Dialect) -> String {
        let Some(last) = self.ctes.last() else {
            return String::new();
        };
        let ctes = self
            .ctes
            .iter()
            .map(|cte| {
                format!(
                    "{} AS (\n{}\n)",
                    dialect.quote_identifier(&cte.name),
                    cte.query.to_sql(dialect)
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");
        format!(
            "WITH {}\nSELECT * FROM {}",
            ctes,
            dialect.quote_identifier(&last.name)
        )
    }
}

/// Builds a statement one named sub-query at a time.
#[derive(Debug, Clone, Default)]
pub struct CteChain {
    ctes: Vec<Cte>,
}

impl CteChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sub-query and returns a reference to it. A name already in the
    /// chain gets a numeric suffix.
    pub fn push(&mut self, name: impl Into<String>, query: impl Into<Query>) -> TableRef {
        let requested = name.into();
        let mut name = requested.clone();
        let mut n = 2;
        while self.ctes.iter().any(|c| c.name == name) {
            name = format!("{}_{}", requested, n);
            n += 1;
        }
        self.ctes.push(Cte {
            name: name.clone(),
            query: query.into(),
        });
        TableRef::cte(name)
    }

    pub fn len(&self) -> usize {
        self.ctes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ctes.is_empty()
    }

    pub fn finish(self) -> Statement {
        Statement { ctes: self.ctes }
    }
}
