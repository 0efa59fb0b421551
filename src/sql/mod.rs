//! SQL generation: an expression tree, named sub-query statements, dialect
//! rendering and the table-reference templating pass.

pub mod dialect;
pub mod expr;
pub mod query;
pub mod template;

pub use dialect::Dialect;
pub use expr::*;
pub use query::*;
pub use template::{Reference, replace_table_names};

/// Generated SQL of one model.
///
/// `compiled` is the dialect text; `templated` is the same text with every
/// upstream table name replaced by a `ref`/`source` marker. Templating runs on
/// the compiled text, never on the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Sql {
    statement: Statement,
    compiled: String,
    templated: String,
}

impl Sql {
    /// SQL that reads from upstream models.
    pub fn model_reference(statement: Statement, dialect: Dialect, tables: &[String]) -> Self {
        Self::templated_with(statement, dialect, tables, Reference::Model)
    }

    /// SQL that reads from tables of the named source.
    pub fn source_reference(
        statement: Statement,
        dialect: Dialect,
        source_name: &str,
        tables: &[String],
    ) -> Self {
        Self::templated_with(statement, dialect, tables, Reference::Source(source_name))
    }

    fn templated_with(
        statement: Statement,
        dialect: Dialect,
        tables: &[String],
        reference: Reference<'_>,
    ) -> Self {
        let compiled = statement.to_sql(dialect);
        let templated = replace_table_names(&compiled, tables, reference);
        Self {
            statement,
            compiled,
            templated,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn compiled(&self) -> &str {
        &self.compiled
    }

    pub fn templated(&self) -> &str {
        &self.templated
    }
}
