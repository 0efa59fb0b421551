use crate::sql::AggregateFunction;
use std::fmt;

/// Where a computed column's value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceExpr {
    /// Pass-through of another upstream column (renames, duplicates, join collisions).
    Column(String),
    /// A flow calculation, e.g. `[CUSTOMER_ID] + [ORDER_ID]`.
    Calculation(String),
    /// An aggregate call over an upstream column.
    Aggregate {
        function: AggregateFunction,
        column: String,
    },
}

impl fmt::Display for SourceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceExpr::Column(name) => write!(f, "{}", name),
            SourceExpr::Calculation(text) => write!(f, "{}", text),
            SourceExpr::Aggregate { function, column } => write!(f, "{}({})", function, column),
        }
    }
}

/// A single output column of a model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelColumn {
    pub name: String,
    pub data_type: String,
    pub source: Option<SourceExpr>,
}

impl ModelColumn {
    /// A column that is selected as-is.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            source: None,
        }
    }

    /// A column whose value is derived from `source`.
    pub fn derived(name: impl Into<String>, data_type: impl Into<String>, source: SourceExpr) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            source: Some(source),
        }
    }

    /// Drops the derivation, keeping name and type.
    pub fn flushed(&self) -> Self {
        Self::new(self.name.clone(), self.data_type.clone())
    }
}

/// The column set of a model.
///
/// `Computed` always holds at least one column with unique names; an empty set
/// collapses to `Unknown`. Columns keep their insertion order so generated SQL is stable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelColumns {
    /// Not calculated yet.
    #[default]
    Uninitialized,
    /// Calculated.
    Computed(Vec<ModelColumn>),
    /// The exact columns cannot be determined.
    Unknown,
}

impl ModelColumns {
    /// Builds a computed set. Later columns replace earlier ones with the same name.
    pub fn computed(columns: impl IntoIterator<Item = ModelColumn>) -> Self {
        let mut unique: Vec<ModelColumn> = Vec::new();
        for column in columns {
            match unique.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => *existing = column,
                None => unique.push(column),
            }
        }
        if unique.is_empty() {
            ModelColumns::Unknown
        } else {
            ModelColumns::Computed(unique)
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, ModelColumns::Computed(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ModelColumns::Unknown)
    }

    /// The columns of a computed set; empty otherwise.
    pub fn columns(&self) -> &[ModelColumn] {
        match self {
            ModelColumns::Computed(columns) => columns,
            _ => &[],
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns().iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ModelColumn> {
        self.columns().iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.columns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }

    /// Adds a column, replacing one with the same name. No-op unless computed.
    pub fn add(self, column: ModelColumn) -> Self {
        match self {
            ModelColumns::Computed(mut columns) => {
                match columns.iter_mut().find(|c| c.name == column.name) {
                    Some(existing) => *existing = column,
                    None => columns.push(column),
                }
                ModelColumns::Computed(columns)
            }
            other => other,
        }
    }

    /// Removes a column by name. Removing the last column yields `Unknown`.
    pub fn remove(self, name: &str) -> Self {
        match self {
            ModelColumns::Computed(mut columns) => {
                columns.retain(|c| c.name != name);
                if columns.is_empty() {
                    ModelColumns::Unknown
                } else {
                    ModelColumns::Computed(columns)
                }
            }
            other => other,
        }
    }

    /// Adds every column of `other`. No-op unless `self` is computed.
    pub fn merge(self, other: &ModelColumns) -> Self {
        other
            .columns()
            .iter()
            .fold(self, |acc, column| acc.add(column.clone()))
    }

    /// Clears every derivation so a later step selects the columns by name.
    pub fn flush(&self) -> Self {
        match self {
            ModelColumns::Computed(columns) => {
                ModelColumns::computed(columns.iter().map(ModelColumn::flushed))
            }
            other => other.clone(),
        }
    }
}

/// The unique model name of a node.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelName {
    #[default]
    Uninitialized,
    Computed(String),
}

impl ModelName {
    pub fn is_computed(&self) -> bool {
        matches!(self, ModelName::Computed(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ModelName::Computed(name) => Some(name),
            ModelName::Uninitialized => None,
        }
    }
}
