use crate::error::ConfigError;
use crate::sql::Dialect;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_SOURCE_NAME: &str = "SOURCE";

/// Settings of a single conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub flow_file: PathBuf,
    pub dialect: Dialect,
    pub source_name: String,
    pub tags: Vec<String>,
    pub prefix: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            flow_file: PathBuf::new(),
            dialect: Dialect::DuckDb,
            source_name: DEFAULT_SOURCE_NAME.to_string(),
            tags: Vec::new(),
            prefix: None,
        }
    }
}

impl RunConfig {
    pub fn new(flow_file: impl Into<PathBuf>) -> Self {
        Self {
            flow_file: flow_file.into(),
            ..Self::default()
        }
    }

    pub fn with_dialect(mut self, dialect: &str) -> Result<Self, ConfigError> {
        self.dialect = Dialect::from_str(dialect)?;
        Ok(self)
    }

    pub fn with_source_name(mut self, source_name: &str) -> Result<Self, ConfigError> {
        self.source_name = validate_identifier("source name", source_name)?;
        Ok(self)
    }

    /// Accepts a comma-separated list. An empty string clears the tags.
    pub fn with_tags(mut self, tags: &str) -> Result<Self, ConfigError> {
        self.tags = if tags.is_empty() {
            Vec::new()
        } else {
            tags.split(',')
                .map(|tag| validate_identifier("tag", tag))
                .collect::<Result<_, _>>()?
        };
        Ok(self)
    }

    /// An empty prefix means "no prefix".
    pub fn with_prefix(mut self, prefix: &str) -> Result<Self, ConfigError> {
        self.prefix = if prefix.is_empty() {
            None
        } else {
            Some(validate_identifier("prefix", prefix)?)
        };
        Ok(self)
    }

    /// Finds the flow definition JSON: the file itself, or a `flow` file inside
    /// an already extracted flow directory.
    pub fn resolve_flow_definition(&self) -> Result<PathBuf, ConfigError> {
        resolve_flow_definition(&self.flow_file)
    }
}

fn resolve_flow_definition(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        let inner = path.join("flow");
        if inner.is_file() {
            return Ok(inner);
        }
        return Err(ConfigError::MissingFlowDefinition(path.to_path_buf()));
    }
    Err(ConfigError::FlowFileNotFound(path.to_path_buf()))
}

/// Letters, digits and `_`, not starting with a digit.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

fn validate_identifier(field: &'static str, value: &str) -> Result<String, ConfigError> {
    if is_identifier(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}
