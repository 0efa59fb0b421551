use crate::error::OutputError;
use crate::model::{ModelColumns, Node};
use crate::sql::Sql;
use log::{debug, info};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the source table a load node reads from.
pub const SOURCE_TABLE_PREFIX: &str = "source__";

const METADATA_VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Model,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnEntry {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocsEntry {
    pub node_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    pub name: String,
    pub description: PayloadDescription,
    pub columns: Vec<ColumnEntry>,
    pub config: ConfigEntry,
    pub docs: DocsEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub description: PayloadDescription,
    pub columns: Vec<ColumnEntry>,
    pub config: ConfigEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceEntry {
    pub name: String,
    pub tables: Vec<TableEntry>,
}

/// The YAML metadata document written next to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Metadata {
    Models { version: u8, models: Vec<ModelEntry> },
    Sources { version: u8, sources: Vec<SourceEntry> },
}

impl Metadata {
    /// Model metadata for a node. Nodes without computed columns are drawn red.
    pub fn model(node: &Node, tags: &[String]) -> Self {
        let node_color = if node.columns().is_computed() {
            String::new()
        } else {
            "red".to_string()
        };
        Metadata::Models {
            version: METADATA_VERSION,
            models: vec![ModelEntry {
                name: node.reference_name().to_string(),
                description: PayloadDescription(node.raw().payload().clone()),
                columns: column_entries(node.columns()),
                config: ConfigEntry {
                    tags: tags.to_vec(),
                },
                docs: DocsEntry { node_color },
            }],
        }
    }

    /// Source metadata for the table a node reads from.
    pub fn source(node: &Node, source_name: &str, tags: &[String]) -> Self {
        Metadata::Sources {
            version: METADATA_VERSION,
            sources: vec![SourceEntry {
                name: source_name.to_string(),
                tables: vec![TableEntry {
                    name: source_table_name(node),
                    description: PayloadDescription(node.raw().payload().clone()),
                    columns: column_entries(node.columns()),
                    config: ConfigEntry {
                        tags: tags.to_vec(),
                    },
                }],
            }],
        }
    }

    pub fn to_yaml(&self, model: &str) -> Result<String, OutputError> {
        serde_yaml::to_string(self).map_err(|e| OutputError::Yaml {
            model: model.to_string(),
            message: e.to_string(),
        })
    }
}

/// Name of the source table standing in for a node without upstream models.
pub fn source_table_name(node: &Node) -> String {
    format!("{}{}", SOURCE_TABLE_PREFIX, node.reference_name())
}

fn column_entries(columns: &ModelColumns) -> Vec<ColumnEntry> {
    columns
        .columns()
        .iter()
        .map(|column| ColumnEntry {
            name: column.name.clone(),
            description: column.data_type.clone(),
        })
        .collect()
}

/// A raw step payload, written as a fenced, four-space indented JSON block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDescription(pub Value);

impl PayloadDescription {
    pub fn fenced(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        self.0.serialize(&mut serializer)?;
        let body = String::from_utf8(buf).map_err(serde_json::Error::custom)?;
        Ok(format!("```\n{}\n```", body))
    }
}

impl Serialize for PayloadDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.fenced().map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

/// One generated output: a model with SQL, or a source with metadata only.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub sql: Option<Sql>,
    pub metadata: Metadata,
    pub name: String,
    pub kind: ModelKind,
}

impl ModelRecord {
    pub fn model(name: impl Into<String>, sql: Sql, metadata: Metadata) -> Self {
        Self {
            sql: Some(sql),
            metadata,
            name: name.into(),
            kind: ModelKind::Model,
        }
    }

    pub fn source(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            sql: None,
            metadata,
            name: name.into(),
            kind: ModelKind::Source,
        }
    }
}

/// Records in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Models {
    records: Vec<ModelRecord>,
}

impl Models {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ModelRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = ModelRecord>) {
        self.records.extend(records);
    }

    pub fn get(&self, name: &str) -> Option<&ModelRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }
}

impl IntoIterator for Models {
    type Item = ModelRecord;
    type IntoIter = std::vec::IntoIter<ModelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Models {
    type Item = &'a ModelRecord;
    type IntoIter = std::slice::Iter<'a, ModelRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl FromIterator<ModelRecord> for Models {
    fn from_iter<I: IntoIterator<Item = ModelRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Writes `<name>.sql` (templated text) for every record with SQL and
/// `<name>.yml` for every record. Returns the written paths.
pub fn write_models(dir: &Path, models: &Models) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for record in models {
        if let Some(sql) = &record.sql {
            let path = dir.join(format!("{}.sql", record.name));
            write_file(&path, &format!("{}\n", sql.templated()))?;
            written.push(path);
        }
        let path = dir.join(format!("{}.yml", record.name));
        write_file(&path, &record.metadata.to_yaml(&record.name)?)?;
        written.push(path);
    }

    info!("Wrote {} files to '{}'", written.len(), dir.display());
    Ok(written)
}

fn write_file(path: &Path, content: &str) -> Result<(), OutputError> {
    debug!("Writing '{}'", path.display());
    fs::write(path, content).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
