use super::{ModelColumns, ModelName};
use crate::flow::RawNode;

/// One step of the flow as stored in the graph.
///
/// Nodes are values: every update produces a new `Node` that replaces the stored one.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    raw: RawNode,
    model_name: ModelName,
    columns: ModelColumns,
    is_unknown: bool,
}

impl Node {
    /// A recognized node whose columns are not calculated yet.
    pub fn new(raw: RawNode) -> Self {
        Self {
            raw,
            model_name: ModelName::Uninitialized,
            columns: ModelColumns::Uninitialized,
            is_unknown: false,
        }
    }

    /// A node whose type could not be converted.
    pub fn unknown(raw: RawNode) -> Self {
        Self {
            raw,
            model_name: ModelName::Uninitialized,
            columns: ModelColumns::Unknown,
            is_unknown: true,
        }
    }

    pub fn with_model_name(self, model_name: ModelName) -> Self {
        Self { model_name, ..self }
    }

    pub fn with_columns(self, columns: ModelColumns) -> Self {
        Self { columns, ..self }
    }

    pub fn id(&self) -> &str {
        self.raw.id()
    }

    /// The human-readable step name.
    pub fn name(&self) -> &str {
        self.raw.display_name()
    }

    pub fn node_type(&self) -> &str {
        self.raw.node_type()
    }

    pub fn raw(&self) -> &RawNode {
        &self.raw
    }

    pub fn model_name(&self) -> &ModelName {
        &self.model_name
    }

    pub fn columns(&self) -> &ModelColumns {
        &self.columns
    }

    pub fn is_unknown(&self) -> bool {
        self.is_unknown
    }

    /// The name other models use to reference this one: the model name once assigned,
    /// the display name before that.
    pub fn reference_name(&self) -> &str {
        self.model_name.as_str().unwrap_or_else(|| self.name())
    }
}
