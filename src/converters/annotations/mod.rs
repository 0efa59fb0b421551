//! Micro-transforms used in before/after chains and container bodies.
//!
//! Every converter receives flushed input columns and returns the operation's
//! output columns, or one sub-query over the previous step.

use super::{AnnotationConverter, Validate};
use crate::error::{Outcome, Unrecognized};
use crate::flow::RawNode;
use crate::model::ModelColumns;
use crate::sql::{Select, SelectItem, TableRef};

mod columns;
mod values;

pub use columns::{AddColumn, DuplicateColumn, KeepOnlyColumns, RemoveColumns, RenameColumn};
pub use values::{ChangeColumnType, FilterOperation, Remap};

/// Selects `columns` from `from`, commented with the annotation's name.
pub(crate) fn step(raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Select {
    Select::from(from)
        .comment(raw.display_name())
        .project(SelectItem::from_columns(columns))
}

/// The sub-query substituted for an annotation that could not be converted.
pub fn passthrough_step(raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Select {
    Select::from(from)
        .comment(format!("could not convert annotation: {}", raw.display_name()))
        .project(SelectItem::from_columns(columns))
}

/// Registered as the fallback of the annotation registry.
#[derive(Debug, Default)]
pub struct UnknownAnnotation;

impl UnknownAnnotation {
    pub fn new() -> Self {
        Self
    }
}

impl Validate for UnknownAnnotation {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        Err(Unrecognized::new(format!(
            "no annotation converter registered for '{}'",
            raw.node_type()
        )))
    }
}

impl AnnotationConverter for UnknownAnnotation {
    fn annotation_type(&self) -> &str {
        "Unknown"
    }

    fn compute_columns(&self, _raw: &RawNode, _columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(ModelColumns::Unknown)
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        Ok(passthrough_step(raw, columns, from))
    }
}
