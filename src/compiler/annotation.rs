use crate::converters::{AnnotationRegistry, AnnotationWithFallback, StepOutput};
use crate::error::Outcome;
use crate::flow::RawNode;
use crate::graph::{DEFAULT_NAMESPACE, ParentOutput};
use crate::model::ModelColumns;
use crate::sql::{CteChain, Select, SelectItem, TableRef};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const BEFORE_ACTION: &str = "beforeActionAnnotations";
pub const AFTER_ACTION: &str = "afterActionAnnotations";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationEntry {
    #[serde(default = "default_namespace")]
    namespace: String,
    annotation_node: Value,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// A micro-transform attached to one input namespace of a node.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub namespace: String,
    pub raw: RawNode,
}

/// Reads the annotation list stored under `key`. A missing or null list is empty.
pub fn annotations(raw: &RawNode, key: &str) -> Outcome<Vec<Annotation>> {
    match raw.payload().get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(_) => {
            let entries: Vec<AnnotationEntry> = raw.field(key)?;
            Ok(entries
                .into_iter()
                .map(|entry| Annotation {
                    namespace: entry.namespace,
                    raw: RawNode::lenient(entry.annotation_node),
                })
                .collect())
        }
    }
}

/// Folds before/after micro-transforms around a node's primary action.
///
/// Each operation sees flushed input. Namespaces fold independently, and a failing
/// operation only turns its own output `Unknown`.
pub struct AnnotationPipeline<'a> {
    registry: &'a AnnotationRegistry,
}

impl<'a> AnnotationPipeline<'a> {
    pub fn new(registry: &'a AnnotationRegistry) -> Self {
        Self { registry }
    }

    fn converter(&self, annotation: &RawNode) -> AnnotationWithFallback<'a> {
        AnnotationWithFallback::new(self.registry.resolve(annotation.node_type()))
    }

    /// Applies one operation to the columns.
    pub fn apply_columns(&self, annotation: &RawNode, columns: &ModelColumns) -> ModelColumns {
        self.converter(annotation)
            .compute_columns(annotation, columns.flush())
    }

    /// Appends one operation's sub-query to the chain.
    pub fn apply_step(
        &self,
        annotation: &RawNode,
        input: StepOutput,
        chain: &mut CteChain,
    ) -> StepOutput {
        let converter = self.converter(annotation);
        let flushed = input.columns.flush();
        let select = converter.emit_step(annotation, &flushed, input.table);
        let columns = converter.compute_columns(annotation, flushed);

        let name = if annotation.id().is_empty() {
            format!("annotation_{}", chain.len())
        } else {
            annotation.id().to_string()
        };
        let table = chain.push(name, select);
        StepOutput { table, columns }
    }

    pub fn fold_columns(&self, annotations: &[RawNode], columns: ModelColumns) -> ModelColumns {
        annotations
            .iter()
            .fold(columns, |acc, annotation| self.apply_columns(annotation, &acc))
    }

    pub fn fold_steps(
        &self,
        annotations: &[RawNode],
        input: StepOutput,
        chain: &mut CteChain,
    ) -> StepOutput {
        annotations
            .iter()
            .fold(input, |acc, annotation| self.apply_step(annotation, acc, chain))
    }

    /// Input columns per namespace after the before-action operations.
    pub fn pre_calculate(
        &self,
        raw: &RawNode,
        mut inputs: BTreeMap<String, ModelColumns>,
    ) -> Outcome<BTreeMap<String, ModelColumns>> {
        for columns in inputs.values_mut() {
            *columns = columns.flush();
        }
        for annotation in annotations(raw, BEFORE_ACTION)? {
            match inputs.get_mut(&annotation.namespace) {
                Some(columns) => *columns = self.apply_columns(&annotation.raw, columns),
                None => warn!(
                    "Annotation '{}' of '{}' targets missing input '{}'; skipped",
                    annotation.raw.display_name(),
                    raw.display_name(),
                    annotation.namespace
                ),
            }
        }
        Ok(inputs)
    }

    /// The node's columns after the after-action operations.
    pub fn post_calculate(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        let after: Vec<RawNode> = annotations(raw, AFTER_ACTION)?
            .into_iter()
            .map(|a| a.raw)
            .collect();
        Ok(self.fold_columns(&after, columns))
    }

    /// One `source_<namespace>` sub-query per predecessor.
    pub fn source_steps(
        parents: &[ParentOutput],
        chain: &mut CteChain,
    ) -> BTreeMap<String, StepOutput> {
        let mut inputs = BTreeMap::new();
        for parent in parents {
            let columns = parent.columns.flush();
            let select = Select::from(TableRef::model(parent.reference_name.clone()))
                .comment(parent.name.clone())
                .project(SelectItem::from_columns(&columns));
            let table = chain.push(format!("source_{}", parent.namespace), select);
            inputs.insert(parent.namespace.clone(), StepOutput { table, columns });
        }
        inputs
    }

    /// Source sub-queries followed by the before-action sub-queries, per namespace.
    pub fn pre_statements(
        &self,
        raw: &RawNode,
        parents: &[ParentOutput],
        chain: &mut CteChain,
    ) -> Outcome<BTreeMap<String, StepOutput>> {
        let before = annotations(raw, BEFORE_ACTION)?;
        let mut inputs = Self::source_steps(parents, chain);
        for annotation in before {
            match inputs.remove(&annotation.namespace) {
                Some(input) => {
                    let output = self.apply_step(&annotation.raw, input, chain);
                    inputs.insert(annotation.namespace, output);
                }
                None => debug!(
                    "No input '{}' for annotation '{}'",
                    annotation.namespace,
                    annotation.raw.display_name()
                ),
            }
        }
        Ok(inputs)
    }

    /// The after-action sub-queries over the primary action's output.
    pub fn post_statements(
        &self,
        raw: &RawNode,
        output: StepOutput,
        chain: &mut CteChain,
    ) -> Outcome<StepOutput> {
        let after: Vec<RawNode> = annotations(raw, AFTER_ACTION)?
            .into_iter()
            .map(|a| a.raw)
            .collect();
        Ok(self.fold_steps(&after, output, chain))
    }
}
