//! Per-node-type conversion strategies.
//!
//! Every capability may independently report [`Unrecognized`]; callers go through
//! [`WithFallback`] / [`AnnotationWithFallback`], which turn that signal into the
//! Unknown protocol instead of an error.

use crate::compiler::annotation::AnnotationPipeline;
use crate::compiler::registry::Registry;
use crate::error::{Outcome, Unrecognized};
use crate::flow::{Metadata, ModelRecord, RawNode, RunConfig, source_table_name};
use crate::graph::{DEFAULT_NAMESPACE, FlowGraph, ParentOutput};
use crate::model::{ModelColumns, Node};
use crate::sql::{Dialect, Select, SelectItem, Sql, Statement, TableRef};
use log::warn;

pub mod aggregate;
pub mod annotations;
pub mod container;
pub mod join;
pub mod load;
pub mod output;
pub mod transform;
pub mod unknown;

pub use aggregate::AggregateConverter;
pub use annotations::*;
pub use container::ContainerConverter;
pub use join::{JoinConverter, JoinKind, JoinPlan, NullFilter, Side, join_columns};
pub use load::LoadConverter;
pub use output::OutputConverter;
pub use transform::TransformConverter;
pub use unknown::UnknownConverter;

pub type NodeRegistry = Registry<dyn NodeConverter>;
pub type AnnotationRegistry = Registry<dyn AnnotationConverter>;

/// Everything a converter may read while converting one node.
pub struct ConvertContext<'a> {
    pub graph: &'a FlowGraph,
    pub config: &'a RunConfig,
    pub annotations: &'a AnnotationRegistry,
}

impl<'a> ConvertContext<'a> {
    pub fn new(
        graph: &'a FlowGraph,
        config: &'a RunConfig,
        annotations: &'a AnnotationRegistry,
    ) -> Self {
        Self {
            graph,
            config,
            annotations,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn pipeline(&self) -> AnnotationPipeline<'a> {
        AnnotationPipeline::new(self.annotations)
    }

    /// Model metadata for `node` with the configured tags.
    pub fn model_metadata(&self, node: &Node) -> Metadata {
        Metadata::model(node, &self.config.tags)
    }

    /// The predecessors a node's SQL reads from. A node without any reads its
    /// stand-in source table in the `Default` namespace, matching the
    /// `Default: Unknown` entry the column stage sees.
    pub fn inputs(&self, node: &Node) -> Vec<ParentOutput> {
        let parents = self.graph.parent_outputs(node.id());
        if !parents.is_empty() {
            return parents;
        }
        vec![ParentOutput {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: node.id().to_string(),
            name: node.name().to_string(),
            reference_name: source_table_name(node),
            columns: ModelColumns::Unknown,
        }]
    }

    /// Templates a node's statement: upstream models become `ref` markers and a
    /// stand-in source table becomes a `source` marker.
    pub fn render(&self, node: &Node, statement: Statement) -> Sql {
        let parents = self.graph.parent_reference_names(node.id());
        if parents.is_empty() {
            Sql::source_reference(
                statement,
                self.dialect(),
                &self.config.source_name,
                &[source_table_name(node)],
            )
        } else {
            Sql::model_reference(statement, self.dialect(), &parents)
        }
    }

    /// The node's model record, followed by the stand-in source record when it
    /// has no predecessors.
    pub fn model_records(&self, node: &Node, sql: Sql) -> Vec<ModelRecord> {
        let mut records = vec![ModelRecord::model(
            node.reference_name(),
            sql,
            self.model_metadata(node),
        )];
        if self.graph.parent_ids(node.id()).is_empty() {
            records.push(ModelRecord::source(
                source_table_name(node),
                Metadata::source(node, &self.config.source_name, &self.config.tags),
            ));
        }
        records
    }
}

/// The current end of a sub-query chain: where to select from, and what it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub table: TableRef,
    pub columns: ModelColumns,
}

/// Checks that a raw node or annotation has the shape the converter expects.
pub trait Validate {
    fn validate(&self, raw: &RawNode) -> Outcome<()>;
}

/// Turns a raw node into graph nodes. Most types produce exactly one node.
pub trait GenerateGraph {
    fn generate_graph(&self, raw: &RawNode) -> Outcome<FlowGraph> {
        Ok(FlowGraph::single(Node::new(raw.clone())))
    }
}

/// Computes a node's output columns from its predecessors.
pub trait ComputeColumns {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns>;
}

/// Emits the SQL model(s) and metadata of a node.
pub trait EmitSql {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>>;
}

/// A node-type strategy registered under a versioned type tag.
pub trait NodeConverter: Validate + GenerateGraph + ComputeColumns + EmitSql + Send + Sync {
    fn node_type(&self) -> &str;
}

/// A micro-transform strategy for before/after chains and container bodies.
pub trait AnnotationConverter: Validate + Send + Sync {
    fn annotation_type(&self) -> &str;

    /// Applies the operation to already flushed input columns.
    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns>;

    /// The sub-query performing the operation over `from`, whose columns are `columns`.
    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select>;
}

fn log_fallback(raw: &RawNode, stage: &str, err: &Unrecognized) {
    warn!(
        "{} of '{}' ({}, id {}) fell back to Unknown: {}",
        stage,
        raw.display_name(),
        raw.node_type(),
        raw.id(),
        err.reason
    );
}

/// Runs a node converter and substitutes the Unknown protocol for any
/// unrecognized shape.
pub struct WithFallback<'a> {
    converter: &'a dyn NodeConverter,
}

impl<'a> WithFallback<'a> {
    pub fn new(converter: &'a dyn NodeConverter) -> Self {
        Self { converter }
    }

    pub fn generate_graph(&self, raw: &RawNode) -> FlowGraph {
        let result = self
            .converter
            .validate(raw)
            .and_then(|_| self.converter.generate_graph(raw));
        result.unwrap_or_else(|err| {
            log_fallback(raw, "Graph generation", &err);
            unknown::unknown_graph(raw)
        })
    }

    pub fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> ModelColumns {
        if node.is_unknown() {
            return ModelColumns::Unknown;
        }
        let result = self
            .converter
            .validate(node.raw())
            .and_then(|_| self.converter.compute_columns(node, ctx));
        result.unwrap_or_else(|err| {
            log_fallback(node.raw(), "Column computation", &err);
            ModelColumns::Unknown
        })
    }

    pub fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Vec<ModelRecord> {
        if node.is_unknown() {
            return unknown::unknown_models(node, ctx);
        }
        let result = self
            .converter
            .validate(node.raw())
            .and_then(|_| self.converter.emit_models(node, ctx));
        result.unwrap_or_else(|err| {
            log_fallback(node.raw(), "SQL generation", &err);
            unknown::unknown_models(node, ctx)
        })
    }
}

/// Runs an annotation converter; an unrecognized annotation yields `Unknown`
/// columns and a pass-through sub-query.
pub struct AnnotationWithFallback<'a> {
    converter: &'a dyn AnnotationConverter,
}

impl<'a> AnnotationWithFallback<'a> {
    pub fn new(converter: &'a dyn AnnotationConverter) -> Self {
        Self { converter }
    }

    pub fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> ModelColumns {
        let result = self
            .converter
            .validate(raw)
            .and_then(|_| self.converter.compute_columns(raw, columns));
        result.unwrap_or_else(|err| {
            log_fallback(raw, "Annotation", &err);
            ModelColumns::Unknown
        })
    }

    pub fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Select {
        let result = self
            .converter
            .validate(raw)
            .and_then(|_| self.converter.emit_step(raw, columns, from.clone()));
        result.unwrap_or_else(|_| annotations::passthrough_step(raw, columns, from))
    }
}

/// The terminal `final` sub-query: the node's resolved column names, or `*`.
pub fn final_select(node: &Node, from: TableRef) -> Select {
    Select::from(from)
        .comment(node.name())
        .project(SelectItem::from_columns(&node.columns().flush()))
}

/// Fails unless exactly one input exists, returning it.
pub(crate) fn single_input<T>(inputs: impl IntoIterator<Item = T>, what: &str) -> Outcome<T> {
    let mut inputs = inputs.into_iter();
    match (inputs.next(), inputs.next()) {
        (Some(input), None) => Ok(input),
        (None, _) => Err(Unrecognized::new(format!("{} has no input", what))),
        (Some(_), Some(_)) => Err(Unrecognized::new(format!(
            "{} expects exactly one input",
            what
        ))),
    }
}
