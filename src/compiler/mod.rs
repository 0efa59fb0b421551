//! The translation pipeline: graph building, model naming, column lineage and
//! model emission, driven over the converter registries.

use crate::converters::{
    AnnotationConverter, AnnotationRegistry, ConvertContext, NodeConverter, NodeRegistry,
    WithFallback,
};
use crate::error::{CompileError, ConfigError, FlowError};
use crate::flow::{FlowDocument, Models, RunConfig, write_models};
use crate::graph::FlowGraph;
use log::{debug, info};
use std::fs;
use std::path::Path;

pub mod annotation;
pub mod lineage;
pub mod naming;
pub mod registry;
pub mod report;

pub use annotation::AnnotationPipeline;
pub use lineage::compute_lineage;
pub use naming::assign_model_names;
pub use registry::*;
pub use report::{RunReport, StepReport, StepStatus};

/// Everything a compilation produces.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub graph: FlowGraph,
    pub models: Models,
    pub report: RunReport,
}

pub struct Compiler {
    document: FlowDocument,
    config: RunConfig,
    converters: NodeRegistry,
    annotations: AnnotationRegistry,
}

pub struct CompilerBuilder {
    document: FlowDocument,
    config: RunConfig,
    converters: NodeRegistry,
    annotations: AnnotationRegistry,
}

impl CompilerBuilder {
    pub fn new(document: FlowDocument, config: RunConfig) -> Self {
        Self {
            document,
            config,
            converters: default_node_registry(),
            annotations: default_annotation_registry(),
        }
    }

    /// Handles `user_tag` with the built-in converter registered as `builtin_tag`.
    /// Unknown built-in tags are ignored.
    pub fn with_type_mapping(mut self, user_tag: &str, builtin_tag: &str) -> Self {
        if let Some(converter) = create_converter_by_tag(builtin_tag) {
            self.converters.register(user_tag, converter);
        }
        self
    }

    pub fn with_custom_converter(mut self, converter: Box<dyn NodeConverter>) -> Self {
        let tag = converter.node_type().to_string();
        self.converters.register(tag, converter);
        self
    }

    pub fn with_annotation_mapping(mut self, user_tag: &str, builtin_tag: &str) -> Self {
        if let Some(converter) = create_annotation_by_tag(builtin_tag) {
            self.annotations.register(user_tag, converter);
        }
        self
    }

    pub fn with_custom_annotation(mut self, converter: Box<dyn AnnotationConverter>) -> Self {
        let tag = converter.annotation_type().to_string();
        self.annotations.register(tag, converter);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            document: self.document,
            config: self.config,
            converters: self.converters,
            annotations: self.annotations,
        }
    }
}

impl Compiler {
    pub fn builder(document: FlowDocument, config: RunConfig) -> CompilerBuilder {
        CompilerBuilder::new(document, config)
    }

    pub fn new(document: FlowDocument, config: RunConfig) -> Self {
        Self::builder(document, config).build()
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn converters(&self) -> &NodeRegistry {
        &self.converters
    }

    pub fn annotations(&self) -> &AnnotationRegistry {
        &self.annotations
    }

    /// One subgraph per raw node, merged in document order.
    pub fn build_graph(&self) -> Result<FlowGraph, CompileError> {
        let mut graph = FlowGraph::new();
        for raw in &self.document.nodes {
            let converter = self.converters.resolve(raw.node_type());
            graph.merge(WithFallback::new(converter).generate_graph(raw));
        }
        graph.validate_edges()?;
        Ok(graph)
    }

    /// Emits the models of every node, predecessors first.
    pub fn emit_models(&self, graph: &FlowGraph) -> Result<Models, CompileError> {
        let ctx = ConvertContext::new(graph, &self.config, &self.annotations);
        let mut models = Models::new();
        for id in graph.generations()?.into_iter().flatten() {
            if let Some(node) = graph.get(&id) {
                let converter = self.converters.resolve(node.node_type());
                let records = WithFallback::new(converter).emit_models(node, &ctx);
                debug!("'{}' emitted {} record(s)", node.name(), records.len());
                models.extend(records);
            }
        }
        Ok(models)
    }

    pub fn compile(&self) -> Result<Compilation, CompileError> {
        info!("Building graph from {} node(s)", self.document.nodes.len());
        let mut graph = self.build_graph()?;

        info!("Assigning model names");
        assign_model_names(&mut graph, self.config.prefix.as_deref());

        info!("Computing column lineage");
        compute_lineage(&mut graph, &self.converters, &self.annotations, &self.config)?;

        info!("Generating models");
        let models = self.emit_models(&graph)?;
        let report = RunReport::from_graph(&graph);

        Ok(Compilation {
            graph,
            models,
            report,
        })
    }
}

/// Reads the configured flow, compiles it and writes every model to `out_dir`.
pub fn run(config: &RunConfig, out_dir: &Path) -> Result<Compilation, FlowError> {
    let path = config.resolve_flow_definition()?;
    info!("Reading flow definition {}", path.display());
    let json =
        fs::read_to_string(&path).map_err(|_| ConfigError::FlowFileNotFound(path.clone()))?;
    let document = FlowDocument::from_json(&json)?;

    let compilation = Compiler::new(document, config.clone()).compile()?;
    let written = write_models(out_dir, &compilation.models)?;
    info!(
        "Wrote {} file(s) for {} step(s) to {}",
        written.len(),
        compilation.report.steps.len(),
        out_dir.display()
    );
    Ok(compilation)
}
