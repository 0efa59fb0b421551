use crate::converters::{AnnotationRegistry, ConvertContext, NodeRegistry, WithFallback};
use crate::error::CompileError;
use crate::flow::RunConfig;
use crate::graph::FlowGraph;
use log::debug;

/// Computes the columns of every node, predecessors first.
///
/// Nodes whose columns are already computed are skipped, so running the pass
/// twice leaves the graph unchanged.
pub fn compute_lineage(
    graph: &mut FlowGraph,
    converters: &NodeRegistry,
    annotations: &AnnotationRegistry,
    config: &RunConfig,
) -> Result<(), CompileError> {
    for generation in graph.generations()? {
        for id in generation {
            let Some(node) = graph.get(&id) else {
                continue;
            };
            if node.columns().is_computed() {
                continue;
            }

            let columns = {
                let ctx = ConvertContext::new(graph, config, annotations);
                WithFallback::new(converters.resolve(node.node_type())).compute_columns(node, &ctx)
            };
            debug!(
                "Columns of '{}' ({}): {:?}",
                node.name(),
                id,
                columns.names()
            );
            let updated = node.clone().with_columns(columns);
            graph.upsert(updated);
        }
    }
    Ok(())
}
