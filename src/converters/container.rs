use super::*;
use crate::compiler::annotation::AnnotationPipeline;
use crate::graph::DEFAULT_NAMESPACE;
use crate::sql::CteChain;
use serde_json::Value;

/// Inner steps of a container in document order.
fn inner_nodes(raw: &RawNode) -> Outcome<Vec<RawNode>> {
    match raw.payload().pointer("/loomContainer/nodes") {
        Some(Value::Object(nodes)) => Ok(nodes.values().cloned().map(RawNode::lenient).collect()),
        _ => Err(Unrecognized::new("container has no loomContainer.nodes object")),
    }
}

/// Container steps: the inner steps are folded as micro-transforms over the
/// single `Default` input.
pub struct ContainerConverter {
    node_type: &'static str,
}

impl ContainerConverter {
    pub fn new(node_type: &'static str) -> Self {
        Self { node_type }
    }
}

impl Validate for ContainerConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        inner_nodes(raw).map(|_| ())
    }
}

impl GenerateGraph for ContainerConverter {}

impl ComputeColumns for ContainerConverter {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let inner = inner_nodes(node.raw())?;
        let input = ctx
            .graph
            .parent_columns(node.id())
            .remove(DEFAULT_NAMESPACE)
            .ok_or_else(|| Unrecognized::new("container needs a Default input"))?;
        Ok(ctx.pipeline().fold_columns(&inner, input.flush()))
    }
}

impl EmitSql for ContainerConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let inner = inner_nodes(node.raw())?;
        let parent = ctx
            .inputs(node)
            .into_iter()
            .find(|p| p.namespace == DEFAULT_NAMESPACE)
            .ok_or_else(|| Unrecognized::new("container needs a Default input"))?;

        let mut chain = CteChain::new();
        let mut inputs = AnnotationPipeline::source_steps(std::slice::from_ref(&parent), &mut chain);
        let input = inputs
            .remove(DEFAULT_NAMESPACE)
            .ok_or_else(|| Unrecognized::new("container needs a Default input"))?;
        let output = ctx.pipeline().fold_steps(&inner, input, &mut chain);
        chain.push("final", final_select(node, output.table));

        let sql = ctx.render(node, chain.finish());
        Ok(ctx.model_records(node, sql))
    }
}

impl NodeConverter for ContainerConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
