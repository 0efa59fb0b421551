use super::*;
use crate::compiler::annotation::BEFORE_ACTION;
use crate::sql::CteChain;

/// Clean steps. The primary action is the identity; all work is in the annotations.
pub struct TransformConverter {
    node_type: &'static str,
}

impl TransformConverter {
    pub fn new(node_type: &'static str) -> Self {
        Self { node_type }
    }
}

impl Validate for TransformConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.require(&[BEFORE_ACTION])
    }
}

impl GenerateGraph for TransformConverter {}

impl ComputeColumns for TransformConverter {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let pipeline = ctx.pipeline();
        let inputs = pipeline.pre_calculate(node.raw(), ctx.graph.parent_columns(node.id()))?;
        let (_, columns) = single_input(inputs, "transform step")?;
        pipeline.post_calculate(node.raw(), columns)
    }
}

impl EmitSql for TransformConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let pipeline = ctx.pipeline();
        let parents = ctx.inputs(node);
        let mut chain = CteChain::new();

        let inputs = pipeline.pre_statements(node.raw(), &parents, &mut chain)?;
        let (_, input) = single_input(inputs, "transform step")?;
        let output = pipeline.post_statements(node.raw(), input, &mut chain)?;
        chain.push("final", final_select(node, output.table));

        let sql = ctx.render(node, chain.finish());
        Ok(ctx.model_records(node, sql))
    }
}

impl NodeConverter for TransformConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
