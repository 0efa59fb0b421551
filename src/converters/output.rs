use super::*;
use crate::graph::DEFAULT_NAMESPACE;
use crate::sql::CteChain;

/// Output steps: select the single upstream model's columns.
pub struct OutputConverter {
    node_type: &'static str,
}

impl OutputConverter {
    pub fn new(node_type: &'static str) -> Self {
        Self { node_type }
    }
}

impl Validate for OutputConverter {
    fn validate(&self, _raw: &RawNode) -> Outcome<()> {
        Ok(())
    }
}

impl GenerateGraph for OutputConverter {}

impl ComputeColumns for OutputConverter {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let parents = ctx.graph.parent_columns(node.id());
        match single_input(parents, "output step")? {
            (namespace, columns) if namespace == DEFAULT_NAMESPACE => Ok(columns.flush()),
            (namespace, _) => Err(Unrecognized::new(format!(
                "output step reads from namespace '{}'",
                namespace
            ))),
        }
    }
}

impl EmitSql for OutputConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let parent = single_input(ctx.inputs(node), "output step")?;
        if parent.namespace != DEFAULT_NAMESPACE {
            return Err(Unrecognized::new(format!(
                "output step reads from namespace '{}'",
                parent.namespace
            )));
        }

        let mut chain = CteChain::new();
        chain.push(
            "final",
            final_select(
                node,
                TableRef::model(parent.reference_name).alias("source"),
            ),
        );
        let sql = ctx.render(node, chain.finish());
        Ok(ctx.model_records(node, sql))
    }
}

impl NodeConverter for OutputConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
