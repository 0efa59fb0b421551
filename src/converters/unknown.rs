//! The fallback for step types (or shapes) that cannot be converted.
//!
//! The fallback is total: an unknown step still yields one graph node, `Unknown`
//! columns, and a model whose SQL passes its input through.

use super::*;
use crate::flow::source_table_name;
use crate::sql::{CteChain, Query, Sql, UnionAll};

fn not_implemented(node: &Node) -> String {
    format!("conversion of this step is not implemented: {}", node.name())
}

/// A single graph node flagged unknown, wired by the step's declared next nodes.
pub fn unknown_graph(raw: &RawNode) -> FlowGraph {
    FlowGraph::single(Node::unknown(raw.clone()))
}

/// Wildcard pass-through SQL chosen by the number of predecessors.
///
/// No predecessor reads a stand-in source table, one reads the predecessor, and
/// several are combined with UNION ALL.
pub fn unknown_sql(node: &Node, ctx: &ConvertContext<'_>) -> Sql {
    let parents = ctx.graph.parent_reference_names(node.id());
    let mut chain = CteChain::new();

    match parents.as_slice() {
        [] | [_] => {
            let table = parents
                .first()
                .cloned()
                .unwrap_or_else(|| source_table_name(node));
            chain.push(
                "final",
                Select::from(TableRef::model(table).alias("source")).comment(not_implemented(node)),
            );
        }
        _ => {
            let union = UnionAll {
                comment: Some(not_implemented(node)),
                selects: parents
                    .iter()
                    .map(|parent| Select::from(TableRef::model(parent.clone())))
                    .collect(),
            };
            chain.push("final", Query::from(union));
        }
    }
    ctx.render(node, chain.finish())
}

/// The model record of an unknown step, plus a source record when it reads a
/// stand-in source table.
pub fn unknown_models(node: &Node, ctx: &ConvertContext<'_>) -> Vec<ModelRecord> {
    ctx.model_records(node, unknown_sql(node, ctx))
}

/// Registered as the fallback of the node registry. Never recognizes a step.
#[derive(Debug, Default)]
pub struct UnknownConverter;

impl UnknownConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Validate for UnknownConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        Err(Unrecognized::new(format!(
            "no converter registered for '{}'",
            raw.node_type()
        )))
    }
}

impl GenerateGraph for UnknownConverter {
    fn generate_graph(&self, raw: &RawNode) -> Outcome<FlowGraph> {
        Ok(unknown_graph(raw))
    }
}

impl ComputeColumns for UnknownConverter {
    fn compute_columns(&self, _node: &Node, _ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        Ok(ModelColumns::Unknown)
    }
}

impl EmitSql for UnknownConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        Ok(unknown_models(node, ctx))
    }
}

impl NodeConverter for UnknownConverter {
    fn node_type(&self) -> &str {
        "Unknown"
    }
}
