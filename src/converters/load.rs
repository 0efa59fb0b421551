use super::*;
use crate::flow::source_table_name;
use crate::model::ModelColumn;
use crate::sql::Sql;
use serde::Deserialize;

/// Required fields of a database load.
pub const LOAD_SQL_REQUIRED: &[&str] = &[
    "name",
    "nextNodes",
    "connectionAttributes",
    "fields",
    "relation",
];

/// Required fields of file and proxy loads.
pub const LOAD_FILE_REQUIRED: &[&str] = &["fields"];

#[derive(Debug, Deserialize)]
struct LoadField {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
}

/// Input steps. Each reads a source table and emits the model plus the source definition.
pub struct LoadConverter {
    node_type: &'static str,
    required: &'static [&'static str],
}

impl LoadConverter {
    pub fn new(node_type: &'static str, required: &'static [&'static str]) -> Self {
        Self {
            node_type,
            required,
        }
    }
}

impl Validate for LoadConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.require(self.required)
    }
}

impl GenerateGraph for LoadConverter {}

impl ComputeColumns for LoadConverter {
    fn compute_columns(&self, node: &Node, _ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let fields: Vec<LoadField> = node.raw().field("fields")?;
        Ok(ModelColumns::computed(
            fields
                .into_iter()
                .map(|f| ModelColumn::new(f.name, f.data_type)),
        ))
    }
}

impl EmitSql for LoadConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let source_table = source_table_name(node);
        let mut chain = crate::sql::CteChain::new();
        chain.push(
            "final",
            final_select(node, TableRef::model(source_table.clone()).alias("source")),
        );
        let sql = Sql::source_reference(
            chain.finish(),
            ctx.dialect(),
            &ctx.config.source_name,
            &[source_table.clone()],
        );

        Ok(vec![
            ModelRecord::model(node.reference_name(), sql, ctx.model_metadata(node)),
            ModelRecord::source(
                source_table,
                Metadata::source(node, &ctx.config.source_name, &ctx.config.tags),
            ),
        ])
    }
}

impl NodeConverter for LoadConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
