use super::*;
use crate::model::{ModelColumn, SourceExpr};
use crate::sql::{AggregateFunction, CteChain, Expr};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupByField {
    column_name: String,
    #[serde(default)]
    new_column_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateField {
    column_name: String,
    function: AggregateFunction,
    #[serde(default)]
    new_column_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateAction {
    group_by_fields: Vec<GroupByField>,
    aggregate_fields: Vec<AggregateField>,
}

fn read_action(raw: &RawNode) -> Outcome<AggregateAction> {
    raw.field("actionNode")
}

fn input_type(input: &ModelColumns, column: &str, default: &str) -> String {
    input
        .get(column)
        .map(|c| c.data_type.clone())
        .unwrap_or_else(|| default.to_string())
}

fn result_type(function: AggregateFunction, input: &ModelColumns, column: &str) -> String {
    match function {
        AggregateFunction::Count | AggregateFunction::CountDistinct => "integer".to_string(),
        AggregateFunction::Min | AggregateFunction::Max | AggregateFunction::Median => {
            input_type(input, column, "string")
        }
        _ => "real".to_string(),
    }
}

/// Group-by columns first, then one column per aggregate. Either may be renamed.
fn aggregate_columns(action: &AggregateAction, input: &ModelColumns) -> ModelColumns {
    let groups = action.group_by_fields.iter().map(|field| {
        let data_type = input_type(input, &field.column_name, "string");
        match &field.new_column_name {
            Some(new_name) => ModelColumn::derived(
                new_name.clone(),
                data_type,
                SourceExpr::Column(field.column_name.clone()),
            ),
            None => ModelColumn::new(field.column_name.clone(), data_type),
        }
    });
    let aggregates = action.aggregate_fields.iter().map(|field| {
        ModelColumn::derived(
            field
                .new_column_name
                .clone()
                .unwrap_or_else(|| field.column_name.clone()),
            result_type(field.function, input, &field.column_name),
            SourceExpr::Aggregate {
                function: field.function,
                column: field.column_name.clone(),
            },
        )
    });
    ModelColumns::computed(groups.chain(aggregates))
}

/// Aggregate steps: GROUP BY over a single input.
pub struct AggregateConverter {
    node_type: &'static str,
}

impl AggregateConverter {
    pub fn new(node_type: &'static str) -> Self {
        Self { node_type }
    }
}

impl Validate for AggregateConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        read_action(raw).map(|_| ())
    }
}

impl GenerateGraph for AggregateConverter {}

impl ComputeColumns for AggregateConverter {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let action = read_action(node.raw())?;
        let pipeline = ctx.pipeline();
        let inputs = pipeline.pre_calculate(node.raw(), ctx.graph.parent_columns(node.id()))?;
        let (_, input) = single_input(inputs, "aggregate step")?;
        pipeline.post_calculate(node.raw(), aggregate_columns(&action, &input))
    }
}

impl EmitSql for AggregateConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let action = read_action(node.raw())?;
        let pipeline = ctx.pipeline();
        let parents = ctx.inputs(node);
        let mut chain = CteChain::new();

        let inputs = pipeline.pre_statements(node.raw(), &parents, &mut chain)?;
        let (_, input) = single_input(inputs, "aggregate step")?;

        let columns = aggregate_columns(&action, &input.columns);
        let select = Select::from(input.table)
            .comment(node.name())
            .project(SelectItem::from_columns(&columns))
            .group_by(
                action
                    .group_by_fields
                    .iter()
                    .map(|field| Expr::column(field.column_name.clone())),
            );
        let table = chain.push("aggregate", select);

        let output = pipeline.post_statements(node.raw(), StepOutput { table, columns }, &mut chain)?;
        chain.push("final", final_select(node, output.table));

        let sql = ctx.render(node, chain.finish());
        Ok(ctx.model_records(node, sql))
    }
}

impl NodeConverter for AggregateConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
