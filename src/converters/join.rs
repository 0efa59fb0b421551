use super::*;
use crate::model::{ModelColumn, SourceExpr};
use crate::sql::{BinaryOperator, CteChain, Expr, JoinOperator, Literal};
use serde::Deserialize;

pub const LEFT_NAMESPACE: &str = "Left";
pub const RIGHT_NAMESPACE: &str = "Right";

const LEFT_ALIAS: &str = "join_left";
const RIGHT_ALIAS: &str = "join_right";

/// The seven join kinds a join step offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinKind {
    Left,
    LeftOnly,
    Right,
    RightOnly,
    Inner,
    NotInner,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Post-join predicate keeping only unmatched rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullFilter {
    None,
    /// Every left key IS NULL.
    Left,
    /// Every right key IS NULL.
    Right,
    /// Any left or right key IS NULL.
    Either,
}

/// A join kind reduced to an outer/inner join plus an optional null filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinPlan {
    pub driver: Side,
    pub outer: bool,
    pub full: bool,
    pub filter: NullFilter,
}

impl JoinKind {
    pub fn plan(self) -> JoinPlan {
        let (driver, outer, full, filter) = match self {
            JoinKind::Left => (Side::Left, true, false, NullFilter::None),
            JoinKind::LeftOnly => (Side::Left, true, false, NullFilter::Right),
            JoinKind::Right => (Side::Right, true, false, NullFilter::None),
            JoinKind::RightOnly => (Side::Right, true, false, NullFilter::Left),
            JoinKind::Inner => (Side::Left, false, false, NullFilter::None),
            JoinKind::NotInner => (Side::Left, true, true, NullFilter::Either),
            JoinKind::Full => (Side::Left, true, true, NullFilter::None),
        };
        JoinPlan {
            driver,
            outer,
            full,
            filter,
        }
    }
}

impl JoinPlan {
    pub fn operator(&self) -> JoinOperator {
        match (self.outer, self.full) {
            (_, true) => JoinOperator::FullOuter,
            (true, false) => JoinOperator::LeftOuter,
            (false, false) => JoinOperator::Inner,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinCondition {
    left_expression: String,
    right_expression: String,
    comparator: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinAction {
    conditions: Vec<JoinCondition>,
    join_type: JoinKind,
}

/// A resolved condition: `left_key <op> right_key`.
struct KeyPair {
    left: String,
    right: String,
    op: BinaryOperator,
}

fn field_name(expression: &str) -> String {
    let trimmed = expression.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .map(|inner| inner.replace("]]", "]"))
        .unwrap_or_else(|| trimmed.to_string())
}

fn read_action(raw: &RawNode) -> Outcome<(JoinKind, Vec<KeyPair>)> {
    let action: JoinAction = raw.field("actionNode")?;
    if action.conditions.is_empty() && action.join_type.plan().filter != NullFilter::None {
        return Err(Unrecognized::new(format!(
            "{:?} join needs at least one condition to find unmatched rows",
            action.join_type
        )));
    }
    let keys = action
        .conditions
        .iter()
        .map(|c| -> Outcome<KeyPair> {
            let op = BinaryOperator::from_comparator(&c.comparator).ok_or_else(|| {
                Unrecognized::new(format!("unsupported join comparator '{}'", c.comparator))
            })?;
            Ok(KeyPair {
                left: field_name(&c.left_expression),
                right: field_name(&c.right_expression),
                op,
            })
        })
        .collect::<Outcome<Vec<_>>>()?;
    Ok((action.join_type, keys))
}

/// Left columns followed by the right ones. A right column whose name is taken
/// on the left is renamed once with a `-1` suffix.
pub fn join_columns(left: &ModelColumns, right: &ModelColumns) -> ModelColumns {
    if !left.is_computed() || !right.is_computed() {
        return ModelColumns::Unknown;
    }
    right.columns().iter().fold(left.clone(), |acc, column| {
        if left.contains(&column.name) {
            acc.add(ModelColumn::derived(
                format!("{}-1", column.name),
                "string",
                SourceExpr::Column(column.name.clone()),
            ))
        } else {
            acc.add(column.clone())
        }
    })
}

fn join_projection(left: &ModelColumns, right: &ModelColumns) -> Vec<SelectItem> {
    if !left.is_computed() || !right.is_computed() {
        return vec![SelectItem::wildcard()];
    }
    let left_items = left
        .columns()
        .iter()
        .map(|c| SelectItem::new(Expr::qualified(LEFT_ALIAS, c.name.clone())));
    let right_items = right.columns().iter().map(|c| {
        let expr = Expr::qualified(RIGHT_ALIAS, c.name.clone());
        if left.contains(&c.name) {
            SelectItem::aliased(expr, format!("{}-1", c.name))
        } else {
            SelectItem::new(expr)
        }
    });
    left_items.chain(right_items).collect()
}

/// AND of the key comparisons; a join without conditions pairs every row.
fn join_predicate(keys: &[KeyPair]) -> Expr {
    if keys.is_empty() {
        return Expr::Literal(Literal::Bool(true));
    }
    Expr::And(
        keys.iter()
            .map(|k| {
                Expr::binary(
                    Expr::qualified(LEFT_ALIAS, k.left.clone()),
                    k.op,
                    Expr::qualified(RIGHT_ALIAS, k.right.clone()),
                )
            })
            .collect(),
    )
}

fn null_filter(filter: NullFilter, keys: &[KeyPair]) -> Option<Expr> {
    let left_nulls = || keys.iter().map(|k| Expr::qualified(LEFT_ALIAS, k.left.clone()).is_null());
    let right_nulls = || keys.iter().map(|k| Expr::qualified(RIGHT_ALIAS, k.right.clone()).is_null());
    match filter {
        NullFilter::None => None,
        NullFilter::Left => Some(Expr::And(left_nulls().collect())),
        NullFilter::Right => Some(Expr::And(right_nulls().collect())),
        NullFilter::Either => Some(Expr::Or(left_nulls().chain(right_nulls()).collect())),
    }
}

fn take_sides<T>(mut inputs: std::collections::BTreeMap<String, T>) -> Outcome<(T, T)> {
    match (inputs.remove(LEFT_NAMESPACE), inputs.remove(RIGHT_NAMESPACE)) {
        (Some(left), Some(right)) => Ok((left, right)),
        _ => Err(Unrecognized::new("join step needs both a Left and a Right input")),
    }
}

/// Join steps over a `Left` and a `Right` input.
pub struct JoinConverter {
    node_type: &'static str,
}

impl JoinConverter {
    pub fn new(node_type: &'static str) -> Self {
        Self { node_type }
    }
}

impl Validate for JoinConverter {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        read_action(raw).map(|_| ())
    }
}

impl GenerateGraph for JoinConverter {}

impl ComputeColumns for JoinConverter {
    fn compute_columns(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        let pipeline = ctx.pipeline();
        let inputs = pipeline.pre_calculate(node.raw(), ctx.graph.parent_columns(node.id()))?;
        let (left, right) = take_sides(inputs)?;
        pipeline.post_calculate(node.raw(), join_columns(&left, &right))
    }
}

impl EmitSql for JoinConverter {
    fn emit_models(&self, node: &Node, ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        let (kind, keys) = read_action(node.raw())?;
        let plan = kind.plan();
        let pipeline = ctx.pipeline();
        let parents = ctx.inputs(node);
        let mut chain = CteChain::new();

        let inputs = pipeline.pre_statements(node.raw(), &parents, &mut chain)?;
        let (left, right) = take_sides(inputs)?;

        let left_table = left.table.clone().alias(LEFT_ALIAS);
        let right_table = right.table.clone().alias(RIGHT_ALIAS);
        let (driver, joined) = match plan.driver {
            Side::Left => (left_table, right_table),
            Side::Right => (right_table, left_table),
        };
        let on = join_predicate(&keys);
        let mut select = Select::from(driver)
            .comment(node.name())
            .project(join_projection(&left.columns, &right.columns))
            .join(plan.operator(), joined, on);
        if let Some(predicate) = null_filter(plan.filter, &keys) {
            select = select.filter(predicate);
        }

        let table = chain.push("joined", select);
        let output = StepOutput {
            table,
            columns: join_columns(&left.columns, &right.columns),
        };
        let output = pipeline.post_statements(node.raw(), output, &mut chain)?;
        chain.push("final", final_select(node, output.table));

        let sql = ctx.render(node, chain.finish());
        Ok(ctx.model_records(node, sql))
    }
}

impl NodeConverter for JoinConverter {
    fn node_type(&self) -> &str {
        self.node_type
    }
}
