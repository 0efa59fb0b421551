use super::step;
use crate::converters::{AnnotationConverter, Validate};
use crate::error::Outcome;
use crate::flow::RawNode;
use crate::model::{ModelColumn, ModelColumns};
use crate::sql::{BinaryOperator, Expr, Literal, Select, SelectItem, TableRef};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
struct FieldType {
    #[serde(rename = "type")]
    data_type: String,
}

/// Target types in declaration order.
fn field_types(raw: &RawNode) -> Outcome<Vec<(String, String)>> {
    let fields: Map<String, Value> = raw.field("fields")?;
    fields
        .into_iter()
        .map(|(name, value)| -> Outcome<(String, String)> {
            let field: FieldType = serde_json::from_value(value)?;
            Ok((name, field.data_type))
        })
        .collect()
}

/// Changes declared column types, rendered as casts.
///
/// A field that is not among the input columns is added with its new type.
pub struct ChangeColumnType {
    annotation_type: &'static str,
}

impl ChangeColumnType {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }
}

impl Validate for ChangeColumnType {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        field_types(raw).map(|_| ())
    }
}

impl AnnotationConverter for ChangeColumnType {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(field_types(raw)?
            .into_iter()
            .fold(columns, |acc, (name, data_type)| {
                acc.add(ModelColumn::new(name, data_type))
            }))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let fields = field_types(raw)?;
        if !columns.is_computed() {
            return Ok(step(raw, columns, from));
        }
        let cast = |name: &str| {
            fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, data_type)| {
                    SelectItem::aliased(Expr::column(name).cast(data_type.clone()), name)
                })
        };
        let existing = columns
            .columns()
            .iter()
            .map(|c| cast(&c.name).unwrap_or_else(|| SelectItem::from_column(c)));
        let added = fields
            .iter()
            .filter(|(name, _)| !columns.contains(name))
            .filter_map(|(name, _)| cast(name));
        Ok(Select::from(from)
            .comment(raw.display_name())
            .project(existing.chain(added).collect::<Vec<_>>()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterSpec {
    filter_expression: String,
}

/// Keeps the rows matching a calculation.
pub struct FilterOperation {
    annotation_type: &'static str,
}

impl FilterOperation {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }
}

impl Validate for FilterOperation {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<FilterSpec>().map(|_| ())
    }
}

impl AnnotationConverter for FilterOperation {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, _raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(columns)
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let spec: FilterSpec = raw.parse()?;
        Ok(step(raw, columns, from).filter(Expr::Calculation(spec.filter_expression)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemapSpec {
    column_name: String,
    /// Bucket value to the input values it absorbs. Both sides are JSON-encoded.
    values: Map<String, Value>,
}

/// Groups column values into buckets with a CASE expression.
pub struct Remap {
    annotation_type: &'static str,
}

impl Remap {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    fn read(raw: &RawNode) -> Outcome<(String, Vec<(String, Vec<String>)>)> {
        let spec: RemapSpec = raw.parse()?;
        let buckets: Vec<(String, Vec<String>)> = spec
            .values
            .into_iter()
            .map(|(bucket, inputs)| -> Outcome<(String, Vec<String>)> {
                Ok((bucket, serde_json::from_value(inputs)?))
            })
            .collect::<Outcome<_>>()?;
        Ok((spec.column_name, buckets))
    }

    /// `CASE WHEN col = v THEN bucket ... ELSE col END`; first match wins.
    fn case_expr(column: &str, buckets: &[(String, Vec<String>)]) -> Expr {
        let whens = buckets
            .iter()
            .flat_map(|(bucket, inputs)| {
                let result = Expr::Literal(Literal::from_json_text(bucket));
                inputs.iter().map(move |input| {
                    let condition = match Literal::from_json_text(input) {
                        Literal::Null => Expr::column(column).is_null(),
                        value => Expr::binary(
                            Expr::column(column),
                            BinaryOperator::Eq,
                            Expr::Literal(value),
                        ),
                    };
                    (condition, result.clone())
                })
            })
            .collect();
        Expr::Case {
            whens,
            else_expr: Some(Box::new(Expr::column(column))),
        }
    }
}

impl Validate for Remap {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        Self::read(raw).map(|_| ())
    }
}

impl AnnotationConverter for Remap {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, _raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(columns)
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let (column, buckets) = Self::read(raw)?;
        let remapped = SelectItem::aliased(Self::case_expr(&column, &buckets), column.clone());

        let projection: Vec<SelectItem> = if columns.contains(&column) {
            columns
                .columns()
                .iter()
                .map(|c| {
                    if c.name == column {
                        remapped.clone()
                    } else {
                        SelectItem::from_column(c)
                    }
                })
                .collect()
        } else {
            let mut items = SelectItem::from_columns(columns);
            items.push(remapped);
            items
        };
        Ok(Select::from(from)
            .comment(raw.display_name())
            .project(projection))
    }
}
