use super::step;
use crate::converters::{AnnotationConverter, Validate};
use crate::error::Outcome;
use crate::flow::RawNode;
use crate::model::{ModelColumn, ModelColumns, SourceExpr};
use crate::sql::{Expr, Select, SelectItem, TableRef};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnExpression {
    column_name: String,
    expression: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnNames {
    column_names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ColumnRename {
    column_name: String,
    rename: String,
}

fn type_of(columns: &ModelColumns, name: &str) -> String {
    columns
        .get(name)
        .map(|c| c.data_type.clone())
        .unwrap_or_else(|| "string".to_string())
}

/// Adds a calculated column. Also serves quick calculations.
pub struct AddColumn {
    annotation_type: &'static str,
}

impl AddColumn {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    fn column(spec: &ColumnExpression) -> ModelColumn {
        ModelColumn::derived(
            spec.column_name.clone(),
            "string",
            SourceExpr::Calculation(spec.expression.clone()),
        )
    }
}

impl Validate for AddColumn {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<ColumnExpression>().map(|_| ())
    }
}

impl AnnotationConverter for AddColumn {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        let spec: ColumnExpression = raw.parse()?;
        Ok(columns.add(Self::column(&spec)))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let spec: ColumnExpression = raw.parse()?;
        if columns.is_computed() {
            return Ok(step(raw, &columns.clone().add(Self::column(&spec)), from));
        }
        Ok(Select::from(from).comment(raw.display_name()).project([
            SelectItem::wildcard(),
            SelectItem::from_column(&Self::column(&spec)),
        ]))
    }
}

/// Copies a column under a new name.
pub struct DuplicateColumn {
    annotation_type: &'static str,
}

impl DuplicateColumn {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    fn column(spec: &ColumnExpression, columns: &ModelColumns) -> ModelColumn {
        let source = spec.expression.trim_matches(|c| c == '[' || c == ']');
        ModelColumn::derived(
            spec.column_name.clone(),
            type_of(columns, source),
            SourceExpr::Column(source.to_string()),
        )
    }
}

impl Validate for DuplicateColumn {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<ColumnExpression>().map(|_| ())
    }
}

impl AnnotationConverter for DuplicateColumn {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        let spec: ColumnExpression = raw.parse()?;
        let column = Self::column(&spec, &columns);
        Ok(columns.add(column))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let spec: ColumnExpression = raw.parse()?;
        let column = Self::column(&spec, columns);
        if columns.is_computed() {
            return Ok(step(raw, &columns.clone().add(column), from));
        }
        Ok(Select::from(from)
            .comment(raw.display_name())
            .project([SelectItem::wildcard(), SelectItem::from_column(&column)]))
    }
}

/// Keeps the listed columns. A listed column missing from the input is added
/// back as a plain column.
pub struct KeepOnlyColumns {
    annotation_type: &'static str,
}

impl KeepOnlyColumns {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    /// Unknown input stays unknown: the listed names alone do not make a known set.
    fn keep(spec: &ColumnNames, columns: &ModelColumns) -> ModelColumns {
        if !columns.is_computed() {
            return ModelColumns::Unknown;
        }
        let kept = columns
            .columns()
            .iter()
            .filter(|c| spec.column_names.contains(&c.name))
            .cloned();
        let missing = spec
            .column_names
            .iter()
            .filter(|name| !columns.contains(name))
            .map(|name| ModelColumn::new(name.clone(), "string"));
        ModelColumns::computed(kept.chain(missing))
    }
}

impl Validate for KeepOnlyColumns {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<ColumnNames>().map(|_| ())
    }
}

impl AnnotationConverter for KeepOnlyColumns {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(Self::keep(&raw.parse()?, &columns))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let spec: ColumnNames = raw.parse()?;
        if columns.is_computed() {
            return Ok(step(raw, &Self::keep(&spec, columns), from));
        }
        Ok(Select::from(from).comment(raw.display_name()).project(
            spec.column_names
                .into_iter()
                .map(|name| SelectItem::new(Expr::column(name))),
        ))
    }
}

/// Drops the listed columns.
pub struct RemoveColumns {
    annotation_type: &'static str,
}

impl RemoveColumns {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    fn remove(spec: &ColumnNames, columns: ModelColumns) -> ModelColumns {
        spec.column_names
            .iter()
            .fold(columns, |acc, name| acc.remove(name))
    }
}

impl Validate for RemoveColumns {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<ColumnNames>().map(|_| ())
    }
}

impl AnnotationConverter for RemoveColumns {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(Self::remove(&raw.parse()?, columns))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let remaining = Self::remove(&raw.parse()?, columns.clone());
        Ok(step(raw, &remaining, from))
    }
}

/// Renames a column: the new name is derived from the old one, which is removed.
pub struct RenameColumn {
    annotation_type: &'static str,
}

impl RenameColumn {
    pub fn new(annotation_type: &'static str) -> Self {
        Self { annotation_type }
    }

    fn rename(spec: &ColumnRename, columns: ModelColumns) -> ModelColumns {
        if spec.column_name == spec.rename {
            return columns;
        }
        let column = ModelColumn::derived(
            spec.rename.clone(),
            type_of(&columns, &spec.column_name),
            SourceExpr::Column(spec.column_name.clone()),
        );
        columns.add(column).remove(&spec.column_name)
    }
}

impl Validate for RenameColumn {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.parse::<ColumnRename>().map(|_| ())
    }
}

impl AnnotationConverter for RenameColumn {
    fn annotation_type(&self) -> &str {
        self.annotation_type
    }

    fn compute_columns(&self, raw: &RawNode, columns: ModelColumns) -> Outcome<ModelColumns> {
        Ok(Self::rename(&raw.parse()?, columns))
    }

    fn emit_step(&self, raw: &RawNode, columns: &ModelColumns, from: TableRef) -> Outcome<Select> {
        let spec: ColumnRename = raw.parse()?;
        if columns.is_computed() || spec.column_name == spec.rename {
            return Ok(step(raw, &Self::rename(&spec, columns.clone()), from));
        }
        Ok(Select::from(from).comment(raw.display_name()).project([
            SelectItem::wildcard(),
            SelectItem::aliased(Expr::column(spec.column_name), spec.rename),
        ]))
    }
}
