//! Tests for the column-set value model.
use flowsmith::prelude::*;

fn abc() -> ModelColumns {
    ModelColumns::computed(vec![
        ModelColumn::new("a", "integer"),
        ModelColumn::new("b", "string"),
        ModelColumn::new("c", "real"),
    ])
}

#[test]
fn test_add_keeps_name_unique() {
    let columns = abc().add(ModelColumn::new("b", "date"));
    assert_eq!(columns.names(), vec!["a", "b", "c"]);
    assert_eq!(columns.get("b").map(|c| c.data_type.as_str()), Some("date"));

    let columns = columns.add(ModelColumn::new("d", "string"));
    assert_eq!(columns.names().iter().filter(|n| **n == "d").count(), 1);
    assert_eq!(columns.len(), 4);
}

#[test]
fn test_add_on_unknown_is_noop() {
    let columns = ModelColumns::Unknown.add(ModelColumn::new("a", "string"));
    assert_eq!(columns, ModelColumns::Unknown);
}

#[test]
fn test_remove_last_column_yields_unknown() {
    let columns = ModelColumns::computed(vec![ModelColumn::new("only", "string")]);
    assert_eq!(columns.remove("only"), ModelColumns::Unknown);

    let columns = abc().remove("a").remove("b");
    assert_eq!(columns.names(), vec!["c"]);
    assert_eq!(columns.remove("c"), ModelColumns::Unknown);
}

#[test]
fn test_remove_missing_column_is_noop() {
    assert_eq!(abc().remove("zzz"), abc());
}

#[test]
fn test_empty_computed_collapses_to_unknown() {
    assert_eq!(ModelColumns::computed(Vec::new()), ModelColumns::Unknown);
}

#[test]
fn test_computed_dedupes_with_later_column_winning() {
    let columns = ModelColumns::computed(vec![
        ModelColumn::new("x", "string"),
        ModelColumn::new("y", "string"),
        ModelColumn::new("x", "integer"),
    ]);
    assert_eq!(columns.names(), vec!["x", "y"]);
    assert_eq!(columns.get("x").map(|c| c.data_type.as_str()), Some("integer"));
}

#[test]
fn test_flush_clears_sources_only() {
    let columns = abc().add(ModelColumn::derived(
        "a2",
        "integer",
        SourceExpr::Column("a".to_string()),
    ));
    let flushed = columns.flush();

    assert_eq!(flushed.names(), columns.names());
    assert!(flushed.columns().iter().all(|c| c.source.is_none()));
    assert_eq!(flushed.get("a2").map(|c| c.data_type.as_str()), Some("integer"));
    assert_eq!(ModelColumns::Unknown.flush(), ModelColumns::Unknown);
}

#[test]
fn test_merge_adds_every_column() {
    let other = ModelColumns::computed(vec![
        ModelColumn::new("c", "string"),
        ModelColumn::new("d", "string"),
    ]);
    let merged = abc().merge(&other);
    assert_eq!(merged.names(), vec!["a", "b", "c", "d"]);
    assert_eq!(merged.get("c").map(|c| c.data_type.as_str()), Some("string"));
}

#[test]
fn test_source_expr_display() {
    assert_eq!(SourceExpr::Column("a".to_string()).to_string(), "a");
    assert_eq!(
        SourceExpr::Aggregate {
            function: flowsmith::sql::AggregateFunction::CountDistinct,
            column: "id".to_string(),
        }
        .to_string(),
        "COUNTD(id)"
    );
}
