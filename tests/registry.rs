//! Tests for converter resolution and the builder's extension points.
mod common;
use common::*;
use flowsmith::compiler::{
    Registry, Resolution, TypeTag, create_converter_by_tag, default_annotation_registry,
    default_node_registry,
};
use flowsmith::converters::{TransformConverter, UnknownConverter};
use flowsmith::error::Outcome;
use flowsmith::prelude::*;

#[test]
fn test_type_tag_parse() {
    let tag = TypeTag::parse(".v2018_2_3.SuperJoin");
    assert_eq!(tag.version, Some("v2018_2_3"));
    assert_eq!(tag.base, "SuperJoin");

    let bare = TypeTag::parse("Pivot");
    assert_eq!(bare.version, None);
    assert_eq!(bare.base, "Pivot");
}

#[test]
fn test_exact_match_wins() {
    let registry = default_node_registry();
    let (converter, resolution) = registry.resolve_with(".v2018_2_3.SuperJoin");
    assert_eq!(resolution, Resolution::Exact);
    assert_eq!(converter.node_type(), ".v2018_2_3.SuperJoin");
}

#[test]
fn test_newer_version_resolves_by_bare_type() {
    let registry = default_node_registry();
    let (converter, resolution) = registry.resolve_with(".v2024_1_1.SuperAggregate");
    assert_eq!(
        resolution,
        Resolution::Suffix(".v2018_2_3.SuperAggregate".to_string())
    );
    assert_eq!(converter.node_type(), ".v2018_2_3.SuperAggregate");
}

#[test]
fn test_unregistered_type_falls_back_to_unknown() {
    let registry = default_node_registry();
    let (converter, resolution) = registry.resolve_with(".v2019_1_1.Pivot");
    assert_eq!(resolution, Resolution::Fallback);
    assert_eq!(converter.node_type(), "Unknown");

    let annotations = default_annotation_registry();
    assert_eq!(
        annotations.resolve_with(".v1.SplitColumn").1,
        Resolution::Fallback
    );
}

#[test]
fn test_suffix_match_is_latest_registration() {
    let mut registry: Registry<dyn NodeConverter> = Registry::new(Box::new(UnknownConverter::new()));
    registry.register("A.v1.Foo", Box::new(TransformConverter::new("A.v1.Foo")));
    registry.register("B.v2.Foo", Box::new(TransformConverter::new("B.v2.Foo")));

    for _ in 0..3 {
        let (converter, resolution) = registry.resolve_with("C.v3.Foo");
        assert_eq!(converter.node_type(), "B.v2.Foo");
        assert_eq!(resolution, Resolution::Suffix("B.v2.Foo".to_string()));
    }
    assert_eq!(registry.tags(), vec!["A.v1.Foo", "B.v2.Foo"]);
}

#[test]
fn test_reregistering_tag_replaces_in_place() {
    let mut registry: Registry<dyn NodeConverter> = Registry::new(Box::new(UnknownConverter::new()));
    registry.register("A.v1.Foo", Box::new(TransformConverter::new("A.v1.Foo")));
    registry.register("B.v2.Foo", Box::new(TransformConverter::new("B.v2.Foo")));
    registry.register("A.v1.Foo", Box::new(TransformConverter::new("A.v1.Foo")));

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.resolve("C.v3.Foo").node_type(), "A.v1.Foo");
}

#[test]
fn test_create_converter_by_tag() {
    assert!(create_converter_by_tag(".v1.LoadCsv").is_some());
    assert!(create_converter_by_tag(".v1.NoSuchStep").is_none());
}

#[test]
fn test_with_type_mapping_routes_user_tag() {
    let nodes = vec![
        load_csv("1", "Orders", &[("a", "string")], vec![next("2")]),
        json_with_type(
            transform("2", "Clean", vec![annotation("Default", remove_columns("r", &["a"]))], vec![]),
            "Custom.Cleaner",
        ),
    ];
    let compiler = Compiler::builder(document(nodes), RunConfig::default())
        .with_type_mapping("Custom.Cleaner", ".v2018_2_3.SuperTransform")
        .build();

    let (_, resolution) = compiler.converters().resolve_with("Custom.Cleaner");
    assert_eq!(resolution, Resolution::Exact);

    let compilation = compiler.compile().expect("Failed to compile flow");
    assert_eq!(compilation.report.unrecognized(), 0);
    assert!(compilation.graph.get("2").map(|n| !n.is_unknown()).unwrap_or(false));
}

#[test]
fn test_mapping_to_unknown_builtin_is_ignored() {
    let compiler = Compiler::builder(document(vec![]), RunConfig::default())
        .with_type_mapping("Custom.Thing", ".v1.NoSuchStep")
        .build();
    assert!(!compiler.converters().contains("Custom.Thing"));
}

fn json_with_type(mut node: serde_json::Value, node_type: &str) -> serde_json::Value {
    node["nodeType"] = serde_json::Value::String(node_type.to_string());
    node
}

/// A step that always produces one `constant` column.
struct ConstantStep;

impl Validate for ConstantStep {
    fn validate(&self, raw: &RawNode) -> Outcome<()> {
        raw.require(&["name"])
    }
}

impl GenerateGraph for ConstantStep {}

impl ComputeColumns for ConstantStep {
    fn compute_columns(&self, _node: &Node, _ctx: &ConvertContext<'_>) -> Outcome<ModelColumns> {
        Ok(ModelColumns::computed(vec![ModelColumn::new("constant", "integer")]))
    }
}

impl EmitSql for ConstantStep {
    fn emit_models(&self, _node: &Node, _ctx: &ConvertContext<'_>) -> Outcome<Vec<ModelRecord>> {
        Ok(Vec::new())
    }
}

impl NodeConverter for ConstantStep {
    fn node_type(&self) -> &str {
        ".v1.Constant"
    }
}

#[test]
fn test_custom_converter_participates_in_lineage() {
    let constant = serde_json::json!({
        "nodeType": ".v1.Constant",
        "name": "Constant",
        "id": "c",
        "nextNodes": [next("o")],
    });
    let compilation = Compiler::builder(
        document(vec![constant, output("o", "Out")]),
        RunConfig::default(),
    )
    .with_custom_converter(Box::new(ConstantStep))
    .build()
    .compile()
    .expect("Failed to compile flow");

    assert_eq!(column_names(&compilation, "c"), vec!["constant"]);
    assert_eq!(column_names(&compilation, "o"), vec!["constant"]);
    assert!(compilation.models.get("Constant_1").is_none());
    assert!(model_sql(&compilation, "Out_1").contains("{{ ref('Constant_1') }}"));
}
