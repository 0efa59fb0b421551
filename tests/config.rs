//! Run configuration, model naming and flow file resolution.
mod common;
use common::*;
use flowsmith::compiler::naming::model_name;
use flowsmith::flow::is_identifier;
use flowsmith::prelude::*;
use std::fs;

#[test]
fn test_dialect_parsing() {
    let config = RunConfig::default();
    assert_eq!(config.dialect, Dialect::DuckDb);

    let config = RunConfig::default().with_dialect("postgre").expect("postgre is valid");
    assert_eq!(config.dialect, Dialect::Postgres);
    assert_eq!(config.dialect.to_string(), "postgre");

    match RunConfig::default().with_dialect("oracle") {
        Err(ConfigError::InvalidDialect(name)) => assert_eq!(name, "oracle"),
        other => panic!("Expected InvalidDialect, got {:?}", other),
    }
}

#[test]
fn test_identifiers() {
    assert!(is_identifier("SOURCE"));
    assert!(is_identifier("_staging2"));
    assert!(!is_identifier(""));
    assert!(!is_identifier("2fast"));
    assert!(!is_identifier("has space"));
    assert!(!is_identifier("semi;colon"));
}

#[test]
fn test_tags_and_source_name_are_validated() {
    let config = RunConfig::default()
        .with_tags("staging,prep")
        .expect("Tags should be valid");
    assert_eq!(config.tags, vec!["staging".to_string(), "prep".to_string()]);

    let config = config.with_tags("").expect("Empty tags should be valid");
    assert!(config.tags.is_empty());

    assert!(matches!(
        RunConfig::default().with_tags("ok,not ok"),
        Err(ConfigError::InvalidIdentifier { field: "tag", .. })
    ));
    assert!(matches!(
        RunConfig::default().with_source_name("raw-data"),
        Err(ConfigError::InvalidIdentifier {
            field: "source name",
            ..
        })
    ));
}

#[test]
fn test_empty_prefix_means_none() {
    let config = RunConfig::default().with_prefix("").expect("Empty prefix is valid");
    assert_eq!(config.prefix, None);
    let config = config.with_prefix("prep").expect("Prefix should be valid");
    assert_eq!(config.prefix.as_deref(), Some("prep"));
}

#[test]
fn test_model_name_format() {
    assert_eq!(model_name("Clean Orders", 1, None), "CleanOrders_1");
    assert_eq!(model_name("In/Out", 2, None), "InOut_2");
    assert_eq!(model_name("Orders", 1, Some("prep")), "prep__Orders_1");
}

#[test]
fn test_shared_names_rank_by_id() {
    let compilation = compile(vec![
        load_csv("b", "Orders", &[("a", "string")], vec![]),
        load_csv("a", "Orders", &[("a", "string")], vec![]),
        load_csv("c", "Customers", &[("a", "string")], vec![]),
    ]);
    let name_of = |id: &str| {
        compilation
            .graph
            .get(id)
            .and_then(|node| node.model_name().as_str())
            .map(str::to_string)
    };
    assert_eq!(name_of("a").as_deref(), Some("Orders_1"));
    assert_eq!(name_of("b").as_deref(), Some("Orders_2"));
    assert_eq!(name_of("c").as_deref(), Some("Customers_1"));
}

#[test]
fn test_prefix_and_tags_reach_outputs() {
    let config = RunConfig::default()
        .with_prefix("prep")
        .and_then(|c| c.with_tags("nightly"))
        .and_then(|c| c.with_source_name("RAW"))
        .expect("Config should be valid");
    let compilation = compile_with(
        vec![
            load_csv("1", "Orders", &[("a", "string")], vec![next("2")]),
            output("2", "Out"),
        ],
        config,
    );

    assert!(model_sql(&compilation, "prep__Orders_1")
        .contains("{{ source('RAW', 'source__prep__Orders_1') }}"));
    assert!(model_sql(&compilation, "prep__Out_1").contains("{{ ref('prep__Orders_1') }}"));

    let yaml = compilation
        .models
        .get("prep__Out_1")
        .expect("Output model should exist")
        .metadata
        .to_yaml("prep__Out_1")
        .expect("Metadata should serialize");
    assert!(yaml.contains("- nightly"));
}

#[test]
fn test_resolve_flow_definition() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let file = dir.path().join("orders.tfl.json");
    fs::write(&file, "{\"nodes\": {}}").expect("Failed to write flow");
    assert_eq!(
        RunConfig::new(&file).resolve_flow_definition().expect("File should resolve"),
        file
    );

    let extracted = dir.path().join("extracted");
    fs::create_dir(&extracted).expect("Failed to create dir");
    assert!(matches!(
        RunConfig::new(&extracted).resolve_flow_definition(),
        Err(ConfigError::MissingFlowDefinition(_))
    ));
    fs::write(extracted.join("flow"), "{\"nodes\": {}}").expect("Failed to write flow");
    assert_eq!(
        RunConfig::new(&extracted)
            .resolve_flow_definition()
            .expect("Directory should resolve"),
        extracted.join("flow")
    );

    assert!(matches!(
        RunConfig::new(dir.path().join("missing")).resolve_flow_definition(),
        Err(ConfigError::FlowFileNotFound(_))
    ));
}
