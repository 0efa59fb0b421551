//! Common test utilities for building flow documents.
use flowsmith::prelude::*;
use serde_json::{Value, json};

/// Outgoing connection into the `Default` slot of `next_id`.
#[allow(dead_code)]
pub fn next(next_id: &str) -> Value {
    next_into(next_id, "Default")
}

/// Outgoing connection into a named slot of `next_id`.
#[allow(dead_code)]
pub fn next_into(next_id: &str, namespace: &str) -> Value {
    json!({ "namespace": "Default", "nextNodeId": next_id, "nextNamespace": namespace })
}

/// A csv input step declaring `fields` as `(name, type)` pairs.
#[allow(dead_code)]
pub fn load_csv(id: &str, name: &str, fields: &[(&str, &str)], next_nodes: Vec<Value>) -> Value {
    let fields: Vec<Value> = fields
        .iter()
        .map(|(name, data_type)| json!({ "name": name, "type": data_type, "collation": null }))
        .collect();
    json!({
        "nodeType": ".v1.LoadCsv",
        "name": name,
        "id": id,
        "baseType": "input",
        "nextNodes": next_nodes,
        "fields": fields,
    })
}

/// Wraps an annotation node for a before/after chain.
#[allow(dead_code)]
pub fn annotation(namespace: &str, node: Value) -> Value {
    json!({ "namespace": namespace, "annotationNode": node })
}

/// A clean step with the given before-action annotations.
#[allow(dead_code)]
pub fn transform(id: &str, name: &str, before: Vec<Value>, next_nodes: Vec<Value>) -> Value {
    json!({
        "nodeType": ".v2018_2_3.SuperTransform",
        "name": name,
        "id": id,
        "baseType": "superNode",
        "nextNodes": next_nodes,
        "beforeActionAnnotations": before,
        "afterActionAnnotations": [],
    })
}

#[allow(dead_code)]
pub fn rename_column(id: &str, from: &str, to: &str) -> Value {
    json!({
        "nodeType": ".v1.RenameColumn",
        "name": format!("Rename {} to {}", from, to),
        "id": id,
        "columnName": from,
        "rename": to,
    })
}

#[allow(dead_code)]
pub fn remove_columns(id: &str, columns: &[&str]) -> Value {
    json!({ "nodeType": ".v1.RemoveColumns", "name": "Remove", "id": id, "columnNames": columns })
}

#[allow(dead_code)]
pub fn keep_only_columns(id: &str, columns: &[&str]) -> Value {
    json!({
        "nodeType": ".v2019_2_2.KeepOnlyColumns",
        "name": "Keep only",
        "id": id,
        "columnNames": columns,
    })
}

#[allow(dead_code)]
pub fn add_column(id: &str, column: &str, expression: &str) -> Value {
    json!({
        "nodeType": ".v1.AddColumn",
        "name": format!("Add {}", column),
        "id": id,
        "columnName": column,
        "expression": expression,
    })
}

#[allow(dead_code)]
pub fn filter(id: &str, expression: &str) -> Value {
    json!({
        "nodeType": ".v1.FilterOperation",
        "name": "Filter",
        "id": id,
        "filterExpression": expression,
    })
}

/// A join step with `(left, comparator, right)` conditions.
#[allow(dead_code)]
pub fn join(
    id: &str,
    name: &str,
    join_type: &str,
    conditions: &[(&str, &str, &str)],
    next_nodes: Vec<Value>,
) -> Value {
    let conditions: Vec<Value> = conditions
        .iter()
        .map(|(left, comparator, right)| {
            json!({
                "leftExpression": format!("[{}]", left),
                "rightExpression": format!("[{}]", right),
                "comparator": comparator,
            })
        })
        .collect();
    json!({
        "nodeType": ".v2018_2_3.SuperJoin",
        "name": name,
        "id": id,
        "baseType": "superNode",
        "nextNodes": next_nodes,
        "beforeActionAnnotations": [],
        "afterActionAnnotations": [],
        "actionNode": {
            "nodeType": ".v1.SimpleJoin",
            "name": name,
            "id": format!("{}-action", id),
            "conditions": conditions,
            "joinType": join_type,
        },
    })
}

/// An aggregate step. Group-by and aggregate fields are `(column, new name)` and
/// `(column, function, new name)`.
#[allow(dead_code)]
pub fn aggregate(
    id: &str,
    name: &str,
    group_by: &[(&str, Option<&str>)],
    aggregates: &[(&str, &str, Option<&str>)],
    next_nodes: Vec<Value>,
) -> Value {
    let group_by: Vec<Value> = group_by
        .iter()
        .map(|(column, new_name)| {
            json!({ "columnName": column, "function": "GroupBy", "newColumnName": new_name })
        })
        .collect();
    let aggregates: Vec<Value> = aggregates
        .iter()
        .map(|(column, function, new_name)| {
            json!({ "columnName": column, "function": function, "newColumnName": new_name })
        })
        .collect();
    json!({
        "nodeType": ".v2018_2_3.SuperAggregate",
        "name": name,
        "id": id,
        "baseType": "superNode",
        "nextNodes": next_nodes,
        "beforeActionAnnotations": [],
        "afterActionAnnotations": [],
        "actionNode": {
            "nodeType": ".v1.Aggregate",
            "name": name,
            "id": format!("{}-action", id),
            "groupByFields": group_by,
            "aggregateFields": aggregates,
        },
    })
}

#[allow(dead_code)]
pub fn container(id: &str, name: &str, inner: Vec<Value>, next_nodes: Vec<Value>) -> Value {
    let mut nodes = serde_json::Map::new();
    for node in inner {
        let key = node["id"].as_str().unwrap_or_default().to_string();
        nodes.insert(key, node);
    }
    json!({
        "nodeType": ".v1.Container",
        "name": name,
        "id": id,
        "baseType": "container",
        "nextNodes": next_nodes,
        "loomContainer": { "nodes": nodes, "connections": {} },
    })
}

#[allow(dead_code)]
pub fn output(id: &str, name: &str) -> Value {
    json!({
        "nodeType": ".v1.WriteToHyper",
        "name": name,
        "id": id,
        "baseType": "output",
        "nextNodes": [],
    })
}

/// A step of a type no converter is registered for.
#[allow(dead_code)]
pub fn pivot(id: &str, name: &str, next_nodes: Vec<Value>) -> Value {
    json!({
        "nodeType": ".v2019_1_1.Pivot",
        "name": name,
        "id": id,
        "baseType": "superNode",
        "nextNodes": next_nodes,
    })
}

/// `{"nodes": {id: node}}` in the given order.
#[allow(dead_code)]
pub fn flow_json(nodes: Vec<Value>) -> Value {
    let mut map = serde_json::Map::new();
    for node in nodes {
        let key = node["id"].as_str().unwrap_or_default().to_string();
        map.insert(key, node);
    }
    json!({ "nodes": map })
}

#[allow(dead_code)]
pub fn document(nodes: Vec<Value>) -> FlowDocument {
    FlowDocument::from_value(flow_json(nodes)).expect("Failed to read flow document")
}

/// Compiles with the default configuration.
#[allow(dead_code)]
pub fn compile(nodes: Vec<Value>) -> Compilation {
    compile_with(nodes, RunConfig::default())
}

#[allow(dead_code)]
pub fn compile_with(nodes: Vec<Value>, config: RunConfig) -> Compilation {
    Compiler::new(document(nodes), config)
        .compile()
        .expect("Failed to compile flow")
}

/// The templated SQL of a model.
#[allow(dead_code)]
pub fn model_sql<'a>(compilation: &'a Compilation, model: &str) -> &'a str {
    compilation
        .models
        .get(model)
        .and_then(|record| record.sql.as_ref())
        .map(|sql| sql.templated())
        .unwrap_or_else(|| panic!("No SQL for model '{}'", model))
}

/// Column names of a compiled node.
#[allow(dead_code)]
pub fn column_names(compilation: &Compilation, id: &str) -> Vec<String> {
    compilation
        .graph
        .get(id)
        .unwrap_or_else(|| panic!("No node '{}'", id))
        .columns()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
