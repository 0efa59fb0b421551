use crate::graph::FlowGraph;
use crate::model::ModelName;
use ahash::AHashMap;
use itertools::Itertools;
use log::debug;

/// `name_<rank>`, with spaces and `/` removed from the step name and `rank`
/// the 1-based position of `id` among the ids sharing that name.
pub fn model_name(display_name: &str, rank: usize, prefix: Option<&str>) -> String {
    let base: String = display_name
        .chars()
        .filter(|c| *c != ' ' && *c != '/')
        .collect();
    match prefix {
        Some(prefix) => format!("{}__{}_{}", prefix, base, rank),
        None => format!("{}_{}", base, rank),
    }
}

/// Assigns every node a unique model name.
pub fn assign_model_names(graph: &mut FlowGraph, prefix: Option<&str>) {
    let mut by_name: AHashMap<String, Vec<String>> = AHashMap::new();
    for node in graph.nodes() {
        by_name
            .entry(node.name().to_string())
            .or_default()
            .push(node.id().to_string());
    }

    let names: Vec<(String, String)> = by_name
        .into_iter()
        .flat_map(|(display_name, ids)| {
            ids.into_iter()
                .sorted()
                .dedup()
                .enumerate()
                .map(move |(index, id)| (id, model_name(&display_name, index + 1, prefix)))
                .collect::<Vec<_>>()
        })
        .collect();

    for (id, name) in names {
        if let Some(node) = graph.get(&id).cloned() {
            debug!("Model name of '{}': {}", id, name);
            graph.upsert(node.with_model_name(ModelName::Computed(name)));
        }
    }
}
