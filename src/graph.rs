use crate::error::CompileError;
use crate::model::{ModelColumns, Node};
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeMap;

/// Namespace of single-input connections.
pub const DEFAULT_NAMESPACE: &str = "Default";

/// A directed connection, labelled with the output slot of the source node
/// and the input slot of the destination node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub from_namespace: String,
    pub to_namespace: String,
}

/// What a node sees of one of its predecessors.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentOutput {
    pub namespace: String,
    pub id: String,
    pub name: String,
    pub reference_name: String,
    pub columns: ModelColumns,
}

/// Arena of nodes keyed by id plus namespace-labelled edges.
///
/// Nodes keep insertion order; updates overwrite the slot of an existing id.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: AHashMap<String, Node>,
    order: Vec<String>,
    edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding one node and the edges it declares.
    pub fn single(node: Node) -> Self {
        let mut graph = Self::new();
        graph.add_with_edges(node);
        graph
    }

    /// Inserts or replaces a node. Edges are untouched.
    pub fn upsert(&mut self, node: Node) {
        let id = node.id().to_string();
        if self.nodes.insert(id.clone(), node).is_none() {
            self.order.push(id);
        }
    }

    /// Inserts a node together with the edges from its declared next nodes.
    pub fn add_with_edges(&mut self, node: Node) {
        let edges: Vec<Edge> = node
            .raw()
            .next_nodes()
            .iter()
            .map(|next| Edge {
                from: node.id().to_string(),
                to: next.next_node_id.clone(),
                from_namespace: next.namespace.clone(),
                to_namespace: next.next_namespace.clone(),
            })
            .collect();
        self.upsert(node);
        for edge in edges {
            self.add_edge(edge);
        }
    }

    pub fn add_edge(&mut self, edge: Edge) {
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    /// Unions `other` into this graph. Nodes of `other` overwrite nodes with the same id.
    pub fn merge(&mut self, other: FlowGraph) {
        let FlowGraph {
            mut nodes,
            order,
            edges,
        } = other;
        for id in order {
            if let Some(node) = nodes.remove(&id) {
                self.upsert(node);
            }
        }
        for edge in edges {
            self.add_edge(edge);
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Node ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Fails on the first edge whose destination is not in the graph.
    pub fn validate_edges(&self) -> Result<(), CompileError> {
        match self.edges.iter().find(|e| !self.contains(&e.to)) {
            Some(edge) => Err(CompileError::NodeNotFound {
                missing_node_id: edge.to.clone(),
                source_node_id: edge.from.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Topological generations (Kahn). Nodes within a batch keep insertion order
    /// and never depend on each other.
    pub fn generations(&self) -> Result<Vec<Vec<String>>, CompileError> {
        let mut in_degree: AHashMap<&str, usize> =
            self.order.iter().map(|id| (id.as_str(), 0)).collect();
        let mut successors: AHashMap<&str, Vec<&str>> = AHashMap::new();
        for edge in &self.edges {
            if !self.contains(&edge.from) || !self.contains(&edge.to) {
                continue;
            }
            *in_degree.entry(edge.to.as_str()).or_default() += 1;
            successors
                .entry(edge.from.as_str())
                .or_default()
                .push(edge.to.as_str());
        }

        let mut current: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|id| in_degree.get(id).copied() == Some(0))
            .collect();
        let mut generations = Vec::new();
        let mut visited = 0;

        while !current.is_empty() {
            visited += current.len();
            let mut ready: AHashSet<&str> = AHashSet::new();
            for id in &current {
                for next in successors.get(id).into_iter().flatten() {
                    if let Some(degree) = in_degree.get_mut(next) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(*next);
                        }
                    }
                }
            }
            generations.push(current.iter().map(|id| id.to_string()).collect());
            current = self
                .order
                .iter()
                .map(String::as_str)
                .filter(|id| ready.contains(id))
                .collect();
        }

        if visited != self.order.len() {
            let stuck = self
                .order
                .iter()
                .filter(|id| in_degree.get(id.as_str()).copied().unwrap_or(0) > 0)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CompileError::CycleDetected(stuck));
        }
        Ok(generations)
    }

    fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.to == id && self.contains(&e.from))
    }

    /// Distinct predecessor ids in edge order.
    pub fn parent_ids(&self, id: &str) -> Vec<String> {
        let mut parents: Vec<String> = Vec::new();
        for edge in self.incoming(id) {
            if !parents.contains(&edge.from) {
                parents.push(edge.from.clone());
            }
        }
        parents
    }

    /// Predecessor state per destination namespace, in edge order.
    pub fn parent_outputs(&self, id: &str) -> Vec<ParentOutput> {
        self.incoming(id)
            .filter_map(|edge| {
                self.get(&edge.from).map(|parent| ParentOutput {
                    namespace: edge.to_namespace.clone(),
                    id: parent.id().to_string(),
                    name: parent.name().to_string(),
                    reference_name: parent.reference_name().to_string(),
                    columns: parent.columns().clone(),
                })
            })
            .collect()
    }

    /// Predecessor columns keyed by destination namespace. A node without
    /// predecessors gets `{"Default": Unknown}`.
    pub fn parent_columns(&self, id: &str) -> BTreeMap<String, ModelColumns> {
        let mut columns: BTreeMap<String, ModelColumns> = self
            .parent_outputs(id)
            .into_iter()
            .map(|parent| (parent.namespace, parent.columns))
            .collect();
        if columns.is_empty() {
            columns.insert(DEFAULT_NAMESPACE.to_string(), ModelColumns::Unknown);
        }
        columns
    }

    /// Reference names of all predecessors, in edge order.
    pub fn parent_reference_names(&self, id: &str) -> Vec<String> {
        self.parent_ids(id)
            .iter()
            .filter_map(|parent| self.get(parent))
            .map(|parent| parent.reference_name().to_string())
            .collect()
    }
}
