use crate::error::{CompileError, Outcome, Unrecognized};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The flow document: `{"nodes": {id: nodeObject}}`.
#[derive(Debug, Clone, Default)]
pub struct FlowDocument {
    pub nodes: Vec<RawNode>,
}

impl FlowDocument {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))?;
        Self::from_value(value)
    }

    /// Reads every node envelope, keeping document order.
    pub fn from_value(value: Value) -> Result<Self, CompileError> {
        let nodes = match value {
            Value::Object(mut root) => match root.remove("nodes") {
                Some(Value::Object(nodes)) => nodes,
                Some(_) | None => return Err(CompileError::MissingNodes),
            },
            _ => return Err(CompileError::MissingNodes),
        };

        let nodes = nodes
            .into_iter()
            .map(|(key, node)| {
                RawNode::from_value(node).map_err(|message| CompileError::MalformedNode {
                    key: key.clone(),
                    message,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { nodes })
    }
}

/// An outgoing connection declared by a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextNode {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub next_node_id: String,
    #[serde(default = "default_namespace")]
    pub next_namespace: String,
}

fn default_namespace() -> String {
    crate::graph::DEFAULT_NAMESPACE.to_string()
}

/// A raw node (or annotation) object with its common envelope already read.
///
/// The full object is kept as an opaque payload; converters read their
/// type-specific fields from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    id: String,
    name: Option<String>,
    node_type: String,
    next_nodes: Vec<NextNode>,
    payload: Value,
}

impl RawNode {
    /// Reads a top-level node. `id` and `nodeType` are required.
    pub fn from_value(payload: Value) -> Result<Self, String> {
        let id = payload
            .get("id")
            .and_then(Value::as_str)
            .ok_or("missing string field 'id'")?
            .to_string();
        let node_type = payload
            .get("nodeType")
            .and_then(Value::as_str)
            .ok_or("missing string field 'nodeType'")?
            .to_string();
        let next_nodes = match payload.get("nextNodes") {
            None | Some(Value::Null) => Vec::new(),
            Some(next) => Vec::<NextNode>::deserialize(next)
                .map_err(|e| format!("invalid 'nextNodes': {}", e))?,
        };
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            id,
            name,
            node_type,
            next_nodes,
            payload,
        })
    }

    /// Reads an annotation or inner container node. Nothing is required; a missing
    /// `nodeType` simply resolves to the Unknown converter.
    pub fn lenient(payload: Value) -> Self {
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        let next_nodes = payload
            .get("nextNodes")
            .and_then(|next| Vec::<NextNode>::deserialize(next).ok())
            .unwrap_or_default();

        Self {
            id: text("id").unwrap_or_default(),
            name: text("name"),
            node_type: text("nodeType").unwrap_or_default(),
            next_nodes,
            payload,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The name, or the id for nameless nodes.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn next_nodes(&self) -> &[NextNode] {
        &self.next_nodes
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn has(&self, key: &str) -> bool {
        self.payload.get(key).is_some()
    }

    /// Deserializes the whole payload into a typed shape.
    pub fn parse<T: DeserializeOwned>(&self) -> Outcome<T> {
        T::deserialize(&self.payload).map_err(Unrecognized::from)
    }

    /// Deserializes one field of the payload.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Outcome<T> {
        let value = self
            .payload
            .get(key)
            .ok_or_else(|| Unrecognized::new(format!("missing field '{}'", key)))?;
        T::deserialize(value).map_err(Unrecognized::from)
    }

    /// Fails unless every key is present.
    pub fn require(&self, keys: &[&str]) -> Outcome<()> {
        match keys.iter().find(|key| !self.has(key)) {
            Some(key) => Err(Unrecognized::new(format!(
                "node '{}' has no '{}' field",
                self.id, key
            ))),
            None => Ok(()),
        }
    }
}
