use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the translation of a flow document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Failed to parse flow JSON: {0}")]
    JsonParseError(String),

    #[error(
        "The flow document has no top-level \"nodes\" object; check that the flow was saved by a supported version"
    )]
    MissingNodes,

    #[error("Node entry '{key}' is malformed: {message}")]
    MalformedNode { key: String, message: String },

    #[error(
        "Node '{missing_node_id}' not found, which is required by a connection from node '{source_node_id}'"
    )]
    NodeNotFound {
        missing_node_id: String,
        source_node_id: String,
    },

    #[error("The flow graph contains a cycle through node(s): {0}")]
    CycleDetected(String),
}

/// Errors raised while validating the run configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported dialect '{0}'; expected one of 'duckdb', 'postgre', 'snowflake'")]
    InvalidDialect(String),

    #[error("'{value}' is not a valid {field}: it must start with a letter or '_' and contain only letters, digits or '_'")]
    InvalidIdentifier { field: &'static str, value: String },

    #[error("Flow file '{0}' does not exist or cannot be read")]
    FlowFileNotFound(PathBuf),

    #[error("No usable flow definition was found inside '{0}'")]
    MissingFlowDefinition(PathBuf),
}

/// Errors raised while writing generated models to disk.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Could not write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata for model '{model}': {message}")]
    Yaml { model: String, message: String },
}

/// Any fatal error of a full run.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// The recoverable signal: a node or annotation whose shape does not match what its
/// resolved converter expects. It is always absorbed by the Unknown fallback.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized shape: {reason}")]
pub struct Unrecognized {
    pub reason: String,
}

impl Unrecognized {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Unrecognized {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result of a single converter capability.
pub type Outcome<T> = Result<T, Unrecognized>;
