//! Prelude module for convenient imports
//!
//! Re-exports the types needed to compile a flow and write its models.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowsmith::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let config = RunConfig::new("path/to/flow").with_prefix("prep")?;
//! let compilation = run(&config, Path::new("models"))?;
//! println!("{}", compilation.report);
//! # Ok(())
//! # }
//! ```

// Pipeline
pub use crate::compiler::{Compilation, Compiler, CompilerBuilder, RunReport, StepStatus, run};

// Input, configuration and output
pub use crate::flow::{
    Dialect, FlowDocument, Metadata, ModelKind, ModelRecord, Models, RawNode, RunConfig,
    write_models,
};

// Graph and column model
pub use crate::graph::FlowGraph;
pub use crate::model::{ModelColumn, ModelColumns, ModelName, Node, SourceExpr};

// Extension points
pub use crate::converters::{
    AnnotationConverter, ComputeColumns, ConvertContext, EmitSql, GenerateGraph, NodeConverter,
    Validate,
};

// Error types
pub use crate::error::{CompileError, ConfigError, FlowError, OutputError, Unrecognized};

pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
