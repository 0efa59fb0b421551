//! # Flowsmith - Flow to SQL Model Translator
//!
//! **Flowsmith** translates the JSON node graph of a visual data-prep flow into a
//! DAG of SQL transformation models, each with a YAML metadata document, ready for
//! a SQL-first transformation framework.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: Parse the flow's `{"nodes": {...}}` document into a [`flow::FlowDocument`].
//! 2.  **Configure**: Describe the run with a [`flow::RunConfig`] (dialect, source name, tags, prefix).
//! 3.  **Compile**: `Compiler::builder` resolves a converter per node type, builds the
//!     graph, names every model, computes column lineage and emits one SQL model per step.
//! 4.  **Write**: [`flow::write_models`] writes a `.sql` and a `.yml` file per model.
//!
//! Steps whose type or shape is not recognized never abort the run: they become
//! pass-through models and are listed in the [`compiler::RunReport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowsmith::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/flow")?;
//!     let document = FlowDocument::from_json(&json)?;
//!     let config = RunConfig::new("path/to/flow")
//!         .with_dialect("snowflake")?
//!         .with_tags("staging,prep")?;
//!
//!     let compilation = Compiler::builder(document, config)
//!         .with_type_mapping(".v2020_1_1.SuperJoin", ".v2018_2_3.SuperJoin")
//!         .build()
//!         .compile()?;
//!
//!     write_models(Path::new("models"), &compilation.models)?;
//!     println!("{}", compilation.report);
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod converters;
pub mod error;
pub mod flow;
pub mod graph;
pub mod model;
pub mod prelude;
pub mod sql;
