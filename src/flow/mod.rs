pub mod artifact;
pub mod config;
pub mod definition;

pub use crate::sql::Dialect;
pub use artifact::*;
pub use config::*;
pub use definition::*;
