pub mod column;
pub mod node;

pub use column::*;
pub use node::*;
