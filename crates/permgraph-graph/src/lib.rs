//! Directed "inherits-from" graphs for permgraph.
//!
//! One graph instance holds one inheritance dimension (subjects or objects).
//! An edge `inheritor -> origin` means the inheritor depends on the origin.

pub mod graph;
pub mod types;

pub use graph::{DependencyGraph, InheritanceGraph};
pub use types::CyclePolicy;
