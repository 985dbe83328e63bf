//! Project graph and affected-project analysis
//!
//! Built on evaluated project models + petgraph. Nodes are project files,
//! edges are `ProjectReference`s.

pub mod affected;
pub mod project_graph;

pub use affected::{AffectedAnalysis, AffectedProjects, AffectedResolver};
pub use project_graph::{ProjectGraph, ProjectNode};
