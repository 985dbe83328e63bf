//! Find the MSBuild projects affected by a change set.
//!
//! The pipeline: discover traversal members, build the project graph,
//! predict each project's input files, then map changed files onto nodes.

pub mod commands;
pub mod core;
pub mod graph;
pub mod model;
pub mod paths;
pub mod platform;
pub mod prediction;
pub mod traversal;
