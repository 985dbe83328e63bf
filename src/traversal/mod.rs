//! Traversal (aggregator) project membership

pub mod discover;
pub mod glob_resolver;

pub use discover::TraversalDiscoverer;
pub use glob_resolver::GlobMemberResolver;
