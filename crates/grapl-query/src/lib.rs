//! The query graph, its compiler/executor, and the view materializer.
//!
//! A [`NodeQuery`] is a composable builder for one node of a subgraph
//! pattern; linked queries form a general directed graph (cycles are
//! valid). The compiler folds that graph into a staged declarative
//! program — root-scan variables, a coalesce stage, and a final
//! projection — which the executor runs through the store client in one
//! round trip. Result rows are hydrated into uid-deduplicated
//! [`NodeView`] graphs with lazy refetch.

pub mod adjacency;
pub mod compile;
pub mod error;
pub mod execute;
pub mod materialize;
pub mod node_query;
pub mod node_view;

#[cfg(test)]
mod testing;

pub use adjacency::to_adjacency_list;
pub use compile::{compile, QueryOptions};
pub use error::QueryError;
pub use materialize::Materializer;
pub use node_query::NodeQuery;
pub use node_view::NodeView;
