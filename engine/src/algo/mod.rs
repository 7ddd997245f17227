//! Building blocks for fast routing algorithms.

use crate::datastr::graph::*;

pub mod contraction_hierarchy;
pub mod dijkstra;

/// Simply a source-target pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// Common interface of all point to point algorithms.
/// Allows checking the results of one algorithm against another.
pub trait QueryServer {
    /// Length of the shortest path from `query.from` to `query.to`, `None` if `to` is unreachable.
    fn query_distance(&mut self, query: Query) -> Option<Weight>;
}
