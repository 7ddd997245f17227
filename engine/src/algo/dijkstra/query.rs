//! Plain unidirectional dijkstra queries.
//!
//! Works on any `GraphStore` and needs no preprocessing.
//! On a contracted graph it only sees the upward graph though, so it should be used on uncontracted graphs,
//! mostly as ground truth for the faster algorithms.

use super::*;
use crate::report::*;

pub struct Server<'g> {
    graph: &'g GraphStore,
    pool: StatePool,
    search: SteppedSearch,
}

impl<'g> Server<'g> {
    pub fn new(graph: &'g GraphStore) -> Server<'g> {
        Server {
            graph,
            pool: StatePool::new(),
            search: SteppedSearch::new(graph.num_nodes()),
        }
    }

    fn run(&mut self, from: NodeId, to: NodeId) -> Option<Weight> {
        report!("algo", "Dijkstra Query");
        self.pool.reset();
        self.search.initialize(&mut self.pool, from);

        if from == to {
            return Some(0.0);
        }

        let mut num_queue_pops = 0;
        let adjacency = self.graph.adjacency_list();
        while let Some(node) = self.search.settle_next_node(adjacency, &mut self.pool, |_| false, |_, _| ()) {
            num_queue_pops += 1;
            if node == to {
                report!("num_queue_pops", num_queue_pops);
                report!("num_relaxed_arcs", self.search.num_relaxed_arcs());
                return Some(self.search.tentative_distance(node));
            }
        }

        report!("num_queue_pops", num_queue_pops);
        report!("num_relaxed_arcs", self.search.num_relaxed_arcs());
        None
    }

    /// Edges of the shortest path to `to` found by the last query, in path order.
    /// Empty if `to` was not reached.
    pub fn edge_path(&self, to: NodeId) -> Vec<EdgeId> {
        let mut path = Vec::new();
        let mut node = to;
        while let Some((prev, edge)) = self.search.predecessor(&self.pool, node) {
            path.push(edge);
            node = prev;
        }
        path.reverse();
        path
    }
}

impl<'g> QueryServer for Server<'g> {
    fn query_distance(&mut self, query: Query) -> Option<Weight> {
        self.run(query.from, query.to)
    }
}
