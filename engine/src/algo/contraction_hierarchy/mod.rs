//! Contraction Hierarchy preprocessing.
//!
//! Nodes are contracted one by one in the order of a heuristic priority which is updated lazily.
//! Contracting a node removes it from the graph used by all later witness searches and inserts
//! shortcuts between its remaining neighbors where no witness path exists.
//! Shortcuts are appended to the `GraphStore` and remember the two edges they replace, so paths can be unpacked.
//! Afterwards the adjacency lists are rearranged into the upward and downward search graphs.

use super::*;
use crate::algo::dijkstra::SteppedSearch;
use crate::datastr::{index_heap::*, node_order::*, state_pool::*};
use crate::error::{Error, Result};
use crate::report::*;
use std::cmp::{max, Ordering};

pub mod query;
pub mod rearrange;

#[cfg(override_ch_witness_settle_limit)]
const WITNESS_SETTLE_LIMIT: usize = include!(concat!(env!("OUT_DIR"), "/CH_WITNESS_SETTLE_LIMIT"));
#[cfg(not(override_ch_witness_settle_limit))]
const WITNESS_SETTLE_LIMIT: usize = 500;

/// Tuning parameters of the preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractionParams {
    /// Maximum number of nodes a single witness search may settle.
    /// Aborted witness searches only lead to superfluous shortcuts, never to wrong distances.
    pub witness_settle_limit: usize,
}

impl Default for ContractionParams {
    fn default() -> Self {
        ContractionParams {
            witness_settle_limit: WITNESS_SETTLE_LIMIT,
        }
    }
}

/// Contract the graph with default parameters. See `contract_with`.
pub fn contract(graph: &mut GraphStore) -> Result<()> {
    contract_with(graph, ContractionParams::default())
}

/// Build the hierarchy in place: insert all shortcuts, rearrange the adjacency lists
/// into the upward and downward graph and lock the store.
/// Fails with `Error::Locked` if the graph was already contracted.
pub fn contract_with(graph: &mut GraphStore, params: ContractionParams) -> Result<()> {
    if graph.is_locked() {
        return Err(Error::Locked);
    }

    let _ctx = push_context("contraction".to_string());
    report!("num_nodes", graph.num_nodes());
    report!("num_original_edges", graph.num_edges());
    report!("witness_settle_limit", params.witness_settle_limit);

    graph.seal_original_edges();
    let num_original_edges = graph.num_edges();

    let order = report_time("CH contraction", || Contractor::new(&mut *graph, params).run());
    let num_shortcuts = graph.num_edges() - num_original_edges;
    report!("num_shortcuts", num_shortcuts);

    report_time_with_key("CH rearrangement", "rearrange_running_time_ms", || rearrange::rearrange(&mut *graph, &order))?;

    if graph.options().debug_mode {
        eprintln!(
            "contracted {} nodes, {} original edges, {} shortcuts, {} arcs in search graphs",
            graph.num_nodes(),
            num_original_edges,
            num_shortcuts,
            graph.num_arcs() + graph.reverse_adjacency_list().iter().map(Vec::len).sum::<usize>()
        );
    }

    Ok(())
}

/// Cheapest edge from or to an uncontracted neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
struct Link {
    node: NodeId,
    cost: Weight,
    edge: EdgeId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Shortcut {
    from: NodeId,
    to: NodeId,
    cost: Weight,
    first: EdgeId,
    second: EdgeId,
}

/// What contracting a node right now would do
#[derive(Debug)]
struct NodeContraction {
    shortcuts: Vec<Shortcut>,
    incoming: Vec<Link>,
    outgoing: Vec<Link>,
}

impl NodeContraction {
    fn edge_difference(&self) -> i64 {
        self.shortcuts.len() as i64 - (self.incoming.len() + self.outgoing.len()) as i64
    }
}

/// Entry of the contraction queue. Equal priorities are ordered by insertion.
#[derive(Debug, Clone)]
struct Candidate {
    priority: i64,
    seq: u64,
    heap_index: usize,
}

impl Candidate {
    fn compare(a: &Candidate, b: &Candidate) -> Ordering {
        a.priority.cmp(&b.priority).then(a.seq.cmp(&b.seq))
    }
}

impl HeapPosition for Candidate {
    #[inline(always)]
    fn heap_index(&self) -> usize {
        self.heap_index
    }

    #[inline(always)]
    fn set_heap_index(&mut self, position: usize) {
        self.heap_index = position;
    }
}

struct Contractor<'a> {
    graph: &'a mut GraphStore,
    params: ContractionParams,
    contracted: Vec<bool>,
    contracted_neighbors: Vec<i64>,
    // estimate for the depth of the hierarchy below each node
    levels: Vec<i64>,
    witness: SteppedSearch,
    pool: StatePool,
}

impl<'a> Contractor<'a> {
    fn new(graph: &'a mut GraphStore, params: ContractionParams) -> Contractor<'a> {
        let n = graph.num_nodes();
        Contractor {
            graph,
            params,
            contracted: vec![false; n],
            contracted_neighbors: vec![0; n],
            levels: vec![0; n],
            witness: SteppedSearch::new(n),
            pool: StatePool::new(),
        }
    }

    /// Contract all nodes and return the order in which it happened.
    fn run(mut self) -> NodeOrder {
        let n = self.graph.num_nodes();
        let mut seq = 0;
        let mut candidates = Vec::with_capacity(n);
        let mut queue = NodeHeap::new(Candidate::compare);

        for node in 0..n as NodeId {
            candidates.push(Candidate {
                priority: self.priority(node),
                seq,
                heap_index: INVALID_POSITION,
            });
            seq += 1;
            queue.push(&mut candidates, node);
        }

        let mut order = Vec::with_capacity(n);
        let timer = Timer::new();
        while let Some(node) = queue.pop(&mut candidates) {
            let contraction = self.simulate(node);
            let priority = self.priority_of(node, &contraction);

            // lazy update: neighbors of contracted nodes only get reevaluated when they come up
            if priority > candidates[node as usize].priority {
                candidates[node as usize].priority = priority;
                candidates[node as usize].seq = seq;
                seq += 1;
                queue.push(&mut candidates, node);
                continue;
            }

            self.contract(node, contraction);
            order.push(node);

            if order.len() % 100_000 == 0 {
                eprintln!("contracted {} of {} nodes after {}ms", order.len(), n, timer.get_passed_ms());
            }
        }

        NodeOrder::from_node_order(order)
    }

    fn priority(&mut self, node: NodeId) -> i64 {
        let contraction = self.simulate(node);
        self.priority_of(node, &contraction)
    }

    fn priority_of(&self, node: NodeId, contraction: &NodeContraction) -> i64 {
        contraction.edge_difference() + self.contracted_neighbors[node as usize] + self.levels[node as usize]
    }

    fn contract(&mut self, node: NodeId, contraction: NodeContraction) {
        for Shortcut { from, to, cost, first, second } in contraction.shortcuts {
            self.graph.push_shortcut(from, to, cost, first, second);
        }

        self.contracted[node as usize] = true;

        let mut neighbors: Vec<NodeId> = contraction.incoming.iter().chain(contraction.outgoing.iter()).map(|link| link.node).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        let level = self.levels[node as usize] + 1;
        for neighbor in neighbors {
            self.contracted_neighbors[neighbor as usize] += 1;
            self.levels[neighbor as usize] = max(self.levels[neighbor as usize], level);
        }
    }

    /// Determine the shortcuts required if `node` was contracted now.
    fn simulate(&mut self, node: NodeId) -> NodeContraction {
        let incoming = self.active_links(self.graph.reverse_adjacency_list(), node);
        let outgoing = self.active_links(self.graph.adjacency_list(), node);
        let mut shortcuts = Vec::new();

        for &Link { node: from, cost: in_cost, edge: first } in &incoming {
            let max_out_cost = outgoing.iter().filter(|link| link.node != from).map(|link| link.cost).fold(None, |acc: Option<Weight>, cost| {
                Some(acc.map_or(cost, |acc| acc.max(cost)))
            });
            let max_out_cost = match max_out_cost {
                Some(cost) => cost,
                None => continue,
            };

            self.witness_search(from, node, in_cost + max_out_cost);

            for &Link { node: to, cost: out_cost, edge: second } in &outgoing {
                if to == from {
                    continue;
                }
                let cost = in_cost + out_cost;
                if self.witness.tentative_distance(to) <= cost {
                    continue;
                }
                shortcuts.push(Shortcut { from, to, cost, first, second });
            }
        }

        NodeContraction { shortcuts, incoming, outgoing }
    }

    /// Edges between `node` and its uncontracted neighbors.
    /// Of parallel edges only the cheapest one is considered, the first one on ties.
    fn active_links(&self, adjacency: &[Vec<Edge>], node: NodeId) -> Vec<Link> {
        let mut links: Vec<Link> = Vec::new();
        for edge in &adjacency[node as usize] {
            if edge.end == node || self.contracted[edge.end as usize] {
                continue;
            }
            match links.iter_mut().find(|link| link.node == edge.end) {
                Some(link) => {
                    if edge.cost < link.cost {
                        link.cost = edge.cost;
                        link.edge = edge.attrs;
                    }
                }
                None => links.push(Link {
                    node: edge.end,
                    cost: edge.cost,
                    edge: edge.attrs,
                }),
            }
        }
        links
    }

    /// Dijkstra from `from` on the remaining graph without `excluded`.
    /// Stops once the next node is further away than `bound` or the settle limit is reached.
    fn witness_search(&mut self, from: NodeId, excluded: NodeId, bound: Weight) {
        let adjacency = self.graph.adjacency_list();
        let contracted = &self.contracted;

        self.pool.reset();
        self.witness.initialize(&mut self.pool, from);

        let mut num_settled = 0;
        while num_settled < self.params.witness_settle_limit {
            match self
                .witness
                .settle_next_node(adjacency, &mut self.pool, |node| node == excluded || contracted[node as usize], |_, _| ())
            {
                Some(node) if self.witness.tentative_distance(node) <= bound => num_settled += 1,
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str, Weight)]) -> GraphStore {
        let mut graph = GraphStore::new();
        for &(from, to, cost) in edges {
            graph.add_edge(from, to, EdgeInput::new(cost)).unwrap();
        }
        graph
    }

    #[test]
    fn contracting_a_path_middle_requires_shortcut() {
        let mut g = graph(&[("a", "b", 1.0), ("b", "c", 2.0)]);
        g.seal_original_edges();
        let mut contractor = Contractor::new(&mut g, ContractionParams::default());
        let b = 1;
        let contraction = contractor.simulate(b);
        assert_eq!(
            contraction.shortcuts,
            vec![Shortcut {
                from: 0,
                to: 2,
                cost: 3.0,
                first: 0,
                second: 1
            }]
        );
        assert_eq!(contraction.edge_difference(), -1);
    }

    #[test]
    fn witness_prevents_shortcut() {
        // a -> b -> c costs 3, the direct edge a -> c costs 3 as well
        let mut g = graph(&[("a", "b", 1.0), ("b", "c", 2.0), ("a", "c", 3.0)]);
        g.seal_original_edges();
        let mut contractor = Contractor::new(&mut g, ContractionParams::default());
        assert!(contractor.simulate(1).shortcuts.is_empty());
    }

    #[test]
    fn contracted_neighbors_are_ignored() {
        let mut g = graph(&[("a", "b", 1.0), ("b", "c", 2.0), ("c", "d", 1.0)]);
        g.seal_original_edges();
        let mut contractor = Contractor::new(&mut g, ContractionParams::default());
        let contraction = contractor.simulate(1);
        contractor.contract(1, contraction);
        // c now has the shortcut a -> c as incoming edge, b is gone
        let contraction = contractor.simulate(2);
        assert_eq!(contraction.incoming.iter().map(|link| link.node).collect::<Vec<_>>(), vec![0]);
        assert_eq!(contraction.shortcuts.len(), 1);
        assert_eq!(contraction.shortcuts[0].cost, 4.0);
        assert_eq!(contractor.contracted_neighbors[2], 1);
        assert_eq!(contractor.levels[2], 1);
    }

    #[test]
    fn shortcut_costs_are_sums_of_their_halves() {
        let mut g = graph(&[("a", "b", 1.5), ("b", "c", 2.25), ("c", "d", 4.0), ("d", "e", 0.5), ("e", "a", 3.0)]);
        contract(&mut g).unwrap();
        assert!(g.is_locked());
        let max = g.max_uncontracted_edge_index().unwrap();
        assert_eq!(max, 4);
        for edge in (max + 1)..g.num_edges() as EdgeId {
            let [first, second] = g.shortcut_halves(edge).unwrap();
            let props = g.edge_properties(edge);
            assert_eq!(props.cost, g.edge_properties(first).cost + g.edge_properties(second).cost);
            assert_eq!(props.start, g.edge_properties(first).start);
            assert_eq!(props.end, g.edge_properties(second).end);
            assert_eq!(g.edge_properties(first).end, g.edge_properties(second).start);
        }
    }

    #[test]
    fn contraction_is_deterministic() {
        let edges = [("a", "b", 1.0), ("b", "c", 1.0), ("c", "a", 1.0), ("c", "d", 2.0), ("d", "b", 5.0), ("a", "d", 4.0)];
        let mut g1 = graph(&edges);
        let mut g2 = graph(&edges);
        contract(&mut g1).unwrap();
        contract(&mut g2).unwrap();
        assert_eq!(g1.node_order(), g2.node_order());
        assert_eq!(g1.all_edge_properties(), g2.all_edge_properties());
        assert_eq!(g1.adjacency_list(), g2.adjacency_list());
    }

    #[test]
    fn contracting_twice_is_rejected() {
        let mut g = graph(&[("a", "b", 1.0)]);
        contract(&mut g).unwrap();
        assert!(matches!(contract(&mut g), Err(Error::Locked)));
        assert_eq!(g.max_uncontracted_edge_index(), Some(0));
    }

    #[test]
    fn empty_graph_contracts() {
        let mut g = GraphStore::new();
        contract(&mut g).unwrap();
        assert!(g.is_locked());
        assert_eq!(g.node_order().map(NodeOrder::len), Some(0));
    }
}
