//! Resumable dijkstra which settles one node per step.
//!
//! The search does not own the graph or its search records.
//! Adjacency lists and the `StatePool` are passed in on every step, so several searches
//! (e.g. both directions of a bidirectional query) can share one pool while
//! each of them keeps its own queue and distance array.

use super::*;

#[derive(Debug, Clone)]
pub struct SteppedSearch {
    // record of each node touched in the current query
    states: TimestampedVector<Option<StateId>>,
    // tentative distances, INFINITY for unreached nodes
    distances: TimestampedVector<Weight>,
    queue: NodeHeap<NodeState>,
    // the last settled node, its edges will be relaxed on the next step
    current: Option<StateId>,
    num_relaxed_arcs: usize,
}

impl SteppedSearch {
    /// Create a search for graphs with `n` nodes
    pub fn new(n: usize) -> SteppedSearch {
        SteppedSearch {
            states: TimestampedVector::new(n, None),
            distances: TimestampedVector::new(n, INFINITY),
            queue: NodeHeap::new(NodeState::compare),
            current: None,
            num_relaxed_arcs: 0,
        }
    }

    /// Start a new search from `from`. Forgets everything about the previous one.
    /// Records are taken from `pool`, which the caller is responsible for resetting.
    pub fn initialize(&mut self, pool: &mut StatePool, from: NodeId) {
        self.states.reset();
        self.distances.reset();
        self.queue.clear();
        self.num_relaxed_arcs = 0;

        let state = pool.create_state(from, 0.0);
        pool[state].opened = true;
        self.states.set(from as usize, Some(state));
        self.distances.set(from as usize, 0.0);
        self.current = Some(state);
    }

    /// Relax all edges of the last settled node and settle the closest node in the queue.
    /// Returns the newly settled node, or `None` once the search is exhausted.
    ///
    /// Edges to nodes for which `skip` returns true are ignored.
    /// `on_improve` is called whenever the tentative distance of a node decreases.
    pub fn settle_next_node(
        &mut self,
        adjacency: &[Vec<Edge>],
        pool: &mut StatePool,
        mut skip: impl FnMut(NodeId) -> bool,
        mut on_improve: impl FnMut(NodeId, Weight),
    ) -> Option<NodeId> {
        let current = self.current.take()?;
        let node = pool[current].id;
        let distance = pool[current].dist;

        for edge in &adjacency[node as usize] {
            if skip(edge.end) {
                continue;
            }

            let state = match self.states[edge.end as usize] {
                Some(state) => state,
                None => {
                    let state = pool.create_state(edge.end, INFINITY);
                    self.states.set(edge.end as usize, Some(state));
                    state
                }
            };

            if pool[state].visited {
                continue;
            }

            let proposed_distance = distance + edge.cost;
            if proposed_distance >= pool[state].dist {
                continue;
            }

            self.num_relaxed_arcs += 1;
            let record = &mut pool[state];
            record.dist = proposed_distance;
            record.prev = Some(node);
            record.attrs = Some(edge.attrs);
            self.distances.set(edge.end as usize, proposed_distance);

            if pool[state].opened {
                let position = pool[state].heap_index;
                self.queue.update_item(pool.states_mut(), position);
            } else {
                pool[state].opened = true;
                self.queue.push(pool.states_mut(), state);
            }

            on_improve(edge.end, proposed_distance);
        }

        pool[current].visited = true;

        let next = self.queue.pop(pool.states_mut())?;
        self.current = Some(next);
        Some(pool[next].id)
    }

    pub fn tentative_distance(&self, node: NodeId) -> Weight {
        self.distances[node as usize]
    }

    /// Tentative distances of all nodes, `INFINITY` if not reached
    pub fn distances(&self) -> &TimestampedVector<Weight> {
        &self.distances
    }

    /// Node and edge over which `node` was reached. `None` for the source and unreached nodes.
    pub fn predecessor(&self, pool: &StatePool, node: NodeId) -> Option<(NodeId, EdgeId)> {
        let state = &pool[self.states[node as usize]?];
        state.prev.zip(state.attrs)
    }

    /// Number of edge relaxations which improved a tentative distance in the current query
    pub fn num_relaxed_arcs(&self) -> usize {
        self.num_relaxed_arcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(end: NodeId, cost: Weight, attrs: EdgeId) -> Edge {
        Edge { end, cost, attrs }
    }

    #[test]
    fn settles_in_distance_order() {
        // 0 -> 1 (4), 0 -> 2 (1), 2 -> 1 (2), 1 -> 3 (1)
        let adjacency = vec![vec![edge(1, 4.0, 0), edge(2, 1.0, 1)], vec![edge(3, 1.0, 3)], vec![edge(1, 2.0, 2)], vec![]];
        let mut pool = StatePool::new();
        let mut search = SteppedSearch::new(4);
        search.initialize(&mut pool, 0);

        let mut settled = Vec::new();
        while let Some(node) = search.settle_next_node(&adjacency, &mut pool, |_| false, |_, _| ()) {
            settled.push((node, search.tentative_distance(node)));
        }

        assert_eq!(settled, vec![(2, 1.0), (1, 3.0), (3, 4.0)]);
        // node 1 is improved a second time over node 2
        assert_eq!(search.num_relaxed_arcs(), 4);
        assert_eq!(search.predecessor(&pool, 1), Some((2, 2)));
        assert_eq!(search.predecessor(&pool, 0), None);
        assert_eq!(search.settle_next_node(&adjacency, &mut pool, |_| false, |_, _| ()), None);
    }

    #[test]
    fn skipped_nodes_are_not_reached() {
        let adjacency = vec![vec![edge(1, 1.0, 0), edge(2, 5.0, 1)], vec![edge(2, 1.0, 2)], vec![]];
        let mut pool = StatePool::new();
        let mut search = SteppedSearch::new(3);
        search.initialize(&mut pool, 0);

        let mut improved = Vec::new();
        while search.settle_next_node(&adjacency, &mut pool, |node| node == 1, |node, dist| improved.push((node, dist))).is_some() {}

        assert_eq!(search.tentative_distance(1), INFINITY);
        assert_eq!(search.tentative_distance(2), 5.0);
        assert_eq!(improved, vec![(2, 5.0)]);
    }

    #[test]
    fn reinitialization_forgets_previous_query() {
        let adjacency = vec![vec![edge(1, 1.0, 0)], vec![]];
        let mut pool = StatePool::new();
        let mut search = SteppedSearch::new(2);
        search.initialize(&mut pool, 0);
        while search.settle_next_node(&adjacency, &mut pool, |_| false, |_, _| ()).is_some() {}
        assert_eq!(search.tentative_distance(1), 1.0);

        pool.reset();
        search.initialize(&mut pool, 1);
        assert_eq!(search.tentative_distance(0), INFINITY);
        assert_eq!(search.tentative_distance(1), 0.0);
        assert_eq!(search.settle_next_node(&adjacency, &mut pool, |_| false, |_, _| ()), None);
    }
}
