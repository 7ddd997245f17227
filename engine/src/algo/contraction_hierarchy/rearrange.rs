//! Turn the adjacency lists of a contracted graph into the search graphs of the hierarchy.

use super::*;

/// Restrict the forward lists to edges towards higher ranked nodes (the upward graph)
/// and the reverse lists to edges from higher ranked nodes (the downward graph).
/// Of parallel edges only the cheapest is kept, the first one on ties.
/// Locks the graph afterwards. Fails with `Error::Locked` if the graph is already locked.
pub fn rearrange(graph: &mut GraphStore, order: &NodeOrder) -> Result<()> {
    if graph.is_locked() {
        return Err(Error::Locked);
    }
    assert_eq!(order.len(), graph.num_nodes());

    let ranks = order.ranks();
    let (forward, backward) = graph.adjacency_lists_mut();
    for (node, (outgoing, incoming)) in forward.iter_mut().zip(backward.iter_mut()).enumerate() {
        keep_higher_ranked(outgoing, ranks[node], ranks);
        keep_higher_ranked(incoming, ranks[node], ranks);
    }

    graph.lock(Some(order.clone()));
    Ok(())
}

fn keep_higher_ranked(edges: &mut Vec<Edge>, rank: Rank, ranks: &[Rank]) {
    let mut kept: Vec<Edge> = Vec::with_capacity(edges.len());
    for edge in edges.drain(..).filter(|edge| ranks[edge.end as usize] > rank) {
        match kept.iter_mut().find(|other| other.end == edge.end) {
            Some(other) => {
                if edge.cost < other.cost {
                    *other = edge;
                }
            }
            None => kept.push(edge),
        }
    }
    *edges = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_cheapest_upward_edges() {
        let mut graph = GraphStore::new();
        graph.add_edge("a", "b", EdgeInput::new(3.0)).unwrap();
        graph.add_edge("a", "b", EdgeInput::new(2.0)).unwrap();
        graph.add_edge("a", "b", EdgeInput::new(2.0)).unwrap();
        graph.add_edge("b", "c", EdgeInput::new(1.0)).unwrap();
        graph.add_edge("c", "a", EdgeInput::new(1.0)).unwrap();

        // ranks: a = 0, c = 1, b = 2
        let order = NodeOrder::from_node_order(vec![0, 2, 1]);
        rearrange(&mut graph, &order).unwrap();

        assert_eq!(graph.adjacency_list()[0], vec![Edge { end: 1, cost: 2.0, attrs: 1 }]);
        assert!(graph.adjacency_list()[1].is_empty());
        assert!(graph.adjacency_list()[2].is_empty());
        assert_eq!(graph.reverse_adjacency_list()[0], vec![Edge { end: 2, cost: 1.0, attrs: 4 }]);
        assert!(graph.reverse_adjacency_list()[1].is_empty());
        assert_eq!(graph.reverse_adjacency_list()[2], vec![Edge { end: 1, cost: 1.0, attrs: 3 }]);

        for (node, edges) in graph.adjacency_list().iter().enumerate() {
            assert!(edges.iter().all(|edge| order.rank(edge.end) > order.rank(node as NodeId)));
        }

        assert!(graph.is_locked());
        assert_eq!(graph.node_order(), Some(&order));
        assert!(matches!(rearrange(&mut graph, &order), Err(Error::Locked)));
    }
}
