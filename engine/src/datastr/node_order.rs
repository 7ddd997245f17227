use crate::datastr::graph::NodeId;

pub type Rank = NodeId;

/// The contraction order of a hierarchy. Allows retrieving both the rank of a node
/// and the node for a given rank, so it is always clear in which direction a lookup goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOrder {
    // NodeIds ordered by their ranks - that is ascending in importance
    node_order: Vec<NodeId>,
    // The rank of each node - 0 was contracted first, n-1 last
    ranks: Vec<Rank>,
}

impl NodeOrder {
    /// Create a `NodeOrder` from a vector containing the node ids in the order they were contracted.
    pub fn from_node_order(node_order: Vec<NodeId>) -> NodeOrder {
        let n = node_order.len();
        assert!(n < <NodeId>::max_value() as usize);
        let mut ranks = vec![n as Rank; n];

        for (i, &node) in node_order.iter().enumerate() {
            ranks[node as usize] = i as Rank;
        }

        debug_assert_eq!(ranks.iter().position(|&rank| rank == n as Rank), None);

        NodeOrder { node_order, ranks }
    }

    /// Get node ranks (node -> rank) as a slice
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    /// Get rank for a given node
    pub fn rank(&self, node: NodeId) -> Rank {
        self.ranks[node as usize]
    }

    /// Number of nodes in the order
    pub fn len(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
