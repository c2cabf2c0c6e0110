use crate::datastr::graph::*;

pub type Rank = NodeId;

/// A type for node orders which allows efficiently retrieving both the rank in the order of a node
/// and the node for a given rank. Mostly useful, because this type makes it always clear
/// in which direction the mapping goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOrder {
    // NodeIds ordered by their ranks - that is ascending in importance
    node_order: Vec<NodeId>,
    // The rank of each node - 0 is the lowest importance, n-1 the highest
    ranks: Vec<Rank>,
}

impl NodeOrder {
    /// Create a `NodeOrder` from a order vector, that is a vector containing the node ids ordered by their rank.
    pub fn from_node_order(node_order: Vec<NodeId>) -> NodeOrder {
        let n = node_order.len();
        assert!(n < <NodeId>::MAX as usize);
        let mut ranks = vec![n as Rank; n];

        for (i, &node) in node_order.iter().enumerate() {
            ranks[node as usize] = i as Rank;
        }

        debug_assert_eq!(ranks.iter().position(|&rank| rank == n as Rank), None);

        NodeOrder { node_order, ranks }
    }

    /// Get node order (rank -> node) as a slice
    pub fn order(&self) -> &[NodeId] {
        &self.node_order
    }

    /// Get node ranks (node -> rank) as a slice
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    pub fn rank(&self, node: NodeId) -> Rank {
        self.ranks[node as usize]
    }

    pub fn node(&self, rank: Rank) -> NodeId {
        self.node_order[rank as usize]
    }

    pub fn len(&self) -> usize {
        self.node_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
