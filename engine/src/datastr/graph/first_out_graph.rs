//! Static graph representation used for loading input graphs and storing contracted ones.
//!
//! Nodes and edges are identified by ids going from `0` to `n-1` and `m-1` respectively, where `n` is the number of nodes and `m` the number of directed arcs.
//! We store the graph as an adjacency array using three collections: `first_out`, `head` and `weight`.
//! `head` and `weight` have each `m` elements.
//! `first_out` has `n+1` elements.
//! The first element of `first_out` is always 0 and the last one `m`.
//! `first_out[x]` contains the id of the first edge that is an outgoing edge of node `x`.
//! Thus, `head[first_out[x]..first_out[x+1]]` contains all neighbors of `x`.

use super::*;
use crate::io::*;
use std::ops::Range;

#[derive(Debug, Clone)]
pub struct OwnedGraph {
    // index of first edge of each node +1 entry in the end
    first_out: Vec<EdgeId>,
    // the node ids to which each edge points
    head: Vec<NodeId>,
    // the weight of each edge
    weight: Vec<Weight>,
}

impl OwnedGraph {
    /// Create a new graph from the three containers.
    pub fn new(first_out: Vec<EdgeId>, head: Vec<NodeId>, weight: Vec<Weight>) -> OwnedGraph {
        assert!(first_out.len() < <NodeId>::MAX as usize);
        assert!(head.len() < <EdgeId>::MAX as usize);
        assert_eq!(first_out.first().copied(), Some(0));
        assert_eq!(first_out.last().map(|&m| m as usize), Some(head.len()));
        assert_eq!(weight.len(), head.len());

        OwnedGraph { first_out, head, weight }
    }

    /// Get the range of edge ids which make up the outgoing edges of `node`
    pub fn neighbor_edge_indices(&self, node: NodeId) -> Range<EdgeId> {
        self.first_out[node as usize]..self.first_out[node as usize + 1]
    }

    pub fn neighbor_edge_indices_usize(&self, node: NodeId) -> Range<usize> {
        let range = self.neighbor_edge_indices(node);
        range.start as usize..range.end as usize
    }
}

impl Graph for OwnedGraph {
    fn num_nodes(&self) -> usize {
        self.first_out.len() - 1
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }
}

impl LinkIterable<Link> for OwnedGraph {
    #[allow(clippy::type_complexity)]
    type Iter<'a> = std::iter::Map<std::iter::Zip<std::slice::Iter<'a, NodeId>, std::slice::Iter<'a, Weight>>, fn((&NodeId, &Weight)) -> Link>;

    #[inline]
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_> {
        let range = self.neighbor_edge_indices_usize(node);
        self.head[range.clone()]
            .iter()
            .zip(self.weight[range].iter())
            .map(|(&neighbor, &weight)| Link { node: neighbor, weight })
    }
}

impl Reconstruct for OwnedGraph {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        let first_out: Vec<EdgeId> = loader.load("first_out")?;
        let head: Vec<NodeId> = loader.load("head")?;
        let weight: Vec<Weight> = loader.load("travel_time")?;

        if first_out.first() != Some(&0) || first_out.last().map(|&m| m as usize) != Some(head.len()) || weight.len() != head.len() {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "inconsistent first_out/head/travel_time"));
        }
        if head.iter().any(|&node| node as usize >= first_out.len() - 1) {
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "head contains invalid node ids"));
        }

        report!("graph", { "num_nodes": first_out.len() - 1, "num_arcs": head.len() });

        Ok(OwnedGraph::new(first_out, head, weight))
    }
}

/// Prefix sum over node degrees, yielding the `n+1` entries of a `first_out` array.
pub fn degrees_to_first_out<I: Iterator<Item = EdgeId>>(degrees: I) -> impl Iterator<Item = EdgeId> {
    std::iter::once(0).chain(degrees.scan(0, |state, degree| {
        *state += degree;
        Some(*state)
    }))
}
