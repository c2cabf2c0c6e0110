//! Several traits and structs for working with graphs.
//!
//! Two representations exist: the static adjacency array (`first_out_graph`) used for loading and
//! storing graphs and the mutable adjacency list graph (`contractor_graph`) the contraction works on.

pub mod contractor_graph;
pub mod first_out_graph;

pub use self::contractor_graph::{ContractorAdjacentEdge, ContractorEdge, ContractorEdgeData, ContractorGraph, InputEdge};
pub use self::first_out_graph::{degrees_to_first_out, OwnedGraph};

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints
pub type EdgeId = u32;
/// Basic weights are 32bit unsigned ints
pub type Weight = u32;
/// A sufficiently large infinity constant.
/// Set to `u32::MAX / 2` so that `INFINITY + x` for `x <= INFINITY` does not overflow.
pub const INFINITY: Weight = u32::MAX / 2;

/// Simple struct for weighted links.
/// No behaviour, just a pure data struct.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Link {
    pub node: NodeId,
    pub weight: Weight,
}

/// Base trait for graphs.
/// Interesting behaviour will be added through subtraits.
pub trait Graph {
    fn num_nodes(&self) -> usize;
    fn num_arcs(&self) -> usize;
}

pub trait LinkIterable<Link>: Graph {
    /// Type of the outgoing neighbor iterator.
    type Iter<'a>: Iterator<Item = Link>
    where
        Self: 'a;

    /// Get a iterator over the outgoing links of the given node.
    fn link_iter(&self, node: NodeId) -> Self::Iter<'_>;
}
