//! Mutable adjacency list graph the contraction operates on.
//!
//! Every edge is stored at both of its endpoints: an edge `s -> t` lives in the list of `s` with
//! the `forward` flag and in the list of `t` (pointing back to `s`) with the `backward` flag.
//! This way all neighbours of a node, incoming and outgoing, can be found in its own list.

use super::*;
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractorEdgeData {
    pub weight: Weight,
    pub duration: Weight,
    /// Number of input edges this edge represents. Always at least one.
    pub original_edges: u32,
    /// The node contracted to create this edge for shortcuts, the input edge id otherwise.
    pub id: u32,
    pub shortcut: bool,
    pub forward: bool,
    pub backward: bool,
}

impl ContractorEdgeData {
    pub fn via_node(&self) -> Option<NodeId> {
        if self.shortcut {
            Some(self.id)
        } else {
            None
        }
    }
}

/// An edge as it is stored in the adjacency list of its source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractorAdjacentEdge {
    pub target: NodeId,
    pub data: ContractorEdgeData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractorEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub data: ContractorEdgeData,
}

impl ContractorEdge {
    // total order used to make the insertion of collected shortcuts deterministic
    pub(crate) fn sort_key(&self) -> (NodeId, NodeId, Weight, bool, bool, bool, Weight, u32) {
        (
            self.source,
            self.target,
            self.data.weight,
            self.data.shortcut,
            self.data.forward,
            self.data.backward,
            self.data.duration,
            self.data.id,
        )
    }
}

/// A directed road segment before import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: Weight,
    pub duration: Weight,
    pub forward: bool,
    pub backward: bool,
    pub id: EdgeId,
}

#[derive(Debug, Clone)]
pub struct ContractorGraph {
    edges: Vec<Vec<ContractorAdjacentEdge>>,
}

impl ContractorGraph {
    /// Create a graph with `num_nodes` nodes and no edges.
    pub fn new(num_nodes: usize) -> Self {
        assert!(num_nodes < NodeId::MAX as usize);
        ContractorGraph {
            edges: vec![Vec::new(); num_nodes],
        }
    }

    /// Import input edges.
    ///
    /// Each input edge is stored at both endpoints, self loops are dropped
    /// and parallel edges are reduced to the cheapest one per direction.
    /// When both directions end up with the same weight, a single bidirectional edge is stored.
    /// Zero weights are raised to one.
    ///
    /// ```
    /// use graph_contractor::datastr::graph::*;
    ///
    /// let edge = |source, target, weight| InputEdge { source, target, weight, duration: weight, forward: true, backward: false, id: 0 };
    /// let graph = ContractorGraph::from_input_edges(2, vec![edge(0, 1, 4), edge(1, 0, 4)]);
    ///
    /// assert_eq!(graph.num_edges(), 2);
    /// let data = graph.adjacent_edges(0)[0].data;
    /// assert!(data.forward && data.backward);
    /// ```
    pub fn from_input_edges(num_nodes: usize, input_edges: Vec<InputEdge>) -> Self {
        let mut edges: Vec<ContractorEdge> = Vec::with_capacity(input_edges.len() * 2);

        for input in input_edges {
            assert!((input.source as usize) < num_nodes && (input.target as usize) < num_nodes);
            if input.source == input.target {
                continue;
            }
            let data = ContractorEdgeData {
                weight: std::cmp::max(input.weight, 1),
                duration: input.duration,
                original_edges: 1,
                id: input.id,
                shortcut: false,
                forward: input.forward,
                backward: input.backward,
            };
            edges.push(ContractorEdge {
                source: input.source,
                target: input.target,
                data,
            });
            edges.push(ContractorEdge {
                source: input.target,
                target: input.source,
                data: ContractorEdgeData {
                    forward: input.backward,
                    backward: input.forward,
                    ..data
                },
            });
        }

        edges.par_sort_unstable_by_key(|edge| edge.sort_key());

        let mut graph = Self::new(num_nodes);
        for group in edges.chunk_by(|a, b| a.source == b.source && a.target == b.target) {
            let cheapest = |direction: fn(&ContractorEdgeData) -> bool| {
                group
                    .iter()
                    .filter(|edge| direction(&edge.data))
                    .min_by_key(|edge| (edge.data.weight, edge.data.duration))
                    .copied()
            };
            let forward = cheapest(|data| data.forward);
            let backward = cheapest(|data| data.backward);

            match (forward, backward) {
                (Some(mut forward), Some(backward)) if forward.data.weight == backward.data.weight => {
                    forward.data.backward = true;
                    forward.data.duration = std::cmp::min(forward.data.duration, backward.data.duration);
                    graph.insert_edge(forward);
                }
                (forward, backward) => {
                    if let Some(mut forward) = forward {
                        forward.data.backward = false;
                        graph.insert_edge(forward);
                    }
                    if let Some(mut backward) = backward {
                        backward.data.forward = false;
                        graph.insert_edge(backward);
                    }
                }
            }
        }

        graph
    }

    /// Import a static graph. Every arc becomes a forward edge, identified by its arc index.
    pub fn from_first_out_graph(graph: &OwnedGraph, durations: Option<&[Weight]>) -> Self {
        if let Some(durations) = durations {
            assert_eq!(durations.len(), graph.num_arcs());
        }

        let input_edges = (0..graph.num_nodes() as NodeId)
            .flat_map(|node| {
                graph
                    .neighbor_edge_indices_usize(node)
                    .zip(graph.link_iter(node))
                    .map(move |(arc, Link { node: head, weight })| InputEdge {
                        source: node,
                        target: head,
                        weight,
                        duration: durations.map_or(weight, |durations| durations[arc]),
                        forward: true,
                        backward: false,
                        id: arc as EdgeId,
                    })
            })
            .collect();

        Self::from_input_edges(graph.num_nodes(), input_edges)
    }

    pub fn num_nodes(&self) -> usize {
        self.edges.len()
    }

    /// Number of stored edges. Edges are stored at both endpoints and counted twice.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn adjacent_edges(&self, node: NodeId) -> &[ContractorAdjacentEdge] {
        &self.edges[node as usize]
    }

    /// Append an edge to the list of its source.
    pub fn insert_edge(&mut self, edge: ContractorEdge) {
        assert!((edge.source as usize) < self.num_nodes());
        assert!((edge.target as usize) < self.num_nodes());
        debug_assert!(edge.data.original_edges >= 1);
        debug_assert!(!edge.data.shortcut || (edge.data.id as usize) < self.num_nodes());

        self.edges[edge.source as usize].push(ContractorAdjacentEdge {
            target: edge.target,
            data: edge.data,
        });
    }

    /// The first edge stored at `source` pointing to `target`.
    pub fn find_edge_mut(&mut self, source: NodeId, target: NodeId) -> Option<&mut ContractorEdgeData> {
        self.edges[source as usize].iter_mut().find(|edge| edge.target == target).map(|edge| &mut edge.data)
    }

    /// For every node with `sources[node]` set, remove its edges pointing to nodes with `targets[target]` set.
    /// The lists are processed in parallel. Returns the number of removed edges.
    pub fn delete_edges_to_marked(&mut self, sources: &[bool], targets: &[bool]) -> usize {
        assert_eq!(sources.len(), self.num_nodes());
        assert_eq!(targets.len(), self.num_nodes());

        self.edges
            .par_iter_mut()
            .zip(sources.par_iter())
            .filter(|(_, is_source)| **is_source)
            .map(|(list, _)| {
                let before = list.len();
                list.retain(|edge| !targets[edge.target as usize]);
                before - list.len()
            })
            .sum()
    }

    /// All stored edges, ordered by source.
    pub fn edges(&self) -> impl Iterator<Item = ContractorEdge> + '_ {
        self.edges.iter().enumerate().flat_map(|(source, list)| {
            list.iter().map(move |edge| ContractorEdge {
                source: source as NodeId,
                target: edge.target,
                data: edge.data,
            })
        })
    }
}
