//! Contraction of a single node, either simulated to compute statistics or committed to collect shortcuts.

use super::{
    ordering::FastHash,
    params::ContractionParams,
    thread_data::ContractorThreadData,
    witness_search::WitnessData,
};
use crate::datastr::graph::*;
use std::{
    cmp::max,
    sync::atomic::{AtomicU32, Ordering::Relaxed},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractionMode {
    /// Only count what contracting the node would change. `node_weights` may still be raised.
    Simulate,
    /// Collect the shortcuts needed to contract the node in the workers edge buffer.
    Commit,
}

/// What a simulated contraction of a node would change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContractionStats {
    pub edges_deleted_count: u32,
    pub edges_added_count: u32,
    pub original_edges_deleted_count: u32,
    pub original_edges_added_count: u32,
}

/// Everything the contraction of a node reads, shared by all workers of a phase.
#[derive(Debug, Clone, Copy)]
pub struct ContractionContext<'a> {
    pub graph: &'a ContractorGraph,
    pub node_weights: &'a [AtomicU32],
    pub params: &'a ContractionParams,
    pub fast_hash: &'a FastHash,
}

impl<'a> ContractionContext<'a> {
    pub fn new(graph: &'a ContractorGraph, node_weights: &'a [AtomicU32], params: &'a ContractionParams, fast_hash: &'a FastHash) -> Self {
        ContractionContext {
            graph,
            node_weights,
            params,
            fast_hash,
        }
    }

    /// Contract `node` on the current graph.
    ///
    /// Never modifies the graph. Committed shortcuts are appended to `data.inserted_edges`,
    /// with edges sharing `(source, target, weight, shortcut)` merged into one.
    /// `stats` is only updated in `Simulate` mode.
    pub fn contract_node(&self, mode: ContractionMode, data: &mut ContractorThreadData, node: NodeId, mut stats: Option<&mut ContractionStats>) -> bool {
        debug_assert!(mode == ContractionMode::Commit || stats.is_some());

        let ContractorThreadData { dijkstra, inserted_edges, .. } = data;
        let first_inserted = inserted_edges.len();
        let node_limit = match mode {
            ContractionMode::Simulate => self.params.simulation_search_space,
            ContractionMode::Commit => self.params.contraction_search_space,
        };
        let adjacent_edges = self.graph.adjacent_edges(node);

        for in_edge in adjacent_edges {
            let source = in_edge.target;
            if source == node {
                continue;
            }
            let in_data = &in_edge.data;

            if let Some(stats) = stats.as_deref_mut() {
                stats.edges_deleted_count += 1;
                stats.original_edges_deleted_count += in_data.original_edges;
            }
            if !in_data.backward {
                continue;
            }

            dijkstra.clear();
            dijkstra.insert(source, 0, WitnessData::default());
            let mut max_weight = 0;
            let mut number_of_targets = 0;

            for out_edge in adjacent_edges {
                let out_data = &out_edge.data;
                let target = out_edge.target;
                if !out_data.forward || target == node {
                    continue;
                }

                let path_weight = in_data.weight + out_data.weight;
                if target == source {
                    // u-turn at node: only worth a loop at source if it beats the u-turn cost there.
                    // Writing to source is safe because no other node next to source is contracted concurrently.
                    let node_weight = &self.node_weights[source as usize];
                    if path_weight < node_weight.load(Relaxed) {
                        match mode {
                            ContractionMode::Simulate => {
                                node_weight.store(path_weight + 1, Relaxed);
                                if let Some(stats) = stats.as_deref_mut() {
                                    stats.edges_added_count += 2;
                                    stats.original_edges_added_count += 2 * (out_data.original_edges + in_data.original_edges);
                                }
                            }
                            ContractionMode::Commit => {
                                node_weight.store(path_weight, Relaxed);
                                push_shortcut_pair(inserted_edges, source, target, node, in_data, out_data);
                            }
                        }
                    }
                    continue;
                }

                max_weight = max(max_weight, path_weight);
                if !dijkstra.was_inserted(target) {
                    dijkstra.insert(target, INFINITY, WitnessData { target: true });
                    number_of_targets += 1;
                }
            }

            dijkstra.run(number_of_targets, node_limit, max_weight, node, self.graph);

            for out_edge in adjacent_edges {
                let out_data = &out_edge.data;
                let target = out_edge.target;
                if !out_data.forward || target == node || target == source {
                    continue;
                }

                let path_weight = in_data.weight + out_data.weight;
                if path_weight < dijkstra.key(target) {
                    match mode {
                        ContractionMode::Simulate => {
                            if let Some(stats) = stats.as_deref_mut() {
                                stats.edges_added_count += 2;
                                stats.original_edges_added_count += 2 * (out_data.original_edges + in_data.original_edges);
                            }
                        }
                        ContractionMode::Commit => push_shortcut_pair(inserted_edges, source, target, node, in_data, out_data),
                    }
                }
            }
        }

        if mode == ContractionMode::Commit {
            merge_duplicate_edges(inserted_edges, first_inserted);
        }

        true
    }
}

// `source -> target` forward only and `target -> source` backward only, both representing the path through `node`
fn push_shortcut_pair(
    inserted_edges: &mut Vec<ContractorEdge>,
    source: NodeId,
    target: NodeId,
    node: NodeId,
    in_data: &ContractorEdgeData,
    out_data: &ContractorEdgeData,
) {
    let data = ContractorEdgeData {
        weight: in_data.weight + out_data.weight,
        duration: in_data.duration + out_data.duration,
        original_edges: in_data.original_edges + out_data.original_edges,
        id: node,
        shortcut: true,
        forward: true,
        backward: false,
    };
    inserted_edges.push(ContractorEdge { source, target, data });
    inserted_edges.push(ContractorEdge {
        source: target,
        target: source,
        data: ContractorEdgeData {
            forward: false,
            backward: true,
            ..data
        },
    });
}

// An edge which has a later twin with the same (source, target, weight, shortcut) is dropped
// and its direction flags are added to the twin. Compacts in place.
fn merge_duplicate_edges(inserted_edges: &mut Vec<ContractorEdge>, first: usize) {
    let mut kept = first;
    for i in first..inserted_edges.len() {
        let edge = inserted_edges[i];
        let twin = (i + 1..inserted_edges.len()).find(|&other| {
            let other = &inserted_edges[other];
            other.source == edge.source && other.target == edge.target && other.data.weight == edge.data.weight && other.data.shortcut == edge.data.shortcut
        });

        match twin {
            Some(twin) => {
                inserted_edges[twin].data.forward |= edge.data.forward;
                inserted_edges[twin].data.backward |= edge.data.backward;
            }
            None => {
                inserted_edges[kept] = edge;
                kept += 1;
            }
        }
    }
    inserted_edges.truncate(kept);
}
