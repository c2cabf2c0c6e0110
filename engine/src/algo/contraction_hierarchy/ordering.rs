//! Node priorities and the selection of nodes which can be contracted concurrently.

use super::{
    contract_node::{ContractionContext, ContractionMode, ContractionStats},
    thread_data::ContractorThreadData,
};
use crate::datastr::graph::*;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

const HASH_SEED: u64 = 5489;

/// Hashes 32 bit node ids to 16 bits with two random permutation tables.
#[derive(Debug, Clone)]
pub struct FastHash {
    lower: Vec<u16>,
    upper: Vec<u16>,
}

impl Default for FastHash {
    fn default() -> Self {
        Self::new()
    }
}

impl FastHash {
    /// Both tables are shuffled with a fixed seed, so the hash is the same for every run.
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(HASH_SEED);
        let mut lower: Vec<u16> = (0..=u16::MAX).collect();
        let mut upper = lower.clone();
        lower.shuffle(&mut rng);
        upper.shuffle(&mut rng);
        FastHash { lower, upper }
    }

    #[inline]
    pub fn hash(&self, node: NodeId) -> u16 {
        self.lower[(node & 0xffff) as usize] ^ self.upper[(node >> 16) as usize]
    }

    /// Tie breaker between nodes of equal priority.
    /// If `bias(a, b)` is true, `a` has to wait for `b`.
    #[inline]
    pub fn bias(&self, a: NodeId, b: NodeId) -> bool {
        let hash_a = self.hash(a);
        let hash_b = self.hash(b);
        if hash_a != hash_b {
            hash_a < hash_b
        } else {
            a < b
        }
    }
}

/// `2 * added / deleted + 4 * original added / original deleted + depth`, or just the depth if nothing would be deleted.
pub fn priority_from_stats(stats: &ContractionStats, depth: u32) -> f32 {
    if stats.edges_deleted_count == 0 || stats.original_edges_deleted_count == 0 {
        return depth as f32;
    }
    2.0 * (stats.edges_added_count as f32 / stats.edges_deleted_count as f32)
        + 4.0 * (stats.original_edges_added_count as f32 / stats.original_edges_deleted_count as f32)
        + depth as f32
}

impl<'a> ContractionContext<'a> {
    /// Priority of `node` based on a simulated contraction. Lower priorities are contracted earlier.
    pub fn evaluate_node_priority(&self, data: &mut ContractorThreadData, depth: u32, node: NodeId) -> f32 {
        let mut stats = ContractionStats::default();
        self.contract_node(ContractionMode::Simulate, data, node, Some(&mut stats));
        priority_from_stats(&stats, depth)
    }

    fn waits_for(&self, priorities: &[f32], node: NodeId, other: NodeId) -> bool {
        let priority = priorities[node as usize];
        let other_priority = priorities[other as usize];
        // only exact ties go to the hash, so this is a strict order and the global minimum is always independent
        priority > other_priority || (priority == other_priority && self.fast_hash.bias(node, other))
    }

    /// A node is independent if it beats all nodes up to two hops away.
    /// Independent nodes thus neither share an edge nor a neighbour.
    pub fn is_node_independent(&self, priorities: &[f32], data: &mut ContractorThreadData, node: NodeId) -> bool {
        let neighbours = &mut data.neighbours;
        neighbours.clear();

        for edge in self.graph.adjacent_edges(node) {
            let target = edge.target;
            if target == node {
                continue;
            }
            if self.waits_for(priorities, node, target) {
                return false;
            }
            neighbours.push(target);
        }

        neighbours.sort_unstable();
        neighbours.dedup();

        for &neighbour in neighbours.iter() {
            for edge in self.graph.adjacent_edges(neighbour) {
                let target = edge.target;
                if target == node {
                    continue;
                }
                if self.waits_for(priorities, node, target) {
                    return false;
                }
            }
        }

        true
    }

    /// Whether `node` still beats all its direct neighbours.
    pub fn is_locally_minimal(&self, priorities: &[f32], node: NodeId) -> bool {
        self.graph
            .adjacent_edges(node)
            .iter()
            .filter(|edge| edge.target != node)
            .all(|edge| !self.waits_for(priorities, node, edge.target))
    }
}
