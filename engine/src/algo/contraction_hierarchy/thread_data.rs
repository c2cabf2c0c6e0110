//! Scratch state of the contraction workers.

use super::witness_search::ContractorDijkstra;
use crate::datastr::graph::*;
use parking_lot::Mutex;

#[derive(Debug)]
pub struct ContractorThreadData {
    pub dijkstra: ContractorDijkstra,
    pub inserted_edges: Vec<ContractorEdge>,
    pub neighbours: Vec<NodeId>,
}

impl ContractorThreadData {
    pub fn new(num_nodes: usize) -> Self {
        ContractorThreadData {
            dijkstra: ContractorDijkstra::new(num_nodes),
            inserted_edges: Vec::new(),
            neighbours: Vec::new(),
        }
    }
}

/// One lazily created `ContractorThreadData` per worker of a rayon pool.
///
/// Slots are indexed by `rayon::current_thread_index()`. The last slot is used by threads outside of the pool.
/// A worker only ever locks its own slot, so the locks are uncontended.
/// Closures passed to `with_data` must not call back into rayon, otherwise a stolen job could try to lock the same slot.
#[derive(Debug)]
pub struct ThreadDataContainer {
    num_nodes: usize,
    slots: Vec<Mutex<Option<ContractorThreadData>>>,
}

impl ThreadDataContainer {
    pub fn new(num_nodes: usize, num_workers: usize) -> Self {
        ThreadDataContainer {
            num_nodes,
            slots: (0..=num_workers).map(|_| Mutex::new(None)).collect(),
        }
    }

    pub fn with_data<R>(&self, f: impl FnOnce(&mut ContractorThreadData) -> R) -> R {
        let fallback = self.slots.len() - 1;
        let index = rayon::current_thread_index().filter(|&index| index < fallback).unwrap_or(fallback);
        let mut slot = self.slots[index].lock();
        let data = slot.get_or_insert_with(|| ContractorThreadData::new(self.num_nodes));
        f(data)
    }

    /// Move the edges collected by all workers out of their buffers.
    pub fn take_inserted_edges(&mut self) -> Vec<ContractorEdge> {
        let mut edges = Vec::new();
        for slot in &mut self.slots {
            if let Some(data) = slot.get_mut() {
                edges.append(&mut data.inserted_edges);
            }
        }
        edges
    }

    /// Number of workers which have created their scratch state so far.
    pub fn num_initialized(&mut self) -> usize {
        self.slots.iter_mut().filter_map(|slot| slot.get_mut().as_ref()).count()
    }
}
