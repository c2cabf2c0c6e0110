//! Parallel contraction hierarchy construction.
//!
//! Nodes are contracted in rounds. Each round selects the nodes whose priority beats every other node
//! within two hops, contracts all of them concurrently and then updates the graph and the priorities of their neighbours.
//! Contraction can stop early, leaving the remaining nodes as an uncontracted core.
//!
//! # Example
//!
//! ```
//! use graph_contractor::algo::contraction_hierarchy::GraphContractor;
//! use graph_contractor::datastr::graph::*;
//!
//! let edge = |source, target| InputEdge { source, target, weight: 1, duration: 1, forward: true, backward: true, id: 0 };
//! let mut graph = ContractorGraph::from_input_edges(3, vec![edge(0, 1), edge(1, 2)]);
//!
//! let mut contractor = GraphContractor::new(&mut graph);
//! contractor.run(1.0);
//! assert_eq!(contractor.num_contracted_nodes(), 3);
//! assert!(contractor.core_marker().iter().all(|&core| !core));
//! ```

use crate::datastr::{graph::*, node_order::NodeOrder};
use crate::report::*;
use rayon::{prelude::*, ThreadPool};
use std::sync::atomic::{AtomicU32, Ordering::Relaxed};

pub mod contract_node;
pub mod ordering;
pub mod params;
pub mod thread_data;
pub mod witness_search;

use self::contract_node::{ContractionContext, ContractionMode};
use self::ordering::FastHash;
pub use self::params::ContractionParams;
use self::thread_data::ThreadDataContainer;

const NOT_CONTRACTED: u32 = u32::MAX;

/// A node which has neither been contracted nor been moved to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemainingNode {
    pub id: NodeId,
    pub is_independent: bool,
}

#[derive(Debug)]
pub struct GraphContractor<'g> {
    graph: &'g mut ContractorGraph,
    params: ContractionParams,
    fast_hash: FastHash,
    // levels supplied by the caller are used as priorities and never changed
    use_cached_node_priorities: bool,
    node_levels: Vec<f32>,
    node_weights: Vec<AtomicU32>,
    is_core_node: Vec<bool>,
    node_priorities: Vec<f32>,
    node_depth: Vec<u32>,
    // round in which each node was contracted
    contraction_round: Vec<u32>,
    remaining_nodes: Vec<RemainingNode>,
    priorities_initialized: bool,
    num_rounds: u32,
    num_contracted: usize,
    rounds: Vec<Vec<NodeId>>,
}

impl<'g> GraphContractor<'g> {
    pub fn new(graph: &'g mut ContractorGraph) -> Self {
        Self::with_node_data(graph, Vec::new(), Vec::new())
    }

    /// Contractor with precomputed levels and u-turn costs.
    /// Empty vectors mean that levels are computed and all u-turn costs are zero,
    /// otherwise both need one entry per node.
    pub fn with_node_data(graph: &'g mut ContractorGraph, node_levels: Vec<f32>, node_weights: Vec<Weight>) -> Self {
        let n = graph.num_nodes();
        assert!(node_levels.is_empty() || node_levels.len() == n, "need one level per node");
        assert!(node_weights.is_empty() || node_weights.len() == n, "need one weight per node");
        assert!(node_levels.iter().all(|level| !level.is_nan()), "levels have to be comparable");

        let use_cached_node_priorities = !node_levels.is_empty();
        let node_levels = if use_cached_node_priorities { node_levels } else { vec![0.0; n] };
        let node_weights = if node_weights.is_empty() { vec![0; n] } else { node_weights };

        GraphContractor {
            graph,
            params: ContractionParams::default(),
            fast_hash: FastHash::new(),
            use_cached_node_priorities,
            node_priorities: if use_cached_node_priorities { node_levels.clone() } else { vec![0.0; n] },
            node_levels,
            node_weights: node_weights.into_iter().map(AtomicU32::new).collect(),
            is_core_node: vec![false; n],
            node_depth: vec![0; n],
            contraction_round: vec![NOT_CONTRACTED; n],
            remaining_nodes: (0..n as NodeId).map(|id| RemainingNode { id, is_independent: false }).collect(),
            priorities_initialized: use_cached_node_priorities,
            num_rounds: 0,
            num_contracted: 0,
            rounds: Vec::new(),
        }
    }

    pub fn with_params(mut self, params: ContractionParams) -> Self {
        self.params = params;
        self
    }

    /// Contract until `core_factor` of all nodes are contracted. The remaining nodes become the core.
    /// Every node is either contracted or core afterwards, so calling this again does nothing.
    pub fn run(&mut self, core_factor: f64) {
        assert!((0.0..=1.0).contains(&core_factor), "core factor has to be between 0 and 1");
        if self.remaining_nodes.is_empty() {
            return;
        }

        // the driver stays on the calling thread so that reporting works, only the parallel phases enter the pool
        match rayon::ThreadPoolBuilder::new().num_threads(self.params.num_threads.unwrap_or(0)).build() {
            Ok(pool) => self.contract(core_factor, Some(&pool)),
            Err(e) => {
                eprintln!("could not create thread pool ({}), using the global one", e);
                self.contract(core_factor, None)
            }
        }
    }

    fn contract(&mut self, core_factor: f64, pool: Option<&ThreadPool>) {
        let n = self.graph.num_nodes();
        let target_num_contracted = (n as f64 * core_factor) as usize;
        let num_workers = pool.map_or_else(rayon::current_num_threads, ThreadPool::current_num_threads);
        let mut thread_data = ThreadDataContainer::new(n, num_workers);
        // reusable markers, reset after every round
        let mut is_contracted_now = vec![false; n];
        let mut is_neighbour = vec![false; n];

        report!("num_nodes", n);
        report!("num_edges", self.graph.num_edges());
        report!("core_factor", core_factor);

        if !self.priorities_initialized {
            let ctx = ContractionContext::new(&*self.graph, &self.node_weights, &self.params, &self.fast_hash);
            let node_depth = &self.node_depth;
            let remaining_nodes = &self.remaining_nodes;
            let thread_data = &thread_data;
            let priorities: Vec<(NodeId, f32)> = report_time_with_key("initial node priorities", "initial_priorities_running_time_ms", || {
                in_pool(pool, || {
                    remaining_nodes
                        .par_iter()
                        .map(|remaining| {
                            let node = remaining.id;
                            (node, thread_data.with_data(|data| ctx.evaluate_node_priority(data, node_depth[node as usize], node)))
                        })
                        .collect()
                })
            });
            for (node, priority) in priorities {
                self.node_priorities[node as usize] = priority;
            }
            self.priorities_initialized = true;
        }

        let mut next_progress_report = 1;
        let mut rounds_ctx = push_collection_context("rounds".to_string());

        while !self.remaining_nodes.is_empty() && self.num_contracted < target_num_contracted {
            let _round_ctx = rounds_ctx.push_collection_item();
            let round = self.num_rounds;
            let timer = Timer::new();

            // select nodes which beat everything within two hops
            {
                let ctx = ContractionContext::new(&*self.graph, &self.node_weights, &self.params, &self.fast_hash);
                let priorities = &self.node_priorities;
                let remaining_nodes = &mut self.remaining_nodes;
                let thread_data = &thread_data;
                in_pool(pool, || {
                    remaining_nodes.par_iter_mut().for_each(|remaining| {
                        remaining.is_independent = thread_data.with_data(|data| ctx.is_node_independent(priorities, data, remaining.id));
                    })
                });
            }
            let independent: Vec<NodeId> = self.remaining_nodes.iter().filter(|remaining| remaining.is_independent).map(|remaining| remaining.id).collect();
            self.remaining_nodes.retain(|remaining| !remaining.is_independent);
            let num_independent = independent.len();

            // refresh priorities of the selected nodes and only keep those which are still locally minimal
            let promoted = if self.use_cached_node_priorities {
                independent
            } else {
                let ctx = ContractionContext::new(&*self.graph, &self.node_weights, &self.params, &self.fast_hash);
                let node_depth = &self.node_depth;
                let thread_data = &thread_data;
                let independent = &independent;
                let refreshed: Vec<f32> = in_pool(pool, || {
                    independent
                        .par_iter()
                        .map(|&node| thread_data.with_data(|data| ctx.evaluate_node_priority(data, node_depth[node as usize], node)))
                        .collect()
                });
                for (&node, &priority) in independent.iter().zip(refreshed.iter()) {
                    self.node_priorities[node as usize] = priority;
                }

                let priorities = &self.node_priorities;
                let (promoted, deferred): (Vec<NodeId>, Vec<NodeId>) =
                    in_pool(pool, || independent.par_iter().partition(|&&node| ctx.is_locally_minimal(priorities, node)));
                if promoted.is_empty() {
                    deferred
                } else {
                    self.remaining_nodes
                        .extend(deferred.iter().map(|&id| RemainingNode { id, is_independent: false }));
                    promoted
                }
            };
            debug_assert!(!promoted.is_empty());

            for &node in &promoted {
                debug_assert_eq!(self.contraction_round[node as usize], NOT_CONTRACTED, "node contracted twice");
                self.contraction_round[node as usize] = round;
                if !self.use_cached_node_priorities {
                    self.node_levels[node as usize] = round as f32;
                }
            }

            {
                let ctx = ContractionContext::new(&*self.graph, &self.node_weights, &self.params, &self.fast_hash);
                let thread_data = &thread_data;
                let promoted = &promoted;
                in_pool(pool, || {
                    promoted.par_iter().for_each(|&node| {
                        thread_data.with_data(|data| ctx.contract_node(ContractionMode::Commit, data, node, None));
                    })
                });
            }

            // remove the edges pointing to contracted nodes
            let mut neighbours = Vec::new();
            for &node in &promoted {
                is_contracted_now[node as usize] = true;
                for edge in self.graph.adjacent_edges(node) {
                    if edge.target != node && !is_neighbour[edge.target as usize] {
                        is_neighbour[edge.target as usize] = true;
                        neighbours.push(edge.target);
                    }
                }
            }
            let num_deleted = {
                let graph = &mut *self.graph;
                let (is_neighbour, is_contracted_now) = (&is_neighbour, &is_contracted_now);
                in_pool(pool, || graph.delete_edges_to_marked(is_neighbour, is_contracted_now))
            };

            let mut shortcuts = thread_data.take_inserted_edges();
            in_pool(pool, || shortcuts.par_sort_unstable_by_key(|edge| edge.sort_key()));
            let num_shortcuts = self.insert_shortcuts(shortcuts);

            // neighbours got closer to the top of the hierarchy
            for &node in &promoted {
                let depth = self.node_depth[node as usize] + 1;
                for edge in self.graph.adjacent_edges(node) {
                    if edge.target != node {
                        let neighbour_depth = &mut self.node_depth[edge.target as usize];
                        *neighbour_depth = std::cmp::max(*neighbour_depth, depth);
                    }
                }
            }
            if !self.use_cached_node_priorities {
                let ctx = ContractionContext::new(&*self.graph, &self.node_weights, &self.params, &self.fast_hash);
                let node_depth = &self.node_depth;
                let thread_data = &thread_data;
                let neighbours = &neighbours;
                let updated: Vec<f32> = in_pool(pool, || {
                    neighbours
                        .par_iter()
                        .map(|&node| thread_data.with_data(|data| ctx.evaluate_node_priority(data, node_depth[node as usize], node)))
                        .collect()
                });
                for (&node, priority) in neighbours.iter().zip(updated) {
                    self.node_priorities[node as usize] = priority;
                }
            }

            for &node in &promoted {
                is_contracted_now[node as usize] = false;
            }
            for &node in &neighbours {
                is_neighbour[node as usize] = false;
            }

            self.num_contracted += promoted.len();
            self.num_rounds += 1;

            report!("round", round);
            report!("independent", num_independent);
            report!("promoted", promoted.len());
            report!("deferred", num_independent - promoted.len());
            report!("deleted_edges", num_deleted);
            report!("shortcuts", num_shortcuts);
            report!("running_time_ms", timer.get_passed_ms());

            if n > 0 {
                while next_progress_report <= 10 && self.num_contracted * 10 >= next_progress_report * n {
                    eprintln!("contracted {}% of nodes", next_progress_report * 10);
                    next_progress_report += 1;
                }
            }

            if self.params.record_rounds {
                self.rounds.push(promoted);
            }
        }
        drop(rounds_ctx);

        for remaining in &self.remaining_nodes {
            self.is_core_node[remaining.id as usize] = true;
            if !self.use_cached_node_priorities {
                self.node_levels[remaining.id as usize] = self.num_rounds as f32;
            }
        }
        let num_core = self.remaining_nodes.len();
        self.remaining_nodes.clear();

        report!("num_rounds", self.num_rounds);
        report!("num_contracted", self.num_contracted);
        report!("num_core", num_core);
        report!("num_workers_used", thread_data.num_initialized());
        eprintln!("[core] {} nodes {} edges.", num_core, self.graph.num_edges());
    }

    // insert collected shortcuts, replacing existing shortcuts with the same directions if cheaper
    fn insert_shortcuts(&mut self, edges: Vec<ContractorEdge>) -> usize {
        let mut num_inserted = 0;
        for edge in edges {
            if let Some(current) = self.graph.find_edge_mut(edge.source, edge.target) {
                if current.shortcut && current.forward == edge.data.forward && current.backward == edge.data.backward {
                    if edge.data.weight < current.weight {
                        *current = edge.data;
                    }
                    continue;
                }
            }
            self.graph.insert_edge(edge);
            num_inserted += 1;
        }
        num_inserted
    }

    /// For each node whether it is part of the uncontracted core.
    pub fn core_marker(&self) -> Vec<bool> {
        self.is_core_node.clone()
    }

    /// The level of each node. Contracted nodes get the round they were contracted in, core nodes the number of rounds.
    pub fn node_levels(&self) -> Vec<f32> {
        self.node_levels.clone()
    }

    /// The final u-turn cost of each node.
    pub fn node_weights(&self) -> Vec<Weight> {
        self.node_weights.iter().map(|weight| weight.load(Relaxed)).collect()
    }

    /// Nodes ordered by contraction: earlier rounds first, ties by id, core nodes last.
    pub fn contraction_order(&self) -> NodeOrder {
        let mut order: Vec<NodeId> = (0..self.graph.num_nodes() as NodeId).collect();
        order.sort_unstable_by_key(|&node| (self.contraction_round[node as usize], node));
        NodeOrder::from_node_order(order)
    }

    pub fn num_contracted_nodes(&self) -> usize {
        self.num_contracted
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    /// The nodes contracted in each round. Only available with `ContractionParams::record_rounds`.
    pub fn contraction_rounds(&self) -> &[Vec<NodeId>] {
        &self.rounds
    }

    pub fn graph(&self) -> &ContractorGraph {
        &*self.graph
    }
}

fn in_pool<R: Send>(pool: Option<&ThreadPool>, op: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
