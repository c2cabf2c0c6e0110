//! Bounded local Dijkstra answering whether a path avoiding the contracted node is at least as short as a shortcut.

use crate::datastr::{
    graph::*,
    index_heap::{IndexdMinHeap, Indexing},
    timestamped_vector::TimestampedVector,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct State<W> {
    pub key: W,
    pub node: NodeId,
}

impl<W> Indexing for State<W> {
    #[inline]
    fn as_index(&self) -> usize {
        self.node as usize
    }
}

/// Payload of a node in the witness search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WitnessData {
    /// Whether this node is one of the targets the search is looking for.
    pub target: bool,
}

#[derive(Debug)]
pub struct ContractorDijkstra {
    queue: IndexdMinHeap<State<Weight>>,
    // key and data of every inserted node, `None` for nodes not reached since the last `clear`
    labels: TimestampedVector<Option<(Weight, WitnessData)>>,
    settled_nodes: usize,
}

impl ContractorDijkstra {
    pub fn new(num_nodes: usize) -> Self {
        ContractorDijkstra {
            queue: IndexdMinHeap::new(num_nodes),
            labels: TimestampedVector::new(num_nodes, None),
            settled_nodes: 0,
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.labels.reset();
        self.settled_nodes = 0;
    }

    /// Insert a node which has not been inserted since the last `clear`.
    pub fn insert(&mut self, node: NodeId, key: Weight, data: WitnessData) {
        debug_assert!(!self.was_inserted(node));
        self.labels.set(node as usize, Some((key, data)));
        self.queue.push(State { key, node });
    }

    /// Whether the node was inserted since the last `clear`, regardless of whether it has been settled yet.
    pub fn was_inserted(&self, node: NodeId) -> bool {
        self.labels[node as usize].is_some()
    }

    /// The tentative distance of `node`, `INFINITY` if it was never inserted.
    pub fn key(&self, node: NodeId) -> Weight {
        self.labels[node as usize].map_or(INFINITY, |(key, _)| key)
    }

    pub fn data(&self, node: NodeId) -> Option<WitnessData> {
        self.labels[node as usize].map(|(_, data)| data)
    }

    /// Number of nodes settled by the last `run`.
    pub fn settled_nodes(&self) -> usize {
        self.settled_nodes
    }

    /// Run until all `number_of_targets` targets are settled, more than `node_limit` nodes were settled,
    /// or the smallest queued distance exceeds `weight_limit`. Edges into `forbidden_node` are never relaxed.
    ///
    /// Targets are inserted at `INFINITY` before the search runs, so their key is only
    /// below `INFINITY` afterwards when a path was found.
    pub fn run(&mut self, number_of_targets: usize, node_limit: usize, weight_limit: Weight, forbidden_node: NodeId, graph: &ContractorGraph) {
        let mut settled_targets = 0;

        while let Some(State { key: distance, node }) = self.queue.pop() {
            self.settled_nodes += 1;
            if self.settled_nodes > node_limit {
                return;
            }
            if distance > weight_limit {
                return;
            }

            let Some((_, data)) = self.labels[node as usize] else {
                continue;
            };
            if data.target {
                settled_targets += 1;
                if settled_targets >= number_of_targets {
                    return;
                }
            }

            for edge in graph.adjacent_edges(node) {
                if !edge.data.forward || edge.target == forbidden_node {
                    continue;
                }
                let to = edge.target;
                let to_distance = distance + edge.data.weight;

                match self.labels[to as usize] {
                    None => {
                        self.insert(to, to_distance, WitnessData { target: false });
                    }
                    Some((current, to_data)) if to_distance < current && self.queue.contains_index(to as usize) => {
                        self.labels.set(to as usize, Some((to_distance, to_data)));
                        self.queue.decrease_key(State { key: to_distance, node: to });
                    }
                    Some(_) => (),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(num_nodes: usize, edges: &[(NodeId, NodeId, Weight)]) -> ContractorGraph {
        ContractorGraph::from_input_edges(
            num_nodes,
            edges
                .iter()
                .map(|&(source, target, weight)| InputEdge {
                    source,
                    target,
                    weight,
                    duration: weight,
                    forward: true,
                    backward: false,
                    id: 0,
                })
                .collect(),
        )
    }

    #[test]
    fn finds_witness_around_forbidden_node() {
        // 0 -> 1 -> 2 and a detour 0 -> 3 -> 2
        let graph = graph(4, &[(0, 1, 1), (1, 2, 1), (0, 3, 1), (3, 2, 1)]);
        let mut dijkstra = ContractorDijkstra::new(4);

        dijkstra.insert(0, 0, WitnessData::default());
        dijkstra.insert(2, INFINITY, WitnessData { target: true });
        dijkstra.run(1, 1000, 2, 1, &graph);

        assert_eq!(dijkstra.key(2), 2);
        assert_eq!(dijkstra.data(2), Some(WitnessData { target: true }));
        assert_eq!(dijkstra.data(3), Some(WitnessData { target: false }));
        assert_eq!(dijkstra.key(1), INFINITY);
        assert!(!dijkstra.was_inserted(1));
    }

    #[test]
    fn respects_limits() {
        let graph = graph(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]);
        let mut dijkstra = ContractorDijkstra::new(4);

        dijkstra.insert(0, 0, WitnessData::default());
        dijkstra.insert(3, INFINITY, WitnessData { target: true });
        dijkstra.run(1, 1000, 1, 4, &graph);
        assert_eq!(dijkstra.key(2), 2);
        assert_eq!(dijkstra.key(3), INFINITY);

        dijkstra.clear();
        assert!(!dijkstra.was_inserted(0));
        dijkstra.insert(0, 0, WitnessData::default());
        dijkstra.insert(3, INFINITY, WitnessData { target: true });
        dijkstra.run(1, 1, INFINITY, 4, &graph);
        assert_eq!(dijkstra.settled_nodes(), 2);
        assert_eq!(dijkstra.key(3), INFINITY);
    }
}
