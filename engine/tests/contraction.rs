use graph_contractor::{
    algo::contraction_hierarchy::{
        contract_node::{ContractionContext, ContractionMode},
        ordering::FastHash,
        thread_data::ContractorThreadData,
        witness_search::State,
        ContractionParams, GraphContractor,
    },
    datastr::{graph::*, index_heap::IndexdMinHeap},
    report::enable_reporting,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::HashSet, sync::atomic::AtomicU32};

// A - B - C - D with unit weights in both directions
fn path_graph() -> ContractorGraph {
    ContractorGraph::from_input_edges(
        4,
        (0..3)
            .map(|i| InputEdge {
                source: i,
                target: i + 1,
                weight: 1,
                duration: 10,
                forward: true,
                backward: true,
                id: i,
            })
            .collect(),
    )
}

fn random_graph(seed: u64, n: usize, m: usize) -> OwnedGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut adjacency_lists: Vec<Vec<Link>> = vec![Vec::new(); n];
    for _ in 0..m {
        let tail = rng.gen_range(0..n);
        let head = rng.gen_range(0..n);
        let weight = rng.gen_range(1..=20);
        adjacency_lists[tail].push(Link { node: head as NodeId, weight });
        // most roads can be used in both directions
        if rng.gen_bool(0.6) {
            adjacency_lists[head].push(Link { node: tail as NodeId, weight });
        }
    }
    let first_out = degrees_to_first_out(adjacency_lists.iter().map(|links| links.len() as EdgeId)).collect();
    let (head, weight) = adjacency_lists.into_iter().flatten().map(|Link { node, weight }| (node, weight)).unzip();
    OwnedGraph::new(first_out, head, weight)
}

fn dijkstra(graph: &OwnedGraph, source: NodeId) -> Vec<Weight> {
    let mut distances = vec![INFINITY; graph.num_nodes()];
    let mut queue = IndexdMinHeap::new(graph.num_nodes());
    distances[source as usize] = 0;
    queue.push(State { key: 0, node: source });

    while let Some(State { key, node }) = queue.pop() {
        for Link { node: head, weight } in graph.link_iter(node) {
            let distance = key + weight;
            if distance < distances[head as usize] {
                distances[head as usize] = distance;
                if queue.contains_index(head as usize) {
                    queue.decrease_key(State { key: distance, node: head });
                } else {
                    queue.push(State { key: distance, node: head });
                }
            }
        }
    }

    distances
}

// Dijkstra only relaxing edges towards higher ranked nodes, forward or backward
fn upward_search(graph: &ContractorGraph, ranks: &[u32], source: NodeId, forward: bool) -> Vec<Weight> {
    let mut distances = vec![INFINITY; graph.num_nodes()];
    let mut queue = IndexdMinHeap::new(graph.num_nodes());
    distances[source as usize] = 0;
    queue.push(State { key: 0, node: source });

    while let Some(State { key, node }) = queue.pop() {
        for edge in graph.adjacent_edges(node) {
            let head = edge.target;
            let direction_allowed = if forward { edge.data.forward } else { edge.data.backward };
            if !direction_allowed || ranks[head as usize] <= ranks[node as usize] {
                continue;
            }
            let distance = key + edge.data.weight;
            if distance < distances[head as usize] {
                distances[head as usize] = distance;
                if queue.contains_index(head as usize) {
                    queue.decrease_key(State { key: distance, node: head });
                } else {
                    queue.push(State { key: distance, node: head });
                }
            }
        }
    }

    distances
}

fn ch_distance(graph: &ContractorGraph, ranks: &[u32], source: NodeId, target: NodeId) -> Weight {
    let forward = upward_search(graph, ranks, source, true);
    let backward = upward_search(graph, ranks, target, false);
    forward
        .iter()
        .zip(backward.iter())
        .map(|(&f, &b)| std::cmp::min(f + b, INFINITY))
        .min()
        .unwrap_or(INFINITY)
}

fn contraction_preserves_distances(seed: u64, params: ContractionParams) {
    let input = random_graph(seed, 60, 150);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);
    let ranks = {
        let mut contractor = GraphContractor::new(&mut graph).with_params(params);
        contractor.run(1.0);
        assert_eq!(contractor.num_contracted_nodes(), 60);
        contractor.contraction_order().ranks().to_vec()
    };

    for source in 0..input.num_nodes() as NodeId {
        let expected = dijkstra(&input, source);
        for target in 0..input.num_nodes() as NodeId {
            assert_eq!(ch_distance(&graph, &ranks, source, target), expected[target as usize], "from {} to {}", source, target);
        }
    }
}

#[test]
fn contraction_preserves_distances_on_random_graphs() {
    for seed in [1, 2, 3] {
        contraction_preserves_distances(seed, ContractionParams::default());
    }
}

#[test]
fn contraction_preserves_distances_with_tiny_witness_searches_and_many_threads() {
    let params = ContractionParams::new().simulation_search_space(2).contraction_search_space(3).num_threads(4);
    for seed in [4, 5] {
        contraction_preserves_distances(seed, params);
    }
}

#[test]
fn contracting_path_nodes_bridges_their_neighbours() {
    let (a, b, c, d) = (0, 1, 2, 3);
    // cached levels force B to be contracted first, then C
    let levels = vec![3.0, 0.0, 1.0, 2.0];

    let mut graph = path_graph();
    GraphContractor::with_node_data(&mut graph, levels.clone(), Vec::new()).run(0.25);

    let at_a: Vec<_> = graph.adjacent_edges(a).to_vec();
    assert_eq!(at_a.len(), 1);
    assert_eq!(at_a[0].target, c);
    assert_eq!(at_a[0].data.weight, 2);
    assert_eq!(at_a[0].data.duration, 20);
    assert_eq!(at_a[0].data.via_node(), Some(b));
    assert!(at_a[0].data.forward && at_a[0].data.backward);
    let at_c: Vec<_> = graph.adjacent_edges(c).iter().filter(|edge| edge.target == a).collect();
    assert_eq!(at_c.len(), 1);
    assert_eq!(at_c[0].data.weight, 2);
    assert!(graph.adjacent_edges(c).iter().all(|edge| edge.target != b));

    let mut graph = path_graph();
    GraphContractor::with_node_data(&mut graph, levels, Vec::new()).run(0.5);

    let at_a: Vec<_> = graph.adjacent_edges(a).to_vec();
    assert_eq!(at_a.len(), 1);
    assert_eq!(at_a[0].target, d);
    assert_eq!(at_a[0].data.weight, 3);
    assert_eq!(at_a[0].data.original_edges, 3);
    assert_eq!(at_a[0].data.via_node(), Some(c));
    let at_d: Vec<_> = graph.adjacent_edges(d).iter().filter(|edge| edge.target == a).collect();
    assert_eq!(at_d.len(), 1);
    assert!(at_d[0].data.forward && at_d[0].data.backward);
}

#[test]
fn core_factor_zero_keeps_everything_in_the_core() {
    let input = random_graph(7, 30, 60);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);
    let num_edges = graph.num_edges();

    let mut contractor = GraphContractor::new(&mut graph);
    contractor.run(0.0);
    assert_eq!(contractor.num_contracted_nodes(), 0);
    assert!(contractor.core_marker().iter().all(|&core| core));
    assert_eq!(contractor.graph().num_edges(), num_edges);
}

#[test]
fn full_contraction_leaves_no_core() {
    let input = random_graph(8, 30, 60);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);

    let mut contractor = GraphContractor::new(&mut graph);
    contractor.run(1.0);
    assert_eq!(contractor.num_contracted_nodes(), 30);
    assert!(contractor.core_marker().iter().all(|&core| !core));
}

#[test]
fn second_run_contracts_nothing() {
    let input = random_graph(9, 40, 100);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);

    let mut contractor = GraphContractor::new(&mut graph);
    contractor.run(0.5);
    let contracted = contractor.num_contracted_nodes();
    let levels = contractor.node_levels();
    let num_edges = contractor.graph().num_edges();
    assert!(contracted >= 20);

    contractor.run(1.0);
    assert_eq!(contractor.num_contracted_nodes(), contracted);
    assert_eq!(contractor.node_levels(), levels);
    assert_eq!(contractor.graph().num_edges(), num_edges);
}

#[test]
fn levels_grow_with_rounds_and_core_is_on_top() {
    let input = random_graph(10, 80, 200);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);

    let mut contractor = GraphContractor::new(&mut graph).with_params(ContractionParams::new().record_rounds(true));
    contractor.run(0.7);
    let levels = contractor.node_levels();
    let core = contractor.core_marker();
    let rounds = contractor.contraction_rounds();

    assert_eq!(rounds.len() as u32, contractor.num_rounds());
    assert_eq!(rounds.iter().map(Vec::len).sum::<usize>(), contractor.num_contracted_nodes());
    for (round, nodes) in rounds.iter().enumerate() {
        for &node in nodes {
            assert_eq!(levels[node as usize], round as f32);
            assert!(!core[node as usize]);
        }
    }
    let max_contracted_level = rounds.len() as f32 - 1.0;
    for node in 0..80 {
        if core[node] {
            assert!(levels[node] > max_contracted_level);
        }
    }

    let order = contractor.contraction_order();
    for rank in 1..order.len() as u32 {
        assert!(levels[order.node(rank - 1) as usize] <= levels[order.node(rank) as usize]);
    }
}

#[test]
fn nodes_of_a_round_share_neither_edges_nor_neighbours() {
    let input = random_graph(11, 100, 300);
    let mut graph = ContractorGraph::from_first_out_graph(&input, None);
    let rounds = {
        let mut contractor = GraphContractor::new(&mut graph).with_params(ContractionParams::new().record_rounds(true).num_threads(3));
        contractor.run(1.0);
        contractor.contraction_rounds().to_vec()
    };

    let mut round_of = vec![0; 100];
    for (round, nodes) in rounds.iter().enumerate() {
        for &node in nodes {
            round_of[node as usize] = round;
        }
    }

    // the edges stored at a node do not change after it was contracted
    for (round, nodes) in rounds.iter().enumerate() {
        let in_round: HashSet<NodeId> = nodes.iter().copied().collect();
        let mut seen_neighbours = HashSet::new();
        for &node in nodes {
            let neighbours: HashSet<NodeId> = graph
                .adjacent_edges(node)
                .iter()
                .map(|edge| edge.target)
                .filter(|&target| target != node && round_of[target as usize] >= round)
                .collect();
            assert!(neighbours.is_disjoint(&in_round), "round contains adjacent nodes");
            assert!(neighbours.is_disjoint(&seen_neighbours), "round contains nodes with a common neighbour");
            seen_neighbours.extend(neighbours);
        }
    }
}

#[test]
fn committed_edges_have_no_duplicates() {
    let input = random_graph(12, 50, 200);
    let graph = ContractorGraph::from_first_out_graph(&input, None);
    let node_weights: Vec<AtomicU32> = (0..50).map(|_| AtomicU32::new(0)).collect();
    let params = ContractionParams::default();
    let fast_hash = FastHash::new();
    let ctx = ContractionContext {
        graph: &graph,
        node_weights: &node_weights,
        params: &params,
        fast_hash: &fast_hash,
    };
    let mut data = ContractorThreadData::new(50);

    for node in 0..50 {
        data.inserted_edges.clear();
        ctx.contract_node(ContractionMode::Commit, &mut data, node, None);
        let mut keys = HashSet::new();
        for edge in &data.inserted_edges {
            assert!(edge.data.shortcut);
            assert_eq!(edge.data.id, node);
            assert!(keys.insert((edge.source, edge.target, edge.data.weight, edge.data.shortcut)));
        }
    }
}

#[test]
fn node_weights_are_reported() {
    let mut graph = path_graph();
    // no u-turn on the unit weight path is cheaper than these
    let mut contractor = GraphContractor::with_node_data(&mut graph, Vec::new(), vec![0, 1, 2, 2]);
    contractor.run(1.0);
    assert_eq!(contractor.node_weights(), vec![0, 1, 2, 2]);
}

#[test]
#[should_panic]
fn node_data_has_to_match_graph_size() {
    let mut graph = path_graph();
    GraphContractor::with_node_data(&mut graph, vec![1.0, 2.0], Vec::new());
}

#[test]
fn cheap_u_turns_become_loops() {
    // hub 0 with four leaves, u-turns at the hub are expensive
    let mut graph = ContractorGraph::from_input_edges(
        5,
        (1..5)
            .map(|leaf| InputEdge {
                source: 0,
                target: leaf,
                weight: 1,
                duration: 1,
                forward: true,
                backward: true,
                id: leaf,
            })
            .collect(),
    );

    let mut contractor = GraphContractor::with_node_data(&mut graph, Vec::new(), vec![100, 0, 0, 0, 0]);
    contractor.run(1.0);
    // simulations bump the hub to 3, the first committed leaf lowers it to the u-turn cost
    assert_eq!(contractor.node_weights(), vec![2, 0, 0, 0, 0]);
    assert_eq!(contractor.num_contracted_nodes(), 5);

    let loops: Vec<_> = graph.adjacent_edges(0).iter().filter(|edge| edge.target == 0).collect();
    assert_eq!(loops.len(), 1);
    assert_eq!(loops[0].data.weight, 2);
    assert_eq!(loops[0].data.original_edges, 2);
    assert!(loops[0].data.shortcut && loops[0].data.forward && loops[0].data.backward);
    assert!((1..5).contains(&loops[0].data.id));
}

#[test]
fn nearly_equal_levels_still_terminate() {
    let mut graph = ContractorGraph::from_input_edges(
        2,
        vec![InputEdge {
            source: 0,
            target: 1,
            weight: 1,
            duration: 1,
            forward: true,
            backward: true,
            id: 0,
        }],
    );

    let mut contractor = GraphContractor::with_node_data(&mut graph, vec![0.500_000_06, 0.5], Vec::new())
        .with_params(ContractionParams::new().record_rounds(true));
    contractor.run(1.0);
    assert_eq!(contractor.num_contracted_nodes(), 2);
    assert_eq!(contractor.contraction_rounds(), &[vec![1], vec![0]]);
}

#[test]
fn second_run_with_reporting_enabled() {
    let _reporter = enable_reporting("contraction_test");
    let mut graph = path_graph();

    let mut contractor = GraphContractor::new(&mut graph);
    contractor.run(1.0);
    assert_eq!(contractor.num_contracted_nodes(), 4);
    contractor.run(1.0);
    assert_eq!(contractor.num_contracted_nodes(), 4);
}
