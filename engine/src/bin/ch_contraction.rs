// Builds a contraction hierarchy for a graph in the binary vector format.
// Takes the graph directory and optionally a core factor as arguments.
// The directory has to contain first_out, head and travel_time, and may contain duration and node_weights.
// Results are written to the ch subdirectory.

#[macro_use]
extern crate graph_contractor;

use std::{env, error::Error, path::Path};

use graph_contractor::{
    algo::contraction_hierarchy::GraphContractor,
    cli::{parse_core_factor, CliErr},
    datastr::graph::*,
    io::*,
    report::*,
};

struct ContractionInput {
    graph: OwnedGraph,
    durations: Option<Vec<Weight>>,
    node_weights: Option<Vec<Weight>>,
}

impl Reconstruct for ContractionInput {
    fn reconstruct_with(loader: Loader) -> std::io::Result<Self> {
        Ok(ContractionInput {
            graph: OwnedGraph::reconstruct_with(loader)?,
            durations: loader.load_optional("duration")?,
            node_weights: loader.load_optional("node_weights")?,
        })
    }
}

struct ContractionOutput {
    levels: Vec<f32>,
    core: Vec<u8>,
    order: Vec<NodeId>,
    node_weights: Vec<Weight>,
    first_out: Vec<EdgeId>,
    head: Vec<NodeId>,
    weight: Vec<Weight>,
    middle: Vec<NodeId>,
    forward: Vec<u8>,
    backward: Vec<u8>,
}

impl ContractionOutput {
    fn new(contractor: &GraphContractor) -> Self {
        ContractionOutput {
            levels: contractor.node_levels(),
            core: contractor.core_marker().into_iter().map(u8::from).collect(),
            // rank -> node
            order: contractor.contraction_order().order().to_vec(),
            node_weights: contractor.node_weights(),
            first_out: Vec::new(),
            head: Vec::new(),
            weight: Vec::new(),
            middle: Vec::new(),
            forward: Vec::new(),
            backward: Vec::new(),
        }
    }

    fn add_graph(&mut self, graph: &ContractorGraph) {
        self.first_out = degrees_to_first_out((0..graph.num_nodes() as NodeId).map(|node| graph.adjacent_edges(node).len() as EdgeId)).collect();
        for edge in graph.edges() {
            self.head.push(edge.target);
            self.weight.push(edge.data.weight);
            self.middle.push(edge.data.via_node().unwrap_or(u32::MAX));
            self.forward.push(edge.data.forward as u8);
            self.backward.push(edge.data.backward as u8);
        }
    }
}

impl Deconstruct for ContractionOutput {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> std::io::Result<()>) -> std::io::Result<()> {
        store("levels", &self.levels)?;
        store("core", &self.core)?;
        store("order", &self.order)?;
        store("node_weights", &self.node_weights)?;
        store("first_out", &self.first_out)?;
        store("head", &self.head)?;
        store("weight", &self.weight)?;
        store("middle", &self.middle)?;
        store("forward", &self.forward)?;
        store("backward", &self.backward)?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _reporter = enable_reporting("ch_contraction");
    let mut args = env::args().skip(1);
    let arg = args.next().ok_or(CliErr("No directory arg given"))?;
    let path = Path::new(&arg);
    let core_factor = parse_core_factor(args.next())?;

    let input = ContractionInput::reconstruct_from(&path)?;
    let mut graph = report_time_with_key("building contractor graph", "graph_build_running_time_ms", || {
        ContractorGraph::from_first_out_graph(&input.graph, input.durations.as_deref())
    });

    let mut output = {
        let mut contractor = GraphContractor::with_node_data(&mut graph, Vec::new(), input.node_weights.unwrap_or_default());
        report_time("contraction", || contractor.run(core_factor));
        ContractionOutput::new(&contractor)
    };
    output.add_graph(&graph);
    report!("num_ch_edges", output.head.len());

    output.deconstruct_to(&path.join("ch"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_lists_nodes_by_rank() {
        let edge = |source, target| InputEdge {
            source,
            target,
            weight: 1,
            duration: 1,
            forward: true,
            backward: true,
            id: 0,
        };
        let mut graph = ContractorGraph::from_input_edges(4, vec![edge(0, 1), edge(1, 2), edge(2, 3)]);

        let mut output = {
            let mut contractor = GraphContractor::with_node_data(&mut graph, vec![3.0, 0.0, 1.0, 2.0], Vec::new());
            contractor.run(1.0);
            ContractionOutput::new(&contractor)
        };
        output.add_graph(&graph);

        assert_eq!(output.order, vec![1, 2, 3, 0]);
        assert_eq!(output.levels, vec![3.0, 0.0, 1.0, 2.0]);
        assert_eq!(output.core, vec![0; 4]);
        // every node keeps the edges it had when it was contracted, 0 was contracted last
        assert_eq!(output.first_out, vec![0, 0, 2, 4, 5]);
        assert_eq!(output.head, vec![0, 2, 3, 0, 0]);
        assert_eq!(output.middle, vec![u32::MAX, u32::MAX, u32::MAX, 1, 2]);
        assert_eq!(output.weight, vec![1, 1, 1, 2, 3]);
        assert!(output.forward.iter().chain(output.backward.iter()).all(|&flag| flag == 1));
    }
}
