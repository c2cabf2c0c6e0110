//! Parameters for the contraction.

/// Maximum number of nodes a witness search may settle while priorities are simulated.
/// Can be overriden through the CH_SIMULATION_SEARCH_SPACE env var at build time.
#[cfg(not(override_ch_simulation_search_space))]
pub const SIMULATION_SEARCH_SPACE: usize = 1000;
#[cfg(override_ch_simulation_search_space)]
pub const SIMULATION_SEARCH_SPACE: usize = include!(concat!(env!("OUT_DIR"), "/CH_SIMULATION_SEARCH_SPACE"));

/// Maximum number of nodes a witness search may settle while a node is actually contracted.
/// Can be overriden through the CH_CONTRACTION_SEARCH_SPACE env var at build time.
#[cfg(not(override_ch_contraction_search_space))]
pub const CONTRACTION_SEARCH_SPACE: usize = 2000;
#[cfg(override_ch_contraction_search_space)]
pub const CONTRACTION_SEARCH_SPACE: usize = include!(concat!(env!("OUT_DIR"), "/CH_CONTRACTION_SEARCH_SPACE"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractionParams {
    pub(crate) simulation_search_space: usize,
    pub(crate) contraction_search_space: usize,
    // None means rayons default
    pub(crate) num_threads: Option<usize>,
    // keep the nodes promoted in each round around for inspection
    pub(crate) record_rounds: bool,
}

impl ContractionParams {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn simulation_search_space(mut self, limit: usize) -> Self {
        self.simulation_search_space = limit;
        self
    }

    pub fn contraction_search_space(mut self, limit: usize) -> Self {
        self.contraction_search_space = limit;
        self
    }

    pub fn num_threads(mut self, num_threads: usize) -> Self {
        assert!(num_threads > 0);
        self.num_threads = Some(num_threads);
        self
    }

    pub fn record_rounds(mut self, record: bool) -> Self {
        self.record_rounds = record;
        self
    }
}

impl Default for ContractionParams {
    fn default() -> Self {
        ContractionParams {
            simulation_search_space: SIMULATION_SEARCH_SPACE,
            contraction_search_space: CONTRACTION_SEARCH_SPACE,
            num_threads: None,
            record_rounds: false,
        }
    }
}
