//! Parallel construction of contraction hierarchies.
//!
//! The interesting part lives in `algo::contraction_hierarchy`.
//! Everything else is the supporting cast: graph containers and search data structures in `datastr`,
//! vector based file I/O in `io` and structured reporting in `report`.

#[macro_use]
pub mod report;

pub mod algo;
pub mod cli;
pub mod datastr;
pub mod io;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
