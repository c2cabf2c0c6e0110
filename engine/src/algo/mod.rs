//! Preprocessing algorithms for fast routing.

pub mod contraction_hierarchy;
