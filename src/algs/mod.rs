//! Re-export public algorithms.

pub mod adjacency_graph;
pub mod traversal;

pub use traversal::{TraversalBuilder, grow_region, is_connected, partition_from_seeds, shortest_bridge};
