//! Data structures used by algorithms.

pub mod graph;
pub mod index_heap;
pub mod node_order;
pub mod state_pool;
pub mod timestamped_vector;
