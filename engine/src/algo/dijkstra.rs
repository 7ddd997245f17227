//! Dijkstra variants on top of the arena based search records.

use super::*;
use crate::datastr::{index_heap::*, state_pool::*, timestamped_vector::*};

pub mod query;
pub mod stepped_search;

pub use query::Server;
pub use stepped_search::SteppedSearch;
