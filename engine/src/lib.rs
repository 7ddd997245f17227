//! A contraction hierarchy routing engine.
//!
//! Edges are collected in a `GraphStore`, contracted once into a hierarchy
//! (`algo::contraction_hierarchy::contract`) and then queried by any number
//! of independent `algo::contraction_hierarchy::query::Server`s.
//!
//! # Example
//!
//! ```
//! use ch_router::{algo::contraction_hierarchy::{self, query::*}, datastr::graph::*};
//!
//! let mut graph = GraphStore::new();
//! graph.add_edge("A", "B", EdgeInput::new(1.0))?;
//! graph.add_edge("B", "C", EdgeInput::new(2.0))?;
//! contraction_hierarchy::contract(&mut graph)?;
//!
//! let mut server = Server::new(&graph, PathfinderOptions { ids: true, ..Default::default() })?;
//! let result = server.query("A", "C")?;
//! assert_eq!(result.total_cost, 3.0);
//! assert_eq!(result.ids, Some(vec![0, 1]));
//! # Ok::<(), ch_router::error::Error>(())
//! ```

#[macro_use]
pub mod report;
pub mod algo;
pub mod coordinate_lookup;
pub mod datastr;
pub mod error;
pub mod import;
pub mod io;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}
