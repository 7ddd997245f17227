//! Saving and loading contracted graphs.
//!
//! Two formats are supported: a JSON record and a more compact protobuf encoding.
//! Both can only be written for contracted graphs, and loading replaces the complete state of a `GraphStore`.
//!
//! # Example
//!
//! ```no_run
//! # use ch_router::io::*;
//! let graph = load_from("network.pbf")?;
//! save_to(&graph, "network.json")?;
//! # Ok::<(), ch_router::error::Error>(())
//! ```

use crate::datastr::graph::GraphStore;
use crate::error::{Error, Result};
use std::{fs, path::Path};

pub mod json;
pub mod pbf;

/// On disk format of a contracted graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Pbf,
}

impl Format {
    /// Determine the format from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("pbf") => Ok(Format::Pbf),
            _ => Err(Error::UnknownFormat(path.display().to_string())),
        }
    }
}

/// Write a contracted graph to a file, in the format determined by the file extension.
pub fn save_to<P: AsRef<Path>>(graph: &GraphStore, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Json => fs::write(path, graph.save_ch()?)?,
        Format::Pbf => fs::write(path, graph.save_pbf_ch()?)?,
    }
    Ok(())
}

/// Read a contracted graph from a file, in the format determined by the file extension.
pub fn load_from<P: AsRef<Path>>(path: P) -> Result<GraphStore> {
    let path = path.as_ref();
    let mut graph = GraphStore::new();
    match Format::from_path(path)? {
        Format::Json => graph.load_ch(&fs::read_to_string(path)?)?,
        Format::Pbf => graph.load_pbf_ch(&fs::read(path)?)?,
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path("a/b.json").unwrap(), Format::Json);
        assert_eq!(Format::from_path("b.pbf").unwrap(), Format::Pbf);
        assert!(matches!(Format::from_path("b.osm"), Err(Error::UnknownFormat(_))));
        assert!(matches!(Format::from_path("pbf"), Err(Error::UnknownFormat(_))));
    }
}
