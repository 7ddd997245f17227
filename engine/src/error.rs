//! Error type shared by all fallible operations of the engine.

use crate::datastr::graph::Weight;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The graph was already contracted and is frozen.
    #[error("graph is locked: it has already been contracted")]
    Locked,
    /// Operation requires a contracted graph.
    #[error("graph has not been contracted yet")]
    NotContracted,
    #[error("invalid edge cost {0}: costs must be finite and non-negative")]
    InvalidCost(Weight),
    #[error("unknown node {0:?}")]
    UnknownNode(String),
    #[error("coordinate lookup requires a graph built from GeoJSON")]
    NotGeographic,
    #[error("node key {0:?} is not a coordinate pair")]
    MalformedCoordinate(String),
    #[error("malformed contraction hierarchy data: {0}")]
    MalformedData(String),
    #[error("cannot determine storage format of {0:?}")]
    UnknownFormat(String),
    /// Simple static error messages for command line tools
    #[error("{0}")]
    Usage(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Decode(#[from] prost::DecodeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
