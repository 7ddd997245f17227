//! Protobuf encoding of contracted graphs.
//!
//! Edge properties are stored as one JSON string per edge.
//! Geometries are stored as flat coordinate lists (`lng0, lat0, lng1, lat1, ...`).

use crate::datastr::graph::*;
use crate::error::{Error, Result};
use prost::Message;
use std::collections::HashMap;

#[derive(Clone, PartialEq, Message)]
pub struct ContractionHierarchy {
    #[prost(bool, tag = "1")]
    pub locked: bool,
    #[prost(bool, tag = "2")]
    pub geo_json_flag: bool,
    #[prost(message, repeated, tag = "3")]
    pub adjacency_list: Vec<AdjList>,
    #[prost(message, repeated, tag = "4")]
    pub reverse_adjacency_list: Vec<AdjList>,
    #[prost(map = "string, uint32", tag = "5")]
    pub node_to_index_lookup: HashMap<String, u32>,
    #[prost(string, repeated, tag = "6")]
    pub edge_properties: Vec<String>,
    #[prost(message, optional, tag = "7")]
    pub edge_geometry: Option<GeometryArray>,
    #[prost(uint32, optional, tag = "8")]
    pub max_uncontracted_edge_index: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AdjList {
    #[prost(message, repeated, tag = "1")]
    pub edges: Vec<EdgeAttrs>,
}

#[derive(Clone, PartialEq, Message)]
pub struct EdgeAttrs {
    #[prost(uint32, tag = "1")]
    pub end: u32,
    #[prost(double, tag = "2")]
    pub cost: f64,
    #[prost(uint32, tag = "3")]
    pub attrs: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct GeometryArray {
    #[prost(message, repeated, tag = "1")]
    pub linestrings: Vec<LineString>,
}

#[derive(Clone, PartialEq, Message)]
pub struct LineString {
    #[prost(double, repeated, tag = "1")]
    pub coords: Vec<f64>,
}

fn encode_adjacency(lists: &[Vec<Edge>]) -> Vec<AdjList> {
    lists
        .iter()
        .map(|edges| AdjList {
            edges: edges
                .iter()
                .map(|&Edge { end, cost, attrs }| EdgeAttrs { end, cost, attrs })
                .collect(),
        })
        .collect()
}

fn decode_adjacency(lists: Vec<AdjList>) -> Vec<Vec<Edge>> {
    lists
        .into_iter()
        .map(|list| list.edges.into_iter().map(|EdgeAttrs { end, cost, attrs }| Edge { end, cost, attrs }).collect())
        .collect()
}

fn decode_line_string(line: LineString) -> Result<EdgeGeometry> {
    if line.coords.len() % 2 != 0 {
        return Err(Error::MalformedData(format!("odd number of coordinates in line string: {}", line.coords.len())));
    }
    Ok(line.coords.chunks_exact(2).map(|point| [point[0], point[1]]).collect())
}

impl GraphStore {
    /// Serialize the contracted graph to protobuf.
    /// Fails with `Error::NotContracted` if the graph was not contracted yet.
    pub fn save_pbf_ch(&self) -> Result<Vec<u8>> {
        if !self.is_locked() {
            return Err(Error::NotContracted);
        }

        let message = ContractionHierarchy {
            locked: self.is_locked(),
            geo_json_flag: self.is_geographic(),
            adjacency_list: encode_adjacency(self.adjacency_list()),
            reverse_adjacency_list: encode_adjacency(self.reverse_adjacency_list()),
            node_to_index_lookup: self.node_to_index_lookup().clone(),
            edge_properties: self.all_edge_properties().iter().map(serde_json::to_string).collect::<serde_json::Result<_>>()?,
            edge_geometry: Some(GeometryArray {
                linestrings: self
                    .all_edge_geometry()
                    .iter()
                    .map(|geometry| LineString {
                        coords: geometry.iter().flatten().copied().collect(),
                    })
                    .collect(),
            }),
            max_uncontracted_edge_index: self.max_uncontracted_edge_index(),
        };
        Ok(message.encode_to_vec())
    }

    /// Replace the state of this graph with a graph serialized by `save_pbf_ch`.
    pub fn load_pbf_ch(&mut self, bytes: &[u8]) -> Result<()> {
        let message = ContractionHierarchy::decode(bytes)?;

        let edge_properties = message
            .edge_properties
            .iter()
            .map(|properties| serde_json::from_str(properties))
            .collect::<serde_json::Result<Vec<EdgeProperties>>>()?;
        let edge_geometry = match message.edge_geometry {
            Some(geometry) => geometry.linestrings.into_iter().map(decode_line_string).collect::<Result<_>>()?,
            None => vec![Vec::new(); edge_properties.len()],
        };

        self.replace_with(
            message.locked,
            message.geo_json_flag,
            decode_adjacency(message.adjacency_list),
            decode_adjacency(message.reverse_adjacency_list),
            message.node_to_index_lookup,
            edge_properties,
            edge_geometry,
            message.max_uncontracted_edge_index,
        )
    }
}
