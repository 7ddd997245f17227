//! Build graphs from GeoJSON road networks.
//!
//! Each `LineString` feature becomes an undirected edge between its first and last coordinate.
//! Node keys are the coordinates formatted as `"lng,lat"`.
//! The cost of an edge is taken from the `_cost` property of the feature,
//! all properties are kept as the payload of the edge.

use crate::datastr::graph::*;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub properties: Value,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
}

impl Geometry {
    pub fn line_string(coordinates: &[[f64; 2]]) -> Geometry {
        Geometry {
            kind: "LineString".to_string(),
            coordinates: json!(coordinates),
        }
    }
}

/// Node key of a coordinate
pub fn coordinate_key([lng, lat]: [f64; 2]) -> String {
    format!("{},{}", lng, lat)
}

/// Read a feature collection from a JSON file
pub fn read_feature_collection<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// A feature which passed cleansing
#[derive(Debug, Clone)]
struct Segment<'a> {
    properties: &'a Value,
    coordinates: Vec<[f64; 2]>,
    cost: Weight,
}

fn line_coordinates(value: &Value) -> Option<Vec<[f64; 2]>> {
    value
        .as_array()?
        .iter()
        .map(|point| {
            let point = point.as_array()?;
            match (point.first()?.as_f64(), point.get(1)?.as_f64()) {
                (Some(lng), Some(lat)) if lng.is_finite() && lat.is_finite() => Some([lng, lat]),
                _ => None,
            }
        })
        .collect()
}

fn segments(network: &FeatureCollection) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    // unordered endpoint pair -> index in segments
    let mut endpoints: HashMap<(String, String), usize> = HashMap::new();

    for feature in &network.features {
        let cost = match feature.properties.get("_cost").and_then(Value::as_f64) {
            Some(cost) if cost.is_finite() && cost >= 0.0 => cost,
            _ => continue,
        };

        let lines: Vec<Vec<[f64; 2]>> = match &feature.geometry {
            Some(Geometry { kind, coordinates }) if kind == "LineString" => line_coordinates(coordinates).into_iter().collect(),
            Some(Geometry { kind, coordinates }) if kind == "MultiLineString" => coordinates
                .as_array()
                .map(|parts| parts.iter().filter_map(line_coordinates).collect())
                .unwrap_or_default(),
            _ => continue,
        };

        for coordinates in lines {
            let (start, end) = match (coordinates.first(), coordinates.last()) {
                (Some(&start), Some(&end)) if coordinates.len() >= 2 => (coordinate_key(start), coordinate_key(end)),
                _ => continue,
            };
            if start == end {
                continue;
            }

            let pair = if start < end { (start, end) } else { (end, start) };
            let segment = Segment {
                properties: &feature.properties,
                coordinates,
                cost,
            };
            match endpoints.get(&pair) {
                Some(&index) => {
                    if segment.cost < segments[index].cost {
                        segments[index] = segment;
                    }
                }
                None => {
                    endpoints.insert(pair, segments.len());
                    segments.push(segment);
                }
            }
        }
    }

    segments
}

/// Clean up a road network before building a graph from it.
///
/// Keeps `LineString` features and the parts of `MultiLineString` features which have
/// at least two coordinates, a finite non-negative `_cost` and distinct endpoints.
/// Of features connecting the same two endpoints only the cheapest one is kept.
pub fn cleanse_network(network: &FeatureCollection) -> FeatureCollection {
    FeatureCollection::new(
        segments(network)
            .into_iter()
            .map(|segment| Feature {
                kind: "Feature".to_string(),
                properties: segment.properties.clone(),
                geometry: Some(Geometry::line_string(&segment.coordinates)),
            })
            .collect(),
    )
}

/// Build a graph from a road network with default options. See `load_geojson_with`.
pub fn load_geojson(network: &FeatureCollection) -> Result<GraphStore> {
    load_geojson_with(network, GraphOptions::default())
}

/// Build a graph from a road network.
/// The network is cleansed first (see `cleanse_network`), every remaining feature is added as an undirected edge.
pub fn load_geojson_with(network: &FeatureCollection, options: GraphOptions) -> Result<GraphStore> {
    let mut graph = GraphStore::with_options(options);

    for Segment { properties, coordinates, cost } in segments(network) {
        let start = coordinate_key(coordinates[0]);
        let end = coordinate_key(coordinates[coordinates.len() - 1]);
        let input = EdgeInput::new(cost).payload(serde_json::to_string(properties)?).geometry(coordinates);
        graph.add_undirected_edge(start, end, input)?;
    }
    graph.set_geographic(true);

    if options.debug_mode {
        eprintln!(
            "loaded {} features into {} nodes and {} edges",
            network.features.len(),
            graph.num_nodes(),
            graph.num_edges()
        );
    }

    Ok(graph)
}
