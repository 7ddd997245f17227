//! Snapping arbitrary coordinates to the closest node of a graph imported from GeoJSON.
//!
//! Distances are great-circle distances. Nodes are indexed by their position on the unit sphere,
//! where the euclidean (chord) distance grows monotonically with the great-circle distance,
//! so the nearest neighbor in the kd-tree is also the nearest node on the globe.

use crate::datastr::graph::GraphStore;
use crate::error::{Error, Result};
use kdtree::kdtree::{Kdtree, KdtreePointTrait};

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodePoint {
    // unit vector of the coordinate
    xyz: [f64; 3],
    coordinate: [f64; 2],
}

impl NodePoint {
    fn new(coordinate: [f64; 2]) -> NodePoint {
        let (lng, lat) = (coordinate[0].to_radians(), coordinate[1].to_radians());
        NodePoint {
            xyz: [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()],
            coordinate,
        }
    }
}

impl KdtreePointTrait for NodePoint {
    #[inline]
    fn dims(&self) -> &[f64] {
        &self.xyz
    }
}

/// Static kd-tree over the coordinates of all nodes.
pub struct CoordinateLookup {
    // the tree can't be built from zero points
    tree: Option<Kdtree<NodePoint>>,
    len: usize,
}

impl CoordinateLookup {
    /// Fails with `Error::NotGeographic` for graphs not imported from GeoJSON.
    pub fn new(graph: &GraphStore) -> Result<CoordinateLookup> {
        if !graph.is_geographic() {
            return Err(Error::NotGeographic);
        }

        let mut points = graph
            .node_to_index_lookup()
            .keys()
            .map(|key| parse_coordinate(key).map(NodePoint::new))
            .collect::<Result<Vec<_>>>()?;
        let len = points.len();
        let tree = if points.is_empty() { None } else { Some(Kdtree::new(&mut points)) };
        Ok(CoordinateLookup { tree, len })
    }

    /// The node coordinate closest to the given point, `None` if the graph has no nodes.
    pub fn closest_network_point(&self, lng: f64, lat: f64) -> Option<[f64; 2]> {
        let tree = self.tree.as_ref()?;
        Some(tree.nearest_search(&NodePoint::new([lng, lat])).coordinate)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Haversine distance between two `[lng, lat]` coordinates in kilometers.
pub fn great_circle_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lat_a, lat_b) = (a[1].to_radians(), b[1].to_radians());
    let half_dlat = (lat_b - lat_a) / 2.0;
    let half_dlng = (b[0] - a[0]).to_radians() / 2.0;
    let h = half_dlat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_dlng.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

fn parse_coordinate(key: &str) -> Result<[f64; 2]> {
    let mut parts = key.split(',').map(|part| part.trim().parse::<f64>());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(lng)), Some(Ok(lat)), None) if lng.is_finite() && lat.is_finite() => Ok([lng, lat]),
        _ => Err(Error::MalformedCoordinate(key.to_string())),
    }
}
