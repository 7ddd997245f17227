//! Graph storage for contraction hierarchies.
//!
//! Nodes are identified by external string keys which get mapped to dense ids `0..n`.
//! Edges are stored in two adjacency lists, one keyed by the tail and one keyed by the head of each edge.
//! Every edge (original or shortcut) additionally owns one slot in the edge properties and geometry arrays,
//! which is referenced through the `attrs` field of the edge in both lists.

use crate::datastr::node_order::NodeOrder;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node ids are 32bit unsigned ints
pub type NodeId = u32;
/// Edge ids are 32bit unsigned ints. An edge id is the index of the edges properties slot.
pub type EdgeId = u32;
/// Costs are non-negative finite floats
pub type Weight = f64;
/// Distance of unreached nodes
pub const INFINITY: Weight = std::f64::INFINITY;

/// Polyline of an edge, empty if the edge has no geometry.
pub type EdgeGeometry = Vec<[f64; 2]>;

/// An entry in an adjacency list.
/// In the forward list `end` is the head of the edge, in the reverse list its tail.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub end: NodeId,
    pub cost: Weight,
    pub attrs: EdgeId,
}

/// Metadata stored for each edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeProperties {
    #[serde(rename = "_cost")]
    pub cost: Weight,
    #[serde(rename = "_start_index")]
    pub start: NodeId,
    #[serde(rename = "_end_index")]
    pub end: NodeId,
    /// For shortcuts: the two edges this edge replaces, in path order
    #[serde(rename = "_ordered", default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<[EdgeId; 2]>,
    /// Opaque user data
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub payload: String,
}

/// Data for inserting a new edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeInput {
    pub cost: Weight,
    pub payload: String,
    pub geometry: EdgeGeometry,
}

impl EdgeInput {
    pub fn new(cost: Weight) -> EdgeInput {
        EdgeInput { cost, ..Default::default() }
    }

    pub fn payload(mut self, payload: impl Into<String>) -> EdgeInput {
        self.payload = payload.into();
        self
    }

    pub fn geometry(mut self, geometry: EdgeGeometry) -> EdgeInput {
        self.geometry = geometry;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Print sizes and progress to stderr
    pub debug_mode: bool,
}

/// Owner of all graph data: adjacency lists, node key mapping and per edge data.
///
/// After contraction the store is locked. It can then no longer be modified and
/// is safe to share between any number of query servers.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    adjacency_list: Vec<Vec<Edge>>,
    reverse_adjacency_list: Vec<Vec<Edge>>,
    node_to_index: HashMap<String, NodeId>,
    index_to_node: Vec<String>,
    edge_properties: Vec<EdgeProperties>,
    edge_geometry: Vec<EdgeGeometry>,
    max_uncontracted_edge_index: Option<EdgeId>,
    order: Option<NodeOrder>,
    locked: bool,
    geographic: bool,
    options: GraphOptions,
}

impl GraphStore {
    pub fn new() -> GraphStore {
        Self::default()
    }

    pub fn with_options(options: GraphOptions) -> GraphStore {
        GraphStore { options, ..Self::default() }
    }

    /// Insert a directed edge from `start` to `end`. Unknown keys are assigned new node ids.
    /// Returns the id of the new edge.
    pub fn add_edge(&mut self, start: impl ToString, end: impl ToString, input: EdgeInput) -> Result<EdgeId> {
        self.check_insertion(&input)?;
        let start = self.node_index_or_insert(start.to_string());
        let end = self.node_index_or_insert(end.to_string());
        Ok(self.push_edge(start, end, input))
    }

    /// Insert an edge in both directions.
    /// The mirrored edge gets its own slot with the geometry reversed.
    /// Returns the ids of the edge from `start` to `end` and of the mirrored one.
    pub fn add_undirected_edge(&mut self, start: impl ToString, end: impl ToString, input: EdgeInput) -> Result<(EdgeId, EdgeId)> {
        self.check_insertion(&input)?;
        let start = self.node_index_or_insert(start.to_string());
        let end = self.node_index_or_insert(end.to_string());
        let mut mirrored = input.clone();
        mirrored.geometry.reverse();
        let forward = self.push_edge(start, end, input);
        let backward = self.push_edge(end, start, mirrored);
        Ok((forward, backward))
    }

    fn check_insertion(&self, input: &EdgeInput) -> Result<()> {
        if self.locked {
            return Err(Error::Locked);
        }
        if !input.cost.is_finite() || input.cost < 0.0 {
            return Err(Error::InvalidCost(input.cost));
        }
        Ok(())
    }

    fn node_index_or_insert(&mut self, key: String) -> NodeId {
        if let Some(&index) = self.node_to_index.get(&key) {
            return index;
        }
        let index = self.index_to_node.len() as NodeId;
        self.node_to_index.insert(key.clone(), index);
        self.index_to_node.push(key);
        self.adjacency_list.push(Vec::new());
        self.reverse_adjacency_list.push(Vec::new());
        index
    }

    fn push_edge(&mut self, start: NodeId, end: NodeId, EdgeInput { cost, payload, geometry }: EdgeInput) -> EdgeId {
        let attrs = self.edge_properties.len() as EdgeId;
        self.edge_properties.push(EdgeProperties {
            cost,
            start,
            end,
            ordered: None,
            payload,
        });
        self.edge_geometry.push(geometry);
        self.adjacency_list[start as usize].push(Edge { end, cost, attrs });
        self.reverse_adjacency_list[end as usize].push(Edge { end: start, cost, attrs });
        attrs
    }

    /// Insert a shortcut replacing the path `first` + `second`.
    pub(crate) fn push_shortcut(&mut self, start: NodeId, end: NodeId, cost: Weight, first: EdgeId, second: EdgeId) -> EdgeId {
        let attrs = self.push_edge(start, end, EdgeInput::new(cost));
        self.edge_properties[attrs as usize].ordered = Some([first, second]);
        attrs
    }

    /// Freeze the edge id range of original edges. Everything added afterwards is a shortcut.
    pub(crate) fn seal_original_edges(&mut self) {
        self.max_uncontracted_edge_index = Some((self.edge_properties.len() as EdgeId).saturating_sub(1));
    }

    pub(crate) fn adjacency_lists_mut(&mut self) -> (&mut [Vec<Edge>], &mut [Vec<Edge>]) {
        (&mut self.adjacency_list, &mut self.reverse_adjacency_list)
    }

    pub(crate) fn lock(&mut self, order: Option<NodeOrder>) {
        self.order = order;
        self.locked = true;
    }

    pub(crate) fn set_geographic(&mut self, geographic: bool) {
        self.geographic = geographic;
    }

    /// Replace everything except the options with the given parts.
    /// The index to key mapping is derived from the key to index mapping.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn replace_with(
        &mut self,
        locked: bool,
        geographic: bool,
        adjacency_list: Vec<Vec<Edge>>,
        reverse_adjacency_list: Vec<Vec<Edge>>,
        node_to_index: HashMap<String, NodeId>,
        edge_properties: Vec<EdgeProperties>,
        edge_geometry: Vec<EdgeGeometry>,
        max_uncontracted_edge_index: Option<EdgeId>,
    ) -> Result<()> {
        let n = adjacency_list.len();
        if reverse_adjacency_list.len() != n || node_to_index.len() != n {
            return Err(Error::MalformedData(format!(
                "{} forward lists, {} reverse lists and {} node keys",
                n,
                reverse_adjacency_list.len(),
                node_to_index.len()
            )));
        }
        if edge_geometry.len() != edge_properties.len() {
            return Err(Error::MalformedData(format!(
                "{} edge property slots but {} geometry slots",
                edge_properties.len(),
                edge_geometry.len()
            )));
        }

        let mut index_to_node = vec![String::new(); n];
        for (key, &index) in &node_to_index {
            match index_to_node.get_mut(index as usize) {
                Some(slot) => *slot = key.clone(),
                None => return Err(Error::MalformedData(format!("node {:?} has out of range index {}", key, index))),
            }
        }

        let m = edge_properties.len();
        for edge in adjacency_list.iter().chain(reverse_adjacency_list.iter()).flatten() {
            if edge.end as usize >= n || edge.attrs as usize >= m {
                return Err(Error::MalformedData(format!("dangling edge {:?}", edge)));
            }
        }
        // shortcuts may only refer to earlier slots, otherwise unpacking would not terminate
        for (edge, props) in edge_properties.iter().enumerate() {
            if let Some([first, second]) = props.ordered {
                if first as usize >= edge || second as usize >= edge {
                    return Err(Error::MalformedData(format!("shortcut {} refers to later edges {} and {}", edge, first, second)));
                }
            }
        }

        // older files do not carry the boundary, the first shortcut slot tells us
        let max_uncontracted_edge_index = max_uncontracted_edge_index.or_else(|| {
            let first_shortcut = edge_properties.iter().position(|props| props.ordered.is_some()).unwrap_or(m);
            Some((first_shortcut as EdgeId).saturating_sub(1))
        });

        *self = GraphStore {
            adjacency_list,
            reverse_adjacency_list,
            node_to_index,
            index_to_node,
            edge_properties,
            edge_geometry,
            max_uncontracted_edge_index,
            order: None,
            locked,
            geographic,
            options: self.options,
        };
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency_list.len()
    }

    /// Number of edge slots, shortcuts included
    pub fn num_edges(&self) -> usize {
        self.edge_properties.len()
    }

    /// Number of entries in all forward adjacency lists
    pub fn num_arcs(&self) -> usize {
        self.adjacency_list.iter().map(Vec::len).sum()
    }

    /// Outgoing edges of each node. After contraction only edges to higher ranked nodes.
    pub fn adjacency_list(&self) -> &[Vec<Edge>] {
        &self.adjacency_list
    }

    /// Incoming edges of each node. After contraction only edges from higher ranked nodes.
    pub fn reverse_adjacency_list(&self) -> &[Vec<Edge>] {
        &self.reverse_adjacency_list
    }

    pub fn edge_properties(&self, edge: EdgeId) -> &EdgeProperties {
        &self.edge_properties[edge as usize]
    }

    pub fn all_edge_properties(&self) -> &[EdgeProperties] {
        &self.edge_properties
    }

    pub fn edge_geometry(&self, edge: EdgeId) -> &[[f64; 2]] {
        &self.edge_geometry[edge as usize]
    }

    pub fn all_edge_geometry(&self) -> &[EdgeGeometry] {
        &self.edge_geometry
    }

    pub fn node_index(&self, key: &str) -> Result<NodeId> {
        self.node_to_index.get(key).copied().ok_or_else(|| Error::UnknownNode(key.to_string()))
    }

    pub fn node_key(&self, node: NodeId) -> &str {
        &self.index_to_node[node as usize]
    }

    pub fn node_to_index_lookup(&self) -> &HashMap<String, NodeId> {
        &self.node_to_index
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Was the graph built from GeoJSON, that is, are all node keys coordinates?
    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    /// Largest id of an original edge. `None` before contraction.
    pub fn max_uncontracted_edge_index(&self) -> Option<EdgeId> {
        self.max_uncontracted_edge_index
    }

    /// The contraction order, if this graph was contracted in this process.
    /// Not available for loaded graphs, the rearranged adjacency lists encode it implicitly.
    pub fn node_order(&self) -> Option<&NodeOrder> {
        self.order.as_ref()
    }

    pub fn is_shortcut(&self, edge: EdgeId) -> bool {
        matches!(self.max_uncontracted_edge_index, Some(max) if edge > max)
    }

    /// The two edges a shortcut replaces, `None` for original edges.
    pub fn shortcut_halves(&self, edge: EdgeId) -> Option<[EdgeId; 2]> {
        if self.is_shortcut(edge) {
            self.edge_properties[edge as usize].ordered
        } else {
            None
        }
    }
}
