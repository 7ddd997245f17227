//! Contraction Hierarchy query server.
//!
//! Actually not much more than a bidirectional dijkstra with a different stopping criterion.
//! And more complicated path unpacking.
//! This works because the adjacency lists of the contracted graph were split into an upward and a downward part.
//! This implicitly makes sure, that both searches only go to higher ranked nodes.

use super::*;
use crate::import::geojson::{coordinate_key, Feature, FeatureCollection, Geometry};
use serde::Serialize;
use serde_json::Value;

/// Which derived outputs a `Server` produces in addition to the total cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathfinderOptions {
    /// Ids of the original edges along the path
    pub ids: bool,
    /// The path as a GeoJSON feature collection
    pub path: bool,
    /// Properties of the original edges along the path
    pub properties: bool,
    /// Keys of the nodes along the path
    pub nodes: bool,
}

impl PathfinderOptions {
    fn any(&self) -> bool {
        self.ids || self.path || self.properties || self.nodes
    }
}

/// Result of a query. `total_cost` is `0` both for empty paths and when there is no path.
/// Requested outputs are always present, but empty if there is no path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResult {
    pub total_cost: Weight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<EdgeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<FeatureCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<EdgeProperties>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<String>>,
}

/// Query server for a contracted graph.
/// Owns all per query data, so any number of servers can work on the same graph concurrently.
pub struct Server<'g> {
    graph: &'g GraphStore,
    options: PathfinderOptions,
    pool: StatePool,
    forward: SteppedSearch,
    backward: SteppedSearch,
    meeting_node: Option<NodeId>,
}

impl<'g> Server<'g> {
    /// Fails with `Error::NotContracted` if the graph was not contracted yet.
    pub fn new(graph: &'g GraphStore, options: PathfinderOptions) -> Result<Server<'g>> {
        if !graph.is_locked() {
            return Err(Error::NotContracted);
        }
        let n = graph.num_nodes();
        Ok(Server {
            graph,
            options,
            pool: StatePool::new(),
            forward: SteppedSearch::new(n),
            backward: SteppedSearch::new(n),
            meeting_node: None,
        })
    }

    /// Shortest path between the nodes with the given keys.
    pub fn query(&mut self, start: impl ToString, end: impl ToString) -> Result<PathResult> {
        let from = self.graph.node_index(&start.to_string())?;
        let to = self.graph.node_index(&end.to_string())?;

        let total_cost = self.distance(from, to).unwrap_or(0.0);

        if !self.options.any() {
            return Ok(PathResult {
                total_cost,
                ids: None,
                path: None,
                properties: None,
                nodes: None,
            });
        }

        let ids = self.edge_path();
        // in path order, so the costs along `ids` add up to exactly this value
        let total_cost = ids.iter().fold(0.0, |sum, &edge| sum + self.graph.edge_properties(edge).cost);
        Ok(self.build_result(total_cost, from, ids))
    }

    /// Shortest path between two coordinates of a graph imported from GeoJSON.
    /// The coordinates have to match nodes exactly, see `CoordinateLookup` for snapping arbitrary points.
    pub fn query_coordinates(&mut self, start: [f64; 2], end: [f64; 2]) -> Result<PathResult> {
        self.query(coordinate_key(start), coordinate_key(end))
    }

    /// Length of the shortest path, `None` if there is none.
    pub fn distance(&mut self, from: NodeId, to: NodeId) -> Option<Weight> {
        self.meeting_node = None;
        self.pool.reset();
        self.forward.initialize(&mut self.pool, from);
        self.backward.initialize(&mut self.pool, to);

        if from == to {
            self.meeting_node = Some(from);
            return Some(0.0);
        }

        let upward = self.graph.adjacency_list();
        let downward = self.graph.reverse_adjacency_list();

        let mut tentative_distance = INFINITY;
        let mut meeting_node = None;
        let mut forward_settled = None;
        let mut backward_settled = None;
        let mut forward_done = false;
        let mut backward_done = false;

        loop {
            if !forward_done {
                let backward_distances = self.backward.distances();
                forward_settled = self.forward.settle_next_node(
                    upward,
                    &mut self.pool,
                    |_| false,
                    |node, distance| {
                        if distance + backward_distances[node as usize] < tentative_distance {
                            tentative_distance = distance + backward_distances[node as usize];
                            meeting_node = Some(node);
                        }
                    },
                );
                forward_done = forward_settled.is_none();
            }

            if !backward_done {
                let forward_distances = self.forward.distances();
                backward_settled = self.backward.settle_next_node(
                    downward,
                    &mut self.pool,
                    |_| false,
                    |node, distance| {
                        if distance + forward_distances[node as usize] < tentative_distance {
                            tentative_distance = distance + forward_distances[node as usize];
                            meeting_node = Some(node);
                        }
                    },
                );
                backward_done = backward_settled.is_none();
            }

            // compare tentative distance to both directions progress individually rather than the sum!
            let forward_may_improve = forward_settled.map_or(false, |node| self.forward.tentative_distance(node) < tentative_distance);
            let backward_may_improve = backward_settled.map_or(false, |node| self.backward.tentative_distance(node) < tentative_distance);
            if !forward_may_improve && !backward_may_improve {
                break;
            }
        }

        report!("num_relaxed_arcs", self.forward.num_relaxed_arcs() + self.backward.num_relaxed_arcs());
        self.meeting_node = meeting_node;
        meeting_node.map(|_| tentative_distance)
    }

    /// Original edges of the path found by the last query, in path order.
    fn edge_path(&self) -> Vec<EdgeId> {
        let meeting_node = match self.meeting_node {
            Some(node) => node,
            None => return Vec::new(),
        };

        let mut packed = Vec::new();
        let mut node = meeting_node;
        while let Some((prev, edge)) = self.forward.predecessor(&self.pool, node) {
            packed.push(edge);
            node = prev;
        }
        packed.reverse();

        node = meeting_node;
        while let Some((next, edge)) = self.backward.predecessor(&self.pool, node) {
            packed.push(edge);
            node = next;
        }

        // stack of edges still to be unpacked, the next one on top
        let mut stack: Vec<EdgeId> = packed.into_iter().rev().collect();
        let mut path = Vec::with_capacity(stack.len());
        while let Some(edge) = stack.pop() {
            match self.graph.shortcut_halves(edge) {
                Some([first, second]) => {
                    stack.push(second);
                    stack.push(first);
                }
                None => path.push(edge),
            }
        }

        path
    }

    fn build_result(&self, total_cost: Weight, from: NodeId, ids: Vec<EdgeId>) -> PathResult {
        let nodes = if self.options.nodes {
            let mut nodes = Vec::with_capacity(ids.len() + 1);
            if !ids.is_empty() {
                nodes.push(self.graph.node_key(from).to_string());
                nodes.extend(ids.iter().map(|&edge| self.graph.node_key(self.graph.edge_properties(edge).end).to_string()));
            }
            Some(nodes)
        } else {
            None
        };

        let properties = if self.options.properties {
            Some(ids.iter().map(|&edge| self.graph.edge_properties(edge).clone()).collect())
        } else {
            None
        };

        let path = if self.options.path {
            Some(FeatureCollection::new(ids.iter().map(|&edge| self.edge_feature(edge)).collect()))
        } else {
            None
        };

        PathResult {
            total_cost,
            ids: if self.options.ids { Some(ids) } else { None },
            path,
            properties,
            nodes,
        }
    }

    fn edge_feature(&self, edge: EdgeId) -> Feature {
        let payload = &self.graph.edge_properties(edge).payload;
        let properties = if payload.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.clone()))
        };
        let geometry = self.graph.edge_geometry(edge);
        Feature {
            kind: "Feature".to_string(),
            properties,
            geometry: if geometry.is_empty() { None } else { Some(Geometry::line_string(geometry)) },
        }
    }
}

impl<'g> QueryServer for Server<'g> {
    fn query_distance(&mut self, query: Query) -> Option<Weight> {
        self.distance(query.from, query.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_outputs() -> PathfinderOptions {
        PathfinderOptions {
            ids: true,
            path: true,
            properties: true,
            nodes: true,
        }
    }

    #[test]
    fn uncontracted_graph_is_rejected() {
        let mut graph = GraphStore::new();
        graph.add_edge("a", "b", EdgeInput::new(1.0)).unwrap();
        assert!(matches!(Server::new(&graph, Default::default()), Err(Error::NotContracted)));
    }

    #[test]
    fn unpacks_shortcuts_in_path_order() {
        let mut graph = GraphStore::new();
        for (i, (from, to)) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")].iter().enumerate() {
            graph.add_edge(from, to, EdgeInput::new(1.0 + i as Weight).payload(format!("{{\"i\":{}}}", i))).unwrap();
        }
        contract(&mut graph).unwrap();

        let mut server = Server::new(&graph, all_outputs()).unwrap();
        let result = server.query("a", "e").unwrap();
        assert_eq!(result.total_cost, 10.0);
        assert_eq!(result.ids, Some(vec![0, 1, 2, 3]));
        assert_eq!(result.nodes, Some(vec!["a", "b", "c", "d", "e"].into_iter().map(String::from).collect()));
        let properties = result.properties.unwrap();
        assert_eq!(properties.iter().map(|props| props.cost).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0, 4.0]);
        let path = result.path.unwrap();
        assert_eq!(path.features.len(), 4);
        assert_eq!(path.features[2].properties, serde_json::json!({ "i": 2 }));
        assert!(path.features[2].geometry.is_none());
    }

    #[test]
    fn no_path_and_empty_path_look_the_same() {
        let mut graph = GraphStore::new();
        graph.add_edge("a", "b", EdgeInput::new(1.0)).unwrap();
        contract(&mut graph).unwrap();

        let mut server = Server::new(&graph, all_outputs()).unwrap();
        let unreachable = server.query("b", "a").unwrap();
        let empty = server.query("a", "a").unwrap();
        assert_eq!(unreachable, empty);
        assert_eq!(unreachable.total_cost, 0.0);
        assert_eq!(unreachable.ids, Some(vec![]));
        assert_eq!(unreachable.path.map(|path| path.features.len()), Some(0));

        assert_eq!(server.distance(1, 0), None);
        assert_eq!(server.distance(0, 0), Some(0.0));
        assert!(matches!(server.query("a", "x"), Err(Error::UnknownNode(_))));
    }

    #[test]
    fn reports_relaxed_arcs() {
        let mut graph = GraphStore::new();
        graph.add_edge("a", "b", EdgeInput::new(1.0)).unwrap();
        graph.add_edge("b", "c", EdgeInput::new(1.0)).unwrap();
        contract(&mut graph).unwrap();

        let mut server = Server::new(&graph, Default::default()).unwrap();
        let report = crate::report::collect_report(|| {
            assert_eq!(server.distance(0, 2), Some(2.0));
        });
        assert!(report["num_relaxed_arcs"].as_u64().unwrap() > 0);
    }
}
