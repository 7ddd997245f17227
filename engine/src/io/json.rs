//! JSON encoding of contracted graphs.

use crate::datastr::graph::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordRef<'a> {
    locked: bool,
    geo_json_flag: bool,
    adjacency_list: &'a [Vec<Edge>],
    reverse_adjacency_list: &'a [Vec<Edge>],
    node_to_index_lookup: &'a HashMap<String, NodeId>,
    edge_properties: &'a [EdgeProperties],
    edge_geometry: &'a [EdgeGeometry],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_uncontracted_edge_index: Option<EdgeId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    locked: bool,
    geo_json_flag: bool,
    adjacency_list: Vec<Vec<Edge>>,
    reverse_adjacency_list: Vec<Vec<Edge>>,
    node_to_index_lookup: HashMap<String, NodeId>,
    edge_properties: Vec<EdgeProperties>,
    edge_geometry: Vec<EdgeGeometry>,
    #[serde(default)]
    max_uncontracted_edge_index: Option<EdgeId>,
}

impl GraphStore {
    /// Serialize the contracted graph to JSON.
    /// Fails with `Error::NotContracted` if the graph was not contracted yet.
    pub fn save_ch(&self) -> Result<String> {
        if !self.is_locked() {
            return Err(Error::NotContracted);
        }

        let record = RecordRef {
            locked: self.is_locked(),
            geo_json_flag: self.is_geographic(),
            adjacency_list: self.adjacency_list(),
            reverse_adjacency_list: self.reverse_adjacency_list(),
            node_to_index_lookup: self.node_to_index_lookup(),
            edge_properties: self.all_edge_properties(),
            edge_geometry: self.all_edge_geometry(),
            max_uncontracted_edge_index: self.max_uncontracted_edge_index(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    /// Replace the state of this graph with a graph serialized by `save_ch`.
    pub fn load_ch(&mut self, json: &str) -> Result<()> {
        let record: Record = serde_json::from_str(json)?;
        self.replace_with(
            record.locked,
            record.geo_json_flag,
            record.adjacency_list,
            record.reverse_adjacency_list,
            record.node_to_index_lookup,
            record.edge_properties,
            record.edge_geometry,
            record.max_uncontracted_edge_index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn uses_camel_case_field_names() {
        let mut graph = GraphStore::new();
        graph.add_edge("a", "b", EdgeInput::new(1.0).payload("x")).unwrap();
        assert!(matches!(graph.save_ch(), Err(Error::NotContracted)));
        crate::algo::contraction_hierarchy::contract(&mut graph).unwrap();

        let json: Value = serde_json::from_str(&graph.save_ch().unwrap()).unwrap();
        for key in [
            "locked",
            "geoJsonFlag",
            "adjacencyList",
            "reverseAdjacencyList",
            "nodeToIndexLookup",
            "edgeProperties",
            "edgeGeometry",
            "maxUncontractedEdgeIndex",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["edgeProperties"][0]["_cost"], 1.0);
        assert_eq!(json["edgeProperties"][0]["payload"], "x");
        assert_eq!(json["nodeToIndexLookup"]["b"], 1);
    }

    #[test]
    fn derives_shortcut_boundary_when_missing() {
        let json = r#"{
            "locked": true,
            "geoJsonFlag": false,
            "adjacencyList": [[{ "end": 2, "cost": 3.0, "attrs": 2 }], [], []],
            "reverseAdjacencyList": [[], [], [{ "end": 0, "cost": 3.0, "attrs": 2 }]],
            "nodeToIndexLookup": { "a": 0, "b": 1, "c": 2 },
            "edgeProperties": [
                { "_cost": 1.0, "_start_index": 0, "_end_index": 1 },
                { "_cost": 2.0, "_start_index": 1, "_end_index": 2 },
                { "_cost": 3.0, "_start_index": 0, "_end_index": 2, "_ordered": [0, 1] }
            ],
            "edgeGeometry": [[], [], []]
        }"#;
        let mut graph = GraphStore::new();
        graph.load_ch(json).unwrap();
        assert_eq!(graph.max_uncontracted_edge_index(), Some(1));
        assert_eq!(graph.shortcut_halves(2), Some([0, 1]));
        assert_eq!(graph.node_key(2), "c");
        assert!(graph.is_locked());
    }

    #[test]
    fn rejects_inconsistent_records() {
        let json = r#"{
            "locked": true,
            "geoJsonFlag": false,
            "adjacencyList": [[{ "end": 5, "cost": 1.0, "attrs": 0 }], []],
            "reverseAdjacencyList": [[], []],
            "nodeToIndexLookup": { "a": 0, "b": 1 },
            "edgeProperties": [{ "_cost": 1.0, "_start_index": 0, "_end_index": 1 }],
            "edgeGeometry": [[]]
        }"#;
        let mut graph = GraphStore::new();
        assert!(matches!(graph.load_ch(json), Err(Error::MalformedData(_))));
        assert!(matches!(graph.load_ch("{"), Err(Error::Json(_))));
    }

    fn record_with_shortcut(ordered: &str) -> String {
        format!(
            r#"{{
            "locked": true,
            "geoJsonFlag": false,
            "adjacencyList": [[{{ "end": 1, "cost": 1.0, "attrs": 1 }}], []],
            "reverseAdjacencyList": [[], [{{ "end": 0, "cost": 1.0, "attrs": 1 }}]],
            "nodeToIndexLookup": {{ "a": 0, "b": 1 }},
            "edgeProperties": [
                {{ "_cost": 1.0, "_start_index": 0, "_end_index": 1 }},
                {{ "_cost": 1.0, "_start_index": 0, "_end_index": 1, "_ordered": {} }}
            ],
            "edgeGeometry": [[], []],
            "maxUncontractedEdgeIndex": 0
        }}"#,
            ordered
        )
    }

    #[test]
    fn rejects_shortcuts_which_do_not_unpack() {
        let mut graph = GraphStore::new();
        // out of range
        assert!(matches!(graph.load_ch(&record_with_shortcut("[0, 99]")), Err(Error::MalformedData(_))));
        // self reference
        assert!(matches!(graph.load_ch(&record_with_shortcut("[1, 0]")), Err(Error::MalformedData(_))));
        assert!(!graph.is_locked());

        graph.load_ch(&record_with_shortcut("[0, 0]")).unwrap();
        assert_eq!(graph.shortcut_halves(1), Some([0, 0]));
    }
}
