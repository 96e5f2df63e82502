//! Flattening: every node object becomes a top-level entry, nested nodes are
//! replaced by references, and named graphs are collected under their graph
//! node's `@graph`.

pub mod node_map;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::keywords as kw;

pub use node_map::{Graph, NodeMap, NodeMapBuilder, merge_node_maps};

/// Flattens an expanded document into an array of node objects.
pub fn flatten(expanded: &[Value], ordered: bool) -> Result<Vec<Value>> {
    // Step 1-2
    let mut builder = NodeMapBuilder::new();
    for element in expanded {
        builder.add(element)?;
    }
    let mut graphs = builder.into_graphs();
    let mut default_graph = graphs.shift_remove(kw::DEFAULT).unwrap_or_default();

    // Step 3
    let mut graph_names: Vec<String> = graphs.keys().cloned().collect();
    if ordered {
        graph_names.sort();
    }
    for graph_name in graph_names {
        let Some(graph) = graphs.get(&graph_name) else {
            continue;
        };
        let entry = default_graph.entry(graph_name.clone()).or_insert_with(|| {
            let mut node = Map::new();
            node.insert(kw::ID.to_string(), Value::String(graph_name.clone()));
            node
        });
        entry.insert(kw::GRAPH.to_string(), Value::Array(graph_nodes(graph, ordered)));
    }

    // Step 4-5
    Ok(graph_nodes(&default_graph, ordered))
}

/// Nodes of a graph, dropping those that only carry `@id`.
pub fn graph_nodes(graph: &Graph, ordered: bool) -> Vec<Value> {
    let mut ids: Vec<&String> = graph.keys().collect();
    if ordered {
        ids.sort();
    }
    ids.into_iter()
        .filter_map(|id| graph.get(id))
        .filter(|node| !(node.len() == 1 && node.contains_key(kw::ID)))
        .map(|node| Value::Object(node.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mutual_references_are_split() {
        let expanded = vec![json!({
            "@id": "http://example.org/a",
            "http://example.org/knows": [{
                "@id": "http://example.org/b",
                "http://example.org/knows": [{"@id": "http://example.org/a"}]
            }]
        })];
        let flattened = flatten(&expanded, true).unwrap();
        assert_eq!(
            flattened,
            vec![
                json!({"@id": "http://example.org/a", "http://example.org/knows": [{"@id": "http://example.org/b"}]}),
                json!({"@id": "http://example.org/b", "http://example.org/knows": [{"@id": "http://example.org/a"}]}),
            ]
        );
    }

    #[test]
    fn named_graphs_nest_under_graph_node() {
        let expanded = vec![json!({
            "@id": "http://example.org/g",
            "@graph": [{"@id": "http://example.org/x", "http://example.org/p": [{"@value": "v"}]}]
        })];
        let flattened = flatten(&expanded, true).unwrap();
        assert_eq!(
            flattened,
            vec![json!({
                "@id": "http://example.org/g",
                "@graph": [{"@id": "http://example.org/x", "http://example.org/p": [{"@value": "v"}]}]
            })]
        );
    }
}
