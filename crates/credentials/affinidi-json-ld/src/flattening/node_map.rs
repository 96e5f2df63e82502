//! Node Map Generation: collects every node of an expanded document by graph
//! and identifier, relabeling blank nodes on the way.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri::is_blank_node_id;
use crate::json::{self, merge_value};
use crate::keywords as kw;
use crate::urdna2015::identifier_issuer::IdentifierIssuer;

/// Nodes of one graph keyed by `@id`.
pub type Graph = IndexMap<String, Map<String, Value>>;

/// Graph name (`@default` for the default graph) to nodes.
pub type NodeMap = IndexMap<String, Graph>;

/// The node a value is attached to.
enum Subject<'s> {
    Id(&'s str),
    /// A node reference that the current node points to through a reverse property.
    Reverse(&'s Value),
}

/// Builds a [`NodeMap`], issuing `_:b{n}` labels for blank nodes.
#[derive(Debug)]
pub struct NodeMapBuilder {
    graphs: NodeMap,
    issuer: IdentifierIssuer,
}

impl Default for NodeMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeMapBuilder {
    pub fn new() -> Self {
        let mut graphs = NodeMap::new();
        graphs.insert(kw::DEFAULT.to_string(), Graph::new());
        NodeMapBuilder {
            graphs,
            issuer: IdentifierIssuer::new("_:b"),
        }
    }

    /// Adds the nodes of an expanded element to the default graph.
    pub fn add(&mut self, element: &Value) -> Result<()> {
        self.generate(element, kw::DEFAULT, None, None, None)
    }

    /// Adds the nodes of an expanded element to a named graph.
    pub fn add_to_graph(&mut self, element: &Value, graph: &str) -> Result<()> {
        self.generate(element, graph, None, None, None)
    }

    pub fn graphs(&self) -> &NodeMap {
        &self.graphs
    }

    pub fn into_graphs(self) -> NodeMap {
        self.graphs
    }

    /// The graphs together with the issuer, so later steps keep drawing
    /// blank node labels from the same sequence.
    pub fn into_parts(self) -> (NodeMap, IdentifierIssuer) {
        (self.graphs, self.issuer)
    }

    fn relabel(&mut self, id: &str) -> String {
        if is_blank_node_id(id) {
            self.issuer.issue(id)
        } else {
            id.to_string()
        }
    }

    fn node_mut(&mut self, graph: &str, id: &str) -> &mut Map<String, Value> {
        self.graphs
            .entry(graph.to_string())
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| {
                let mut node = Map::new();
                node.insert(kw::ID.to_string(), Value::String(id.to_string()));
                node
            })
    }

    /// Appends `value` to `property` of the subject node, skipping duplicates.
    fn add_to_subject(&mut self, graph: &str, subject: Option<&Subject<'_>>, property: Option<&str>, value: Value) {
        if let (Some(Subject::Id(id)), Some(property)) = (subject, property) {
            merge_value(self.node_mut(graph, id), property, value);
        }
    }

    fn generate(
        &mut self,
        element: &Value,
        active_graph: &str,
        active_subject: Option<&Subject<'_>>,
        active_property: Option<&str>,
        mut list: Option<&mut Vec<Value>>,
    ) -> Result<()> {
        // Step 1
        if let Value::Array(items) = element {
            for item in items {
                self.generate(item, active_graph, active_subject, active_property, list.as_deref_mut())?;
            }
            return Ok(());
        }
        let Value::Object(element) = element else {
            return Ok(());
        };

        // Step 2
        self.graphs.entry(active_graph.to_string()).or_default();

        // Step 3
        let mut element = element.clone();
        if let Some(types) = element.get_mut(kw::TYPE) {
            let relabeled = match types.take() {
                Value::Array(items) => Value::Array(
                    items
                        .into_iter()
                        .map(|t| match t {
                            Value::String(s) => Value::String(self.relabel(&s)),
                            other => other,
                        })
                        .collect(),
                ),
                Value::String(s) => Value::String(self.relabel(&s)),
                other => other,
            };
            *types = relabeled;
        }

        // Step 4
        if element.contains_key(kw::VALUE) {
            let value = Value::Object(element);
            match list {
                Some(list) => list.push(value),
                None => self.add_to_subject(active_graph, active_subject, active_property, value),
            }
            return Ok(());
        }

        // Step 5
        if let Some(items) = element.get(kw::LIST) {
            let mut inner = Vec::new();
            self.generate(items, active_graph, active_subject, active_property, Some(&mut inner))?;
            let mut result = Map::new();
            result.insert(kw::LIST.to_string(), Value::Array(inner));
            let result = Value::Object(result);
            match list {
                Some(list) => list.push(result),
                None => {
                    if let (Some(Subject::Id(id)), Some(property)) = (active_subject, active_property) {
                        json::add_value(self.node_mut(active_graph, id), property, result, true);
                    }
                }
            }
            return Ok(());
        }

        // Step 6.1-6.2
        let id = match element.remove(kw::ID) {
            Some(Value::String(id)) => self.relabel(&id),
            _ => self.issuer.fresh(),
        };

        // Step 6.3-6.4
        self.node_mut(active_graph, &id);

        // Step 6.5-6.6
        match active_subject {
            Some(Subject::Reverse(reference)) => {
                if let Some(property) = active_property {
                    merge_value(self.node_mut(active_graph, &id), property, (*reference).clone());
                }
            }
            _ => {
                if let Some(property) = active_property {
                    let mut reference = Map::new();
                    reference.insert(kw::ID.to_string(), Value::String(id.clone()));
                    let reference = Value::Object(reference);
                    match list.as_deref_mut() {
                        Some(list) => list.push(reference),
                        None => self.add_to_subject(active_graph, active_subject, Some(property), reference),
                    }
                }
            }
        }

        // Step 6.7
        if let Some(types) = element.remove(kw::TYPE) {
            let node = self.node_mut(active_graph, &id);
            for t in json::into_vec(types) {
                merge_value(node, kw::TYPE, t);
            }
        }

        // Step 6.8
        if let Some(index) = element.remove(kw::INDEX) {
            let node = self.node_mut(active_graph, &id);
            match node.get(kw::INDEX) {
                Some(existing) if *existing != index => {
                    return Err(JsonLdError::new(
                        ErrorCode::ConflictingIndexes,
                        format!("node {id} has conflicting indexes {existing} and {index}"),
                    ));
                }
                _ => {
                    node.insert(kw::INDEX.to_string(), index);
                }
            }
        }

        // Step 6.9
        if let Some(Value::Object(reverse_map)) = element.remove(kw::REVERSE) {
            let mut reference = Map::new();
            reference.insert(kw::ID.to_string(), Value::String(id.clone()));
            let reference = Value::Object(reference);
            let subject = Subject::Reverse(&reference);
            for (property, values) in &reverse_map {
                for value in json::as_slice(values) {
                    self.generate(value, active_graph, Some(&subject), Some(property.as_str()), None)?;
                }
            }
        }

        // Step 6.10
        if let Some(graph) = element.remove(kw::GRAPH) {
            self.generate(&graph, &id, None, None, None)?;
        }

        // Step 6.11
        if let Some(included) = element.remove(kw::INCLUDED) {
            self.generate(&included, active_graph, None, None, None)?;
        }

        // Step 6.12
        let mut properties: Vec<(String, Value)> = element.into_iter().collect();
        properties.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (property, value) in properties {
            let property = self.relabel(&property);
            let node = self.node_mut(active_graph, &id);
            if !node.contains_key(&property) {
                node.insert(property.clone(), Value::Array(Vec::new()));
            }
            let subject = Subject::Id(&id);
            self.generate(&value, active_graph, Some(&subject), Some(property.as_str()), None)?;
        }
        Ok(())
    }
}

/// Merge Node Maps: folds every named graph into one graph of merged nodes.
pub fn merge_node_maps(graphs: &NodeMap) -> Graph {
    let mut merged = Graph::new();
    for graph in graphs.values() {
        for (id, node) in graph {
            let merged_node = merged.entry(id.clone()).or_insert_with(|| {
                let mut node = Map::new();
                node.insert(kw::ID.to_string(), Value::String(id.clone()));
                node
            });
            for (property, values) in node {
                if property != kw::TYPE && kw::is_keyword(property) {
                    merged_node.insert(property.clone(), values.clone());
                } else {
                    for value in json::as_slice(values) {
                        merge_value(merged_node, property, value.clone());
                    }
                    if json::as_slice(values).is_empty() {
                        merged_node.entry(property.clone()).or_insert_with(|| Value::Array(Vec::new()));
                    }
                }
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_nodes_and_relabels_blank_nodes() {
        let mut builder = NodeMapBuilder::new();
        builder
            .add(&json!([{
                "@id": "_:x",
                "http://example.org/knows": [{"@id": "http://example.org/bob", "http://example.org/name": [{"@value": "Bob"}]}],
                "http://example.org/friend": [{"http://example.org/name": [{"@value": "Anon"}]}]
            }]))
            .unwrap();
        let graphs = builder.into_graphs();
        let default = &graphs["@default"];
        assert_eq!(default.len(), 3);
        assert_eq!(default["_:b0"]["http://example.org/knows"], json!([{"@id": "http://example.org/bob"}]));
        assert_eq!(default["_:b0"]["http://example.org/friend"], json!([{"@id": "_:b1"}]));
        assert_eq!(default["http://example.org/bob"]["http://example.org/name"], json!([{"@value": "Bob"}]));
    }

    #[test]
    fn named_graphs_and_reverse() {
        let mut builder = NodeMapBuilder::new();
        builder
            .add(&json!([{
                "@id": "http://example.org/g",
                "@graph": [{"@id": "http://example.org/a", "http://example.org/p": [{"@value": 1}]}],
                "@reverse": {"http://example.org/parent": [{"@id": "http://example.org/c"}]}
            }]))
            .unwrap();
        let graphs = builder.into_graphs();
        assert!(graphs["http://example.org/g"].contains_key("http://example.org/a"));
        assert_eq!(
            graphs["@default"]["http://example.org/c"]["http://example.org/parent"],
            json!([{"@id": "http://example.org/g"}])
        );
    }

    #[test]
    fn conflicting_indexes() {
        let mut builder = NodeMapBuilder::new();
        let err = builder
            .add(&json!([
                {"@id": "http://example.org/a", "@index": "1"},
                {"@id": "http://example.org/a", "@index": "2"}
            ]))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConflictingIndexes);
    }

    #[test]
    fn lists_keep_duplicates() {
        let mut builder = NodeMapBuilder::new();
        builder
            .add(&json!([{
                "@id": "http://example.org/a",
                "http://example.org/l": [{"@list": [{"@value": 1}, {"@value": 1}]}]
            }]))
            .unwrap();
        let graphs = builder.into_graphs();
        assert_eq!(
            graphs["@default"]["http://example.org/a"]["http://example.org/l"],
            json!([{"@list": [{"@value": 1}, {"@value": 1}]}])
        );
    }
}
