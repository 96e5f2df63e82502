/*!
 * JSON-LD 1.1 Framing.
 *
 * Selects node objects from an expanded document that match an expanded
 * frame and reshapes them into the tree the frame describes. Output is
 * expanded JSON-LD; properties the frame asks for but the data lacks are
 * represented by `@preserve` placeholders until [`cleanup_preserve`] runs
 * over the compacted result.
 */

pub mod matching;

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};
use crate::flattening::{NodeMap, NodeMapBuilder, merge_node_maps};
use crate::iri::is_blank_node_id;
use crate::json::{self, add_value, as_slice};
use crate::keywords::{self as kw, is_keyword};
use crate::options::{Embed, JsonLdOptions};

use matching::{filter_subject, validate_frame, value_match};

/// Node map entry holding every graph merged together.
const MERGED: &str = "@merged";

/// The `@embed`, `@explicit` and `@requireAll` flags in effect for a frame.
#[derive(Clone, Copy, Debug)]
struct FrameFlags {
    embed: Embed,
    explicit: bool,
    require_all: bool,
}

impl FrameFlags {
    fn read(frame: &Map<String, Value>, options: &JsonLdOptions) -> Result<Self> {
        let embed = match flag_value(frame, kw::EMBED) {
            Some(value) => Embed::from_value(value)?,
            None => options.embed,
        };
        Ok(FrameFlags {
            embed,
            explicit: bool_flag(frame, kw::EXPLICIT, options.explicit)?,
            require_all: bool_flag(frame, kw::REQUIRE_ALL, options.require_all)?,
        })
    }

    /// The frame used for values whose property the frame does not mention.
    fn implicit_frame(&self) -> Value {
        let mut frame = Map::new();
        frame.insert(kw::EMBED.to_string(), Value::String(self.embed.as_str().to_string()));
        frame.insert(kw::EXPLICIT.to_string(), Value::Bool(self.explicit));
        frame.insert(kw::REQUIRE_ALL.to_string(), Value::Bool(self.require_all));
        Value::Array(vec![Value::Object(frame)])
    }
}

/// A framing flag's value, unwrapped from the value object frame expansion produces.
fn flag_value<'f>(frame: &'f Map<String, Value>, flag: &str) -> Option<&'f Value> {
    let value = as_slice(frame.get(flag)?).first()?;
    Some(value.get(kw::VALUE).unwrap_or(value))
}

fn bool_flag(frame: &Map<String, Value>, flag: &str, default: bool) -> Result<bool> {
    match flag_value(frame, flag) {
        None => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s == "true" => Ok(true),
        Some(Value::String(s)) if s == "false" => Ok(false),
        Some(other) => Err(JsonLdError::invalid_frame(format!("{flag} must be a boolean, found {other}"))),
    }
}

/// Where a framed node is written.
enum Parent<'p> {
    List(&'p mut Vec<Value>),
    Property(&'p mut Map<String, Value>, &'p str),
}

impl Parent<'_> {
    fn push(&mut self, output: Value) {
        match self {
            Parent::List(list) => list.push(output),
            Parent::Property(map, property) => add_value(map, property, output, true),
        }
    }
}

struct Framer<'a> {
    options: &'a JsonLdOptions,
    graph_map: NodeMap,
    /// Graph searched for reverse references and referenced-node matches.
    subjects: String,
    unique_embeds: HashMap<String, HashSet<String>>,
    /// `(graph, id)` of each node currently being embedded.
    subject_stack: Vec<(String, String)>,
    /// Number of times each blank node identifier appears in the output.
    bnode_uses: HashMap<String, usize>,
}

/// Frames an expanded document.
///
/// The default graph is framed when `frame_default` is set, otherwise the
/// merge of every graph. Returns expanded output still holding `@preserve`
/// placeholders.
pub fn frame(input: &[Value], frame: &[Value], frame_default: bool, options: &JsonLdOptions) -> Result<Vec<Value>> {
    let mut builder = NodeMapBuilder::new();
    for element in input {
        builder.add(element)?;
    }
    let mut graph_map = builder.into_graphs();

    let graph = if frame_default {
        kw::DEFAULT.to_string()
    } else {
        let merged = merge_node_maps(&graph_map);
        graph_map.insert(MERGED.to_string(), merged);
        MERGED.to_string()
    };

    let mut framer = Framer {
        options,
        graph_map,
        subjects: graph.clone(),
        unique_embeds: HashMap::new(),
        subject_stack: Vec::new(),
        bnode_uses: HashMap::new(),
    };

    let mut subjects: Vec<String> = framer.graph_map.get(&graph).map(|g| g.keys().cloned().collect()).unwrap_or_default();
    subjects.sort();

    let frame = Value::Array(frame.to_vec());
    let mut framed = Vec::new();
    framer.frame(&subjects, &frame, &mut Parent::List(&mut framed), true, &graph, false)?;
    tracing::debug!(matches = framed.len(), graph = graph.as_str(), "framed document");

    if !options.is_json_ld_10() {
        let unique: HashSet<&str> = framer
            .bnode_uses
            .iter()
            .filter(|(_, uses)| **uses == 1)
            .map(|(id, _)| id.as_str())
            .collect();
        for node in &mut framed {
            prune_blank_node_ids(node, &unique);
        }
    }
    Ok(framed)
}

impl Framer<'_> {
    fn frame(
        &mut self,
        subjects: &[String],
        frame: &Value,
        parent: &mut Parent<'_>,
        top_level: bool,
        graph: &str,
        embedded: bool,
    ) -> Result<()> {
        let frame = validate_frame(frame)?;
        let flags = FrameFlags::read(frame, self.options)?;

        for (id, subject) in self.filter_subjects(graph, subjects, frame, &flags)? {
            // Each top-level match is embedded independently
            if top_level {
                self.unique_embeds = HashMap::from([(graph.to_string(), HashSet::new())]);
            }

            let mut output = Map::new();
            output.insert(kw::ID.to_string(), Value::String(id.clone()));
            if is_blank_node_id(&id) {
                *self.bnode_uses.entry(id.clone()).or_default() += 1;
            }

            if (embedded && flags.embed == Embed::Never) || self.creates_circular_reference(&id, graph) {
                parent.push(Value::Object(output));
                continue;
            }

            let seen = self.unique_embeds.entry(graph.to_string()).or_default();
            if embedded && flags.embed == Embed::Once && seen.contains(&id) {
                parent.push(Value::Object(output));
                continue;
            }
            seen.insert(id.clone());
            self.subject_stack.push((graph.to_string(), id.clone()));

            // Node is also the name of a graph
            if let Some(graph_subjects) = self.graph_map.get(&id) {
                let (recurse, subframe) = match frame.get(kw::GRAPH) {
                    None => (graph != MERGED, Value::Object(Map::new())),
                    Some(subframe) => (
                        id != MERGED && id != kw::DEFAULT,
                        as_slice(subframe)
                            .first()
                            .filter(|f| f.is_object())
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Map::new())),
                    ),
                };
                if recurse {
                    let mut ids: Vec<String> = graph_subjects.keys().cloned().collect();
                    ids.sort();
                    let subframe = Value::Array(vec![subframe]);
                    self.frame(&ids, &subframe, &mut Parent::Property(&mut output, kw::GRAPH), false, &id, false)?;
                }
            }

            if let Some(included) = frame.get(kw::INCLUDED) {
                self.frame(subjects, included, &mut Parent::Property(&mut output, kw::INCLUDED), false, graph, false)?;
            }

            self.frame_properties(&subject, frame, &flags, &mut output, graph)?;
            add_defaults(frame, self.options, &mut output)?;
            self.frame_reverse(&id, frame, &mut output, top_level, graph)?;

            parent.push(Value::Object(output));
            self.subject_stack.pop();
        }
        Ok(())
    }

    /// Nodes of `graph` named in `subjects` that match `frame`, ordered by identifier.
    fn filter_subjects(
        &self,
        graph: &str,
        subjects: &[String],
        frame: &Map<String, Value>,
        flags: &FrameFlags,
    ) -> Result<Vec<(String, Map<String, Value>)>> {
        let Some(nodes) = self.graph_map.get(graph) else {
            return Ok(Vec::new());
        };
        let lookup = self.graph_map.get(&self.subjects).unwrap_or(nodes);
        let mut matches = Vec::new();
        for id in subjects {
            if let Some(subject) = nodes.get(id)
                && filter_subject(lookup, subject, frame, flags.require_all)?
            {
                matches.push((id.clone(), subject.clone()));
            }
        }
        matches.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(matches)
    }

    fn creates_circular_reference(&self, id: &str, graph: &str) -> bool {
        self.subject_stack.iter().rev().any(|(g, s)| g == graph && s == id)
    }

    fn frame_properties(
        &mut self,
        subject: &Map<String, Value>,
        frame: &Map<String, Value>,
        flags: &FrameFlags,
        output: &mut Map<String, Value>,
        graph: &str,
    ) -> Result<()> {
        let mut properties: Vec<&String> = subject.keys().collect();
        properties.sort();

        for property in properties {
            let values = &subject[property.as_str()];
            if is_keyword(property) {
                output.insert(property.clone(), values.clone());
                if property == kw::TYPE {
                    for t in as_slice(values).iter().filter_map(Value::as_str).filter(|t| is_blank_node_id(t)) {
                        *self.bnode_uses.entry(t.to_string()).or_default() += 1;
                    }
                }
                continue;
            }

            if flags.explicit && !frame.contains_key(property.as_str()) {
                continue;
            }

            let subframe = frame.get(property.as_str()).cloned().unwrap_or_else(|| flags.implicit_frame());
            for value in as_slice(values) {
                if let Some(items) = value.get(kw::LIST).filter(|_| json::is_list_object(value)) {
                    let list_frame = frame
                        .get(property.as_str())
                        .and_then(|f| as_slice(f).first())
                        .and_then(|f| f.get(kw::LIST))
                        .cloned()
                        .unwrap_or_else(|| flags.implicit_frame());
                    let mut list = Vec::new();
                    for item in as_slice(items) {
                        match json::id_of(item).filter(|_| json::is_node_reference(item)) {
                            Some(id) => {
                                let ids = [id.to_string()];
                                self.frame(&ids, &list_frame, &mut Parent::List(&mut list), false, graph, true)?;
                            }
                            None => list.push(item.clone()),
                        }
                    }
                    let mut list_object = Map::new();
                    list_object.insert(kw::LIST.to_string(), Value::Array(list));
                    add_value(output, property, Value::Object(list_object), true);
                } else if let Some(id) = json::id_of(value).filter(|_| json::is_node_reference(value)) {
                    let ids = [id.to_string()];
                    self.frame(&ids, &subframe, &mut Parent::Property(output, property), false, graph, true)?;
                } else {
                    let matches = as_slice(&subframe).first().is_none_or(|pattern| value_match(pattern, value));
                    if matches {
                        add_value(output, property, value.clone(), true);
                    }
                }
            }
        }
        Ok(())
    }

    /// Embeds the nodes that point at `id` through the properties of the frame's `@reverse`.
    fn frame_reverse(
        &mut self,
        id: &str,
        frame: &Map<String, Value>,
        output: &mut Map<String, Value>,
        top_level: bool,
        graph: &str,
    ) -> Result<()> {
        let Some(Value::Object(reverse_frame)) = frame.get(kw::REVERSE) else {
            return Ok(());
        };
        let mut reverse_properties: Vec<&String> = reverse_frame.keys().collect();
        reverse_properties.sort();

        for reverse_property in reverse_properties {
            let subframe = &reverse_frame[reverse_property.as_str()];
            let referrers: Vec<String> = self
                .graph_map
                .get(&self.subjects)
                .map(|nodes| {
                    nodes
                        .iter()
                        .filter(|(_, node)| {
                            node.get(reverse_property.as_str())
                                .is_some_and(|values| as_slice(values).iter().any(|v| json::id_of(v) == Some(id)))
                        })
                        .map(|(referrer, _)| referrer.clone())
                        .collect()
                })
                .unwrap_or_default();

            for referrer in referrers {
                let mut embedded = output
                    .get_mut(kw::REVERSE)
                    .and_then(Value::as_object_mut)
                    .and_then(|reverse| reverse.remove(reverse_property.as_str()))
                    .map(json::into_vec)
                    .unwrap_or_default();
                self.frame(&[referrer], subframe, &mut Parent::List(&mut embedded), top_level, graph, true)?;

                let reverse = output
                    .entry(kw::REVERSE)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(reverse) = reverse {
                    reverse.insert(reverse_property.clone(), Value::Array(embedded));
                }
            }
        }
        Ok(())
    }
}

/// Adds `@preserve` placeholders for frame properties missing from `output`,
/// and the frame's default `@type` when the node has none.
fn add_defaults(frame: &Map<String, Value>, options: &JsonLdOptions, output: &mut Map<String, Value>) -> Result<()> {
    let mut properties: Vec<&String> = frame.keys().collect();
    properties.sort();

    for property in properties {
        let next = as_slice(&frame[property.as_str()]).first();
        if property == kw::TYPE {
            if let Some(default) = next.and_then(|t| t.get(kw::DEFAULT))
                && !output.contains_key(kw::TYPE)
            {
                output.insert(kw::TYPE.to_string(), Value::Array(as_slice(default).to_vec()));
            }
            continue;
        }
        if is_keyword(property) {
            continue;
        }

        let empty = Map::new();
        let next = next.and_then(Value::as_object).unwrap_or(&empty);
        let omit_default = bool_flag(next, kw::OMIT_DEFAULT, options.omit_default)?;
        if omit_default || output.contains_key(property.as_str()) {
            continue;
        }

        let preserve: Vec<Value> = match next.get(kw::DEFAULT) {
            Some(default) => json::into_vec(default.clone()).into_iter().map(null_marker).collect(),
            None => vec![Value::String(kw::NULL.to_string())],
        };
        let mut placeholder = Map::new();
        placeholder.insert(kw::PRESERVE.to_string(), Value::Array(preserve));
        output.insert(property.clone(), Value::Array(vec![Value::Object(placeholder)]));
    }
    Ok(())
}

/// `{"@value": "@null"}` becomes the bare `@null` marker.
fn null_marker(value: Value) -> Value {
    let is_null_marker = value
        .as_object()
        .is_some_and(|m| m.len() == 1 && m.get(kw::VALUE).and_then(Value::as_str) == Some(kw::NULL));
    if is_null_marker {
        Value::String(kw::NULL.to_string())
    } else {
        value
    }
}

/// Drops `@id` from blank nodes that appear only once in the output.
fn prune_blank_node_ids(value: &mut Value, unique: &HashSet<&str>) {
    match value {
        Value::Array(items) => {
            for item in items {
                prune_blank_node_ids(item, unique);
            }
        }
        Value::Object(map) => {
            if map.contains_key(kw::VALUE) {
                return;
            }
            if map.get(kw::ID).and_then(Value::as_str).is_some_and(|id| unique.contains(id)) {
                map.remove(kw::ID);
            }
            for (_, entry) in map.iter_mut() {
                prune_blank_node_ids(entry, unique);
            }
        }
        _ => {}
    }
}

/// Replaces `@preserve` placeholders with their content and `@null` markers
/// with `null`, dropping nulls from arrays.
pub fn cleanup_preserve(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(cleanup_preserve)
                .filter(|item| !item.is_null())
                .collect(),
        ),
        Value::Object(mut map) => {
            if let Some(preserved) = map.remove(kw::PRESERVE) {
                let preserved = match preserved {
                    Value::Array(items) if items.len() == 1 => items.into_iter().next().unwrap_or(Value::Null),
                    other => other,
                };
                return cleanup_preserve(preserved);
            }
            Value::Object(map.into_iter().map(|(k, v)| (k, cleanup_preserve(v))).collect())
        }
        Value::String(s) if s == kw::NULL => Value::Null,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({
                "@id": "http://example.org/alice",
                "@type": ["http://example.org/Person"],
                "http://example.org/knows": [{"@id": "http://example.org/bob"}]
            }),
            json!({
                "@id": "http://example.org/bob",
                "@type": ["http://example.org/Person"],
                "http://example.org/pet": [{"@id": "http://example.org/rex"}]
            }),
            json!({
                "@id": "http://example.org/rex",
                "@type": ["http://example.org/Dog"],
                "http://example.org/name": [{"@value": "Rex"}]
            }),
        ]
    }

    #[test]
    fn type_frame_embeds_matches() {
        let options = JsonLdOptions::default();
        let frame = vec![json!({"@type": ["http://example.org/Dog"]})];
        let framed = super::frame(&people(), &frame, false, &options).unwrap();
        assert_eq!(
            framed,
            vec![json!({
                "@id": "http://example.org/rex",
                "@type": ["http://example.org/Dog"],
                "http://example.org/name": [{"@value": "Rex"}]
            })]
        );
    }

    #[test]
    fn embed_never_leaves_references() {
        let options = JsonLdOptions::default();
        let frame = vec![json!({"@type": ["http://example.org/Person"], "@embed": {"@value": "@never"}})];
        let framed = super::frame(&people(), &frame, false, &options).unwrap();
        assert_eq!(framed.len(), 2);
        assert_eq!(framed[0], json!({"@id": "http://example.org/alice"}));
        assert_eq!(framed[1], json!({"@id": "http://example.org/bob"}));
    }

    #[test]
    fn nested_matches_are_embedded_once_per_top_level_node() {
        let options = JsonLdOptions::default();
        let frame = vec![json!({"@type": ["http://example.org/Person"]})];
        let framed = super::frame(&people(), &frame, false, &options).unwrap();
        assert_eq!(framed.len(), 2);
        assert_eq!(
            framed[0]["http://example.org/knows"][0]["http://example.org/pet"][0]["http://example.org/name"],
            json!([{"@value": "Rex"}])
        );
        assert_eq!(framed[1]["http://example.org/pet"][0]["@id"], json!("http://example.org/rex"));
    }

    #[test]
    fn missing_properties_get_placeholders() {
        let options = JsonLdOptions::default();
        let frame = vec![json!({
            "@type": ["http://example.org/Dog"],
            "http://example.org/owner": [{"@default": {"@value": "@null"}}],
            "http://example.org/age": [{"@default": {"@value": 3}}]
        })];
        let framed = super::frame(&people(), &frame, false, &options).unwrap();
        assert_eq!(framed[0]["http://example.org/owner"], json!([{"@preserve": ["@null"]}]));
        assert_eq!(framed[0]["http://example.org/age"], json!([{"@preserve": [{"@value": 3}]}]));

        let cleaned = cleanup_preserve(json!({"owner": {"@preserve": "@null"}, "age": {"@preserve": 3}}));
        assert_eq!(cleaned, json!({"owner": null, "age": 3}));
    }

    #[test]
    fn explicit_drops_unframed_properties() {
        let options = JsonLdOptions::default();
        let frame = vec![json!({"@type": ["http://example.org/Person"], "@explicit": {"@value": true}})];
        let framed = super::frame(&people(), &frame, false, &options).unwrap();
        assert_eq!(framed[0], json!({"@id": "http://example.org/alice", "@type": ["http://example.org/Person"]}));
    }

    #[test]
    fn circular_references_stop_embedding() {
        let options = JsonLdOptions::default();
        let input = vec![
            json!({"@id": "http://example.org/a", "http://example.org/p": [{"@id": "http://example.org/b"}]}),
            json!({"@id": "http://example.org/b", "http://example.org/p": [{"@id": "http://example.org/a"}]}),
        ];
        let frame = vec![json!({"@id": ["http://example.org/a"], "@embed": {"@value": "@always"}})];
        let framed = super::frame(&input, &frame, false, &options).unwrap();
        assert_eq!(
            framed,
            vec![json!({
                "@id": "http://example.org/a",
                "http://example.org/p": [{
                    "@id": "http://example.org/b",
                    "http://example.org/p": [{"@id": "http://example.org/a"}]
                }]
            })]
        );
    }

    #[test]
    fn unreferenced_blank_nodes_lose_their_identifier() {
        let options = JsonLdOptions::default();
        let input = vec![json!({
            "@id": "http://example.org/a",
            "http://example.org/p": [{"http://example.org/q": [{"@value": 1}]}]
        })];
        let frame = vec![json!({"@id": ["http://example.org/a"]})];
        let framed = super::frame(&input, &frame, false, &options).unwrap();
        assert_eq!(framed[0]["http://example.org/p"], json!([{"http://example.org/q": [{"@value": 1}]}]));
    }

    #[test]
    fn invalid_frame() {
        let options = JsonLdOptions::default();
        let err = super::frame(&people(), &[json!({}), json!({})], false, &options).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidFrame);
    }
}
