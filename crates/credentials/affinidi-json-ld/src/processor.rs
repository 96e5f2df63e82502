/*!
 * Public JSON-LD operations.
 *
 * Each operation accepts anything convertible into a [`JsonLdInput`]: an
 * inline JSON document, an RDF [`Dataset`], a [`RemoteDocument`] or a URL that
 * is dereferenced through the configured [`crate::DocumentLoader`].
 *
 * ```
 * use affinidi_json_ld::{JsonLdOptions, processor};
 * use serde_json::json;
 *
 * let doc = json!({
 *     "@context": {"name": "http://schema.org/name"},
 *     "name": "Jane Doe"
 * });
 * let expanded = processor::expand(doc, &JsonLdOptions::default()).unwrap();
 * assert_eq!(expanded, json!([{"http://schema.org/name": [{"@value": "Jane Doe"}]}]));
 * ```
 */

use serde_json::{Map, Value};

use crate::compaction::Compactor;
use crate::context::{ActiveContext, ContextFlags, process_context};
use crate::error::{JsonLdError, Result};
use crate::keywords as kw;
use crate::loader::{DocumentContent, JsonLdInput, RemoteDocument};
use crate::model::Dataset;
use crate::options::JsonLdOptions;
use crate::{expansion, flattening, framing, nquads, rdf, urdna2015};

/// Expands a document, removing its context. Always returns an array.
pub fn expand(input: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<Value> {
    let document = load_input(input.into(), options)?;
    Ok(Value::Array(expand_document(&document, options, false)?))
}

/// Expands a document and compacts it against `context`.
pub fn compact(input: impl Into<JsonLdInput>, context: &Value, options: &JsonLdOptions) -> Result<Value> {
    let document = load_input(input.into(), options)?;
    let expanded = expand_document(&document, &options.clone().with_ordered(false), false)?;

    let (active, context) = compaction_context(context, document.document_url.as_deref(), options)?;
    let compactor = Compactor::new(options);
    let compacted = compactor.compact(&active, None, &Value::Array(expanded))?;
    finish_compaction(&compactor, &active, compacted, context, false)
}

/// Flattens a document, then compacts the result when a context is given.
///
/// With a context the nodes are always returned under `@graph`.
pub fn flatten(input: impl Into<JsonLdInput>, context: Option<&Value>, options: &JsonLdOptions) -> Result<Value> {
    let document = load_input(input.into(), options)?;
    let expanded = expand_document(&document, &options.clone().with_ordered(false), false)?;
    let flattened = flattening::flatten(&expanded, options.ordered)?;
    tracing::debug!(nodes = flattened.len(), "flattened document");

    let Some(context) = context else {
        return Ok(Value::Array(flattened));
    };
    let (active, context) = compaction_context(context, document.document_url.as_deref(), options)?;
    let compactor = Compactor::new(options);
    let compacted = compactor.compact(&active, None, &Value::Array(flattened))?;
    finish_compaction(&compactor, &active, compacted, context, true)
}

/// Frames a document: reshapes it into the tree described by `frame` and
/// compacts the result against the frame's context.
pub fn frame(input: impl Into<JsonLdInput>, frame: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<Value> {
    let document = load_input(input.into(), options)?;
    let frame_document = load_input(frame.into(), options)?;
    let expand_options = options.clone().with_ordered(false);

    // Step 3-9
    let expanded = expand_document(&document, &expand_options, false)?;
    let expanded_frame = expand_document(&frame_document, &expand_options, true)?;
    let frame_json = json_content(&frame_document)?;
    let context = frame_json.get(kw::CONTEXT).cloned().unwrap_or(Value::Null);

    // Step 10-13
    let (active, context) = compaction_context(&context, document.document_url.as_deref(), options)?;
    let frame_default = match frame_json {
        Value::Object(map) => {
            let mut found = false;
            for key in map.keys() {
                if active.expand_vocab(key)?.as_deref() == Some(kw::GRAPH) {
                    found = true;
                    break;
                }
            }
            found
        }
        _ => false,
    };

    // Step 14-17
    let framed = framing::frame(&expanded, &expanded_frame, frame_default, options)?;

    // Step 18-21
    let compactor = Compactor::new(options);
    let compacted = compactor.compact(&active, None, &Value::Array(framed))?;
    let graph_key = compactor.compact_iri(&active, kw::GRAPH, None, true, false)?;
    let mut result = match compacted {
        Value::Array(items) if items.is_empty() => Map::new(),
        Value::Array(items) => single(graph_key.clone(), Value::Array(items)),
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if !options.omit_graph() && !result.contains_key(&graph_key) {
        let nodes = if result.is_empty() { Vec::new() } else { vec![Value::Object(result)] };
        result = single(graph_key, Value::Array(nodes));
    }
    let Value::Object(result) = framing::cleanup_preserve(Value::Object(result)) else {
        return Ok(Value::Object(Map::new()));
    };
    Ok(Value::Object(with_context(result, context)))
}

/// Converts a document to an RDF dataset.
pub fn to_rdf(input: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<Dataset> {
    let document = load_input(input.into(), options)?;
    let expanded = expand_document(&document, &options.clone().with_ordered(false), false)?;
    rdf::to_rdf(&expanded, options)
}

/// Converts an RDF dataset to expanded JSON-LD.
pub fn from_rdf(input: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<Value> {
    let document = load_input(input.into(), options)?;
    let DocumentContent::Rdf(dataset) = &document.content else {
        return Err(JsonLdError::loading_document("expected an RDF dataset"));
    };
    Ok(Value::Array(rdf::from_rdf(dataset, options)?))
}

/// Normalizes a document with URDNA2015. JSON-LD input is converted to RDF first.
pub fn normalize(input: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<Dataset> {
    let document = load_input(input.into(), options)?;
    let dataset = match &document.content {
        DocumentContent::Rdf(dataset) => dataset.clone(),
        DocumentContent::Json(_) => {
            let expanded = expand_document(&document, &options.clone().with_ordered(false), false)?;
            rdf::to_rdf(&expanded, options)?
        }
    };
    Ok(urdna2015::normalize_with_limit(&dataset, options.permutation_limit)?)
}

/// Normalizes a document and serializes it as canonical N-Quads.
pub fn to_canonical_nquads(input: impl Into<JsonLdInput>, options: &JsonLdOptions) -> Result<String> {
    let normalized = normalize(input, options)?;
    Ok(nquads::serialize_dataset(&normalized))
}

fn load_input(input: JsonLdInput, options: &JsonLdOptions) -> Result<RemoteDocument> {
    match input {
        JsonLdInput::Document(document) => Ok(document),
        JsonLdInput::Url(url) => {
            let Some(loader) = &options.document_loader else {
                return Err(JsonLdError::loading_document(format!("no document loader configured to load {url}")));
            };
            let mut document = loader.load(&url)?;
            document.document_url.get_or_insert(url);
            Ok(document)
        }
    }
}

fn json_content(document: &RemoteDocument) -> Result<&Value> {
    document.as_json().ok_or_else(|| {
        JsonLdError::loading_document(format!(
            "expected a JSON-LD document at {}",
            document.document_url.as_deref().unwrap_or("<inline>")
        ))
    })
}

/// Expansion of a loaded document, including `expandContext` and any context link.
fn expand_document(document: &RemoteDocument, options: &JsonLdOptions, frame_expansion: bool) -> Result<Vec<Value>> {
    let content = json_content(document)?;
    let document_url = document.document_url.as_deref();

    // Step 5
    let base = options.base.clone().or_else(|| document.document_url.clone());
    let mut active = ActiveContext::new(base, options.processing_mode);

    // Step 6
    if let Some(expand_context) = &options.expand_context {
        let local = expand_context.get(kw::CONTEXT).unwrap_or(expand_context);
        let base_url = active.original_base_url.clone();
        active = process_context(&active, local, base_url.as_deref(), &mut Vec::new(), ContextFlags::default(), options)?;
    }

    // Step 7
    if let Some(context_url) = &document.context_url {
        let local = Value::String(context_url.clone());
        active = process_context(&active, &local, document_url, &mut Vec::new(), ContextFlags::default(), options)?;
    }

    // Step 8
    let expanded = expansion::expand(&active, content, document_url.or(options.base.as_deref()), options, frame_expansion)?;
    tracing::debug!(nodes = expanded.len(), frame_expansion, "expanded document");
    Ok(expanded)
}

/// Active context for compacting against `context`, together with the local
/// context that ends up in the output.
fn compaction_context<'c>(
    context: &'c Value,
    document_url: Option<&str>,
    options: &JsonLdOptions,
) -> Result<(ActiveContext, &'c Value)> {
    let local = match context {
        Value::Object(map) => map.get(kw::CONTEXT).unwrap_or(context),
        other => other,
    };
    let base = options
        .base
        .clone()
        .or_else(|| options.compact_to_relative.then(|| document_url.map(str::to_string)).flatten());
    let active = ActiveContext::new(base, options.processing_mode);
    let base_url = document_url.or(options.base.as_deref());
    let active = process_context(&active, local, base_url, &mut Vec::new(), ContextFlags::default(), options)?;
    Ok((active, local))
}

/// Turns compacted output into a document: arrays go under `@graph` (or
/// its alias) and the context is attached.
fn finish_compaction(
    compactor: &Compactor<'_>,
    active: &ActiveContext,
    compacted: Value,
    context: &Value,
    force_graph: bool,
) -> Result<Value> {
    let result = match compacted {
        Value::Array(items) if items.is_empty() && !force_graph => Map::new(),
        Value::Array(items) => single(compactor.compact_iri(active, kw::GRAPH, None, true, false)?, Value::Array(items)),
        Value::Object(map) if force_graph && !map.is_empty() => single(
            compactor.compact_iri(active, kw::GRAPH, None, true, false)?,
            Value::Array(vec![Value::Object(map)]),
        ),
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Ok(Value::Object(with_context(result, context)))
}

fn single(key: String, value: Value) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(key, value);
    map
}

/// Prepends `@context` unless the context is empty.
fn with_context(result: Map<String, Value>, context: &Value) -> Map<String, Value> {
    let empty = match context {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return result;
    }
    let mut output = Map::new();
    output.insert(kw::CONTEXT.to_string(), context.clone());
    output.extend(result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::loader::StaticDocumentLoader;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn expand_resolves_against_document_url() {
        let loader = StaticDocumentLoader::new().with_document(
            "https://example.org/doc.jsonld",
            json!({"@context": {"@vocab": "http://schema.org/"}, "@id": "alice", "name": "Alice"}),
        );
        let options = JsonLdOptions::default().with_document_loader(Arc::new(loader));
        let expanded = expand(JsonLdInput::url("https://example.org/doc.jsonld"), &options).unwrap();
        assert_eq!(
            expanded,
            json!([{"@id": "https://example.org/alice", "http://schema.org/name": [{"@value": "Alice"}]}])
        );

        let rebased = options.clone().with_base("https://other.example/");
        let expanded = expand(JsonLdInput::url("https://example.org/doc.jsonld"), &rebased).unwrap();
        assert_eq!(expanded[0]["@id"], json!("https://other.example/alice"));
    }

    #[test]
    fn expand_context_option() {
        let options = JsonLdOptions::default().with_expand_context(json!({"@context": {"name": "http://schema.org/name"}}));
        let expanded = expand(json!({"name": "Bob"}), &options).unwrap();
        assert_eq!(expanded, json!([{"http://schema.org/name": [{"@value": "Bob"}]}]));
    }

    #[test]
    fn url_without_loader_fails() {
        let err = expand(JsonLdInput::url("https://example.org/x"), &JsonLdOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
    }

    #[test]
    fn compact_wraps_multiple_nodes_in_graph() {
        let input = json!([
            {"@id": "http://example.org/a", "http://schema.org/name": "A"},
            {"@id": "http://example.org/b", "http://schema.org/name": "B"}
        ]);
        let context = json!({"@context": {"name": "http://schema.org/name", "nodes": "@graph"}});
        let compacted = compact(input, &context, &JsonLdOptions::default()).unwrap();
        assert_eq!(
            compacted,
            json!({
                "@context": {"name": "http://schema.org/name", "nodes": "@graph"},
                "nodes": [
                    {"@id": "http://example.org/a", "name": "A"},
                    {"@id": "http://example.org/b", "name": "B"}
                ]
            })
        );
    }

    #[test]
    fn compact_empty_context_is_not_attached() {
        let compacted = compact(json!({"http://schema.org/name": "A"}), &json!({}), &JsonLdOptions::default()).unwrap();
        assert_eq!(compacted, json!({"http://schema.org/name": "A"}));
    }

    #[test]
    fn flatten_with_context_uses_graph() {
        let input = json!({
            "@context": {"knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"}},
            "@id": "http://example.org/a",
            "knows": {"@id": "http://example.org/b", "knows": "http://example.org/a"}
        });
        let context = json!({"knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"}});
        let options = JsonLdOptions::default().with_ordered(true);
        let flattened = flatten(input, Some(&context), &options).unwrap();
        assert_eq!(
            flattened,
            json!({
                "@context": {"knows": {"@id": "http://xmlns.com/foaf/0.1/knows", "@type": "@id"}},
                "@graph": [
                    {"@id": "http://example.org/a", "knows": "http://example.org/b"},
                    {"@id": "http://example.org/b", "knows": "http://example.org/a"}
                ]
            })
        );
    }

    #[test]
    fn from_rdf_requires_a_dataset() {
        let err = from_rdf(json!({}), &JsonLdOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
    }

    #[test]
    fn canonical_nquads_of_a_blank_node() {
        let doc = json!({"@context": {"name": "http://schema.org/name"}, "name": "Jane"});
        let nquads = to_canonical_nquads(doc, &JsonLdOptions::default()).unwrap();
        assert_eq!(nquads, "_:c14n0 <http://schema.org/name> \"Jane\" .\n");
    }
}
