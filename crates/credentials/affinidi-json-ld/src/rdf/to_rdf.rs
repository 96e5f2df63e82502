//! Deserialize JSON-LD to RDF: turns a node map into a [`Dataset`].

use serde_json::{Map, Value};

use super::number::lexical_form;
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::flattening::{NodeMap, NodeMapBuilder};
use crate::iri::{is_absolute, is_blank_node_id};
use crate::json::{self, as_slice};
use crate::keywords::{self as kw, is_keyword};
use crate::language;
use crate::model::{BlankNode, Dataset, GraphLabel, I18N_BASE, Literal, NamedNode, Object, Quad, Resource, rdf, xsd};
use crate::options::{JsonLdOptions, RdfDirection};
use crate::urdna2015::identifier_issuer::IdentifierIssuer;

/// Triples produced while converting one value, added to the value's graph afterwards.
type Triples = Vec<(Resource, Resource, Object)>;

/// Converts an expanded document to an RDF dataset.
pub fn to_rdf(expanded: &[Value], options: &JsonLdOptions) -> Result<Dataset> {
    let mut builder = NodeMapBuilder::new();
    for element in expanded {
        builder.add(element)?;
    }
    let (graphs, issuer) = builder.into_parts();

    let mut serializer = RdfSerializer { options, issuer };
    let dataset = serializer.serialize(&graphs)?;
    tracing::debug!(quads = dataset.len(), "converted document to RDF");
    Ok(dataset)
}

/// A well-formed node identifier as an RDF resource.
fn resource(identifier: &str) -> Option<Resource> {
    (is_blank_node_id(identifier) || is_absolute(identifier)).then(|| Resource::from_identifier(identifier))
}

struct RdfSerializer<'a> {
    options: &'a JsonLdOptions,
    issuer: IdentifierIssuer,
}

impl RdfSerializer<'_> {
    fn serialize(&mut self, graphs: &NodeMap) -> Result<Dataset> {
        let mut dataset = Dataset::new();

        let mut graph_names: Vec<&String> = graphs.keys().collect();
        graph_names.sort();
        for graph_name in graph_names {
            // Step 1.1-1.2
            let label = if graph_name == kw::DEFAULT {
                GraphLabel::Default
            } else {
                match resource(graph_name) {
                    Some(resource) => GraphLabel::from(resource),
                    None => continue,
                }
            };
            let graph = &graphs[graph_name.as_str()];

            let mut subjects: Vec<&String> = graph.keys().collect();
            subjects.sort();
            for subject in subjects {
                // Step 1.3.1
                let Some(rdf_subject) = resource(subject) else {
                    continue;
                };
                self.serialize_node(&graph[subject.as_str()], &rdf_subject, &label, &mut dataset)?;
            }
        }
        Ok(dataset)
    }

    fn serialize_node(
        &mut self,
        node: &Map<String, Value>,
        subject: &Resource,
        graph: &GraphLabel,
        dataset: &mut Dataset,
    ) -> Result<()> {
        let generalized = self.options.produce_generalized_rdf;

        let mut properties: Vec<&String> = node.keys().collect();
        properties.sort();
        for property in properties {
            let values = as_slice(&node[property.as_str()]);

            if property == kw::TYPE {
                // Step 1.3.2.1
                for t in values.iter().filter_map(Value::as_str) {
                    if is_blank_node_id(t) && !generalized {
                        continue;
                    }
                    if let Some(object) = resource(t) {
                        dataset.add(Quad::new(subject.clone(), NamedNode::new(rdf::TYPE), object, graph.clone()));
                    }
                }
                continue;
            }

            // Step 1.3.2.2-1.3.2.4
            if is_keyword(property) || (is_blank_node_id(property) && !generalized) {
                continue;
            }
            let Some(predicate) = resource(property) else {
                continue;
            };

            // Step 1.3.2.5
            for item in values {
                let mut list_triples = Triples::new();
                if let Some(object) = self.object_to_rdf(item, &mut list_triples)? {
                    dataset.add(Quad::new(subject.clone(), predicate.clone(), object, graph.clone()));
                }
                for (s, p, o) in list_triples {
                    dataset.add(Quad::new(s, p, o, graph.clone()));
                }
            }
        }
        Ok(())
    }

    /// Object to RDF conversion. `None` for values that have no RDF form.
    fn object_to_rdf(&mut self, item: &Value, triples: &mut Triples) -> Result<Option<Object>> {
        // Step 1-2
        if json::is_node_object(item) {
            return Ok(json::id_of(item).and_then(resource).map(Object::from));
        }

        // Step 3
        if let Some(list) = item.get(kw::LIST) {
            return self.list_to_rdf(as_slice(list), triples).map(Some);
        }

        // Step 4
        let Some(value) = item.get(kw::VALUE) else {
            return Ok(None);
        };

        // Step 5-6
        let mut datatype = item.get(kw::TYPE).and_then(Value::as_str).map(str::to_string);
        if let Some(t) = &datatype
            && t != kw::JSON
            && !is_absolute(t)
        {
            return Ok(None);
        }

        // Step 7
        let tag = match item.get(kw::LANGUAGE) {
            None => None,
            Some(Value::String(tag)) if language::is_well_formed(tag) => Some(tag.to_lowercase()),
            Some(tag) => {
                tracing::warn!(%tag, "dropping literal with a malformed language tag");
                return Ok(None);
            }
        };

        // Step 8-12
        let lexical = if datatype.as_deref() == Some(kw::JSON) {
            datatype = Some(rdf::JSON.to_string());
            serde_json_canonicalizer::to_string(value).map_err(|e| JsonLdError::new(ErrorCode::InvalidJsonLiteral, e))?
        } else {
            match value {
                Value::Bool(b) => {
                    datatype.get_or_insert_with(|| xsd::BOOLEAN.to_string());
                    b.to_string()
                }
                Value::Number(number) => {
                    let (lexical, default_type) = lexical_form(number, datatype.as_deref());
                    datatype.get_or_insert_with(|| default_type.to_string());
                    lexical
                }
                Value::String(s) => {
                    if datatype.is_none() {
                        datatype = Some(if tag.is_some() { rdf::LANG_STRING } else { xsd::STRING }.to_string());
                    }
                    s.clone()
                }
                _ => return Ok(None),
            }
        };

        // Step 13
        if let Some(direction) = item.get(kw::DIRECTION).and_then(Value::as_str)
            && let Some(strategy) = self.options.rdf_direction
        {
            let tag = tag.unwrap_or_default();
            return Ok(Some(match strategy {
                RdfDirection::I18nDatatype => Object::Literal(Literal::typed(
                    lexical,
                    NamedNode::new(format!("{I18N_BASE}{tag}_{direction}")),
                )),
                RdfDirection::CompoundLiteral => {
                    let node = BlankNode::from_identifier(&self.issuer.fresh());
                    let subject = Resource::Blank(node.clone());
                    triples.push((subject.clone(), NamedNode::new(rdf::VALUE).into(), Literal::new(lexical).into()));
                    if !tag.is_empty() {
                        triples.push((subject.clone(), NamedNode::new(rdf::LANGUAGE).into(), Literal::new(tag).into()));
                    }
                    triples.push((subject, NamedNode::new(rdf::DIRECTION).into(), Literal::new(direction).into()));
                    Object::Blank(node)
                }
            }));
        }

        // Step 14
        Ok(Some(Object::Literal(match tag {
            Some(tag) => Literal::lang(lexical, tag),
            None => Literal::typed(lexical, NamedNode::new(datatype.unwrap_or_else(|| xsd::STRING.to_string()))),
        })))
    }

    /// List to RDF conversion: a chain of `rdf:first`/`rdf:rest` blank nodes ending in `rdf:nil`.
    fn list_to_rdf(&mut self, list: &[Value], triples: &mut Triples) -> Result<Object> {
        // Step 1
        if list.is_empty() {
            return Ok(Object::Named(NamedNode::new(rdf::NIL)));
        }

        // Step 2
        let nodes: Vec<BlankNode> = list.iter().map(|_| BlankNode::from_identifier(&self.issuer.fresh())).collect();

        // Step 3
        for (index, item) in list.iter().enumerate() {
            let subject = Resource::Blank(nodes[index].clone());
            let mut embedded = Triples::new();
            if let Some(object) = self.object_to_rdf(item, &mut embedded)? {
                triples.push((subject.clone(), NamedNode::new(rdf::FIRST).into(), object));
            }
            let rest = match nodes.get(index + 1) {
                Some(next) => Object::Blank(next.clone()),
                None => Object::Named(NamedNode::new(rdf::NIL)),
            };
            triples.push((subject, NamedNode::new(rdf::REST).into(), rest));
            triples.extend(embedded);
        }

        // Step 4
        Ok(Object::Blank(nodes[0].clone()))
    }
}
