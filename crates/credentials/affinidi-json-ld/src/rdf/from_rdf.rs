//! Serialize RDF as JSON-LD: builds expanded JSON-LD from a [`Dataset`],
//! folding `rdf:first`/`rdf:rest` chains back into `@list` objects.

use std::collections::HashMap;

use indexmap::IndexSet;
use serde_json::{Map, Number, Value};

use crate::error::{ErrorCode, JsonLdError, Result};
use crate::flattening::{Graph, NodeMap, graph_nodes};
use crate::iri::is_blank_node_id;
use crate::json::{self, as_slice, merge_value};
use crate::keywords as kw;
use crate::language;
use crate::model::{Dataset, I18N_BASE, Literal, Object, rdf, xsd};
use crate::options::{JsonLdOptions, RdfDirection};

/// Where a blank node or `rdf:nil` is used as an object.
#[derive(Clone, Debug)]
struct Usage {
    subject: String,
    property: String,
    value: Value,
}

/// Converts an RDF dataset to an expanded JSON-LD document.
pub fn from_rdf(dataset: &Dataset, options: &JsonLdOptions) -> Result<Vec<Value>> {
    let mut graph_map = NodeMap::new();
    graph_map.insert(kw::DEFAULT.to_string(), Graph::new());

    // `None` once a blank node is referenced more than once.
    let mut referenced_once: HashMap<String, Option<Usage>> = HashMap::new();
    let mut nil_usages: HashMap<String, Vec<Usage>> = HashMap::new();
    let mut compound_subjects: HashMap<String, IndexSet<String>> = HashMap::new();
    let compound = options.rdf_direction == Some(RdfDirection::CompoundLiteral);

    // Step 5
    for quad in dataset.iter() {
        let graph_name = quad.graph.identifier();
        if graph_name != kw::DEFAULT
            && let Some(default_graph) = graph_map.get_mut(kw::DEFAULT)
        {
            node_entry(default_graph, &graph_name);
        }
        let graph = graph_map.entry(graph_name.clone()).or_default();

        let subject = quad.subject.identifier();
        let predicate = quad.predicate.identifier();
        node_entry(graph, &subject);

        if compound && predicate == rdf::DIRECTION {
            compound_subjects.entry(graph_name.clone()).or_default().insert(subject.clone());
        }

        let object_id = match &quad.object {
            Object::Named(n) => Some(n.iri.clone()),
            Object::Blank(b) => Some(b.identifier()),
            Object::Literal(_) => None,
        };
        if let Some(id) = &object_id {
            node_entry(graph, id);
        }

        if predicate == rdf::TYPE
            && !options.use_rdf_type
            && let Some(id) = object_id
        {
            merge_value(node_entry(graph, &subject), kw::TYPE, Value::String(id));
            continue;
        }

        let value = object_to_json(&quad.object, options)?;
        merge_value(node_entry(graph, &subject), &predicate, value.clone());

        let usage = Usage {
            subject,
            property: predicate,
            value,
        };
        match &quad.object {
            Object::Named(n) if n.iri == rdf::NIL => {
                nil_usages.entry(graph_name).or_default().push(usage);
            }
            Object::Blank(b) => {
                let id = b.identifier();
                if let Some(entry) = referenced_once.get_mut(&id) {
                    *entry = None;
                } else {
                    referenced_once.insert(id, Some(usage));
                }
            }
            _ => {}
        }
    }

    // Step 6
    for (graph_name, graph) in graph_map.iter_mut() {
        if let Some(subjects) = compound_subjects.get(graph_name) {
            fold_compound_literals(graph, subjects, &referenced_once)?;
        }
        if let Some(usages) = nil_usages.get(graph_name) {
            fold_lists(graph, usages, &referenced_once);
        }
    }

    // Step 7-8
    let default_graph = graph_map.shift_remove(kw::DEFAULT).unwrap_or_default();
    let mut subjects: Vec<&String> = default_graph.keys().collect();
    if options.ordered {
        subjects.sort();
    }

    let mut result = Vec::new();
    for subject in subjects {
        let Some(node) = default_graph.get(subject) else {
            continue;
        };
        let mut node = node.clone();
        if let Some(graph) = graph_map.get(subject) {
            node.insert(kw::GRAPH.to_string(), Value::Array(graph_nodes(graph, options.ordered)));
        }
        if node.len() == 1 && node.contains_key(kw::ID) {
            continue;
        }
        result.push(Value::Object(node));
    }

    tracing::debug!(quads = dataset.len(), nodes = result.len(), "converted RDF to JSON-LD");
    Ok(result)
}

fn node_entry<'g>(graph: &'g mut Graph, id: &str) -> &'g mut Map<String, Value> {
    graph.entry(id.to_string()).or_insert_with(|| {
        let mut node = Map::new();
        node.insert(kw::ID.to_string(), Value::String(id.to_string()));
        node
    })
}

/// Replaces references to compound literal nodes with the value objects they describe.
fn fold_compound_literals(
    graph: &mut Graph,
    subjects: &IndexSet<String>,
    referenced_once: &HashMap<String, Option<Usage>>,
) -> Result<()> {
    for cl in subjects {
        let Some(Some(usage)) = referenced_once.get(cl) else {
            continue;
        };
        let Some(cl_node) = graph.shift_remove(cl) else {
            continue;
        };

        let first_value = |property: &str| {
            cl_node
                .get(property)
                .and_then(|values| as_slice(values).first())
                .and_then(|value| value.get(kw::VALUE))
                .cloned()
        };

        let mut literal = Map::new();
        if let Some(value) = first_value(rdf::VALUE) {
            literal.insert(kw::VALUE.to_string(), value);
        }
        if let Some(tag) = first_value(rdf::LANGUAGE) {
            match tag.as_str() {
                Some(t) if language::is_well_formed(t) => {
                    literal.insert(kw::LANGUAGE.to_string(), tag);
                }
                _ => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidLanguageTaggedString,
                        format!("compound literal {cl} has language {tag}"),
                    ));
                }
            }
        }
        if let Some(direction) = first_value(rdf::DIRECTION) {
            match direction.as_str() {
                Some("ltr" | "rtl") => {
                    literal.insert(kw::DIRECTION.to_string(), direction);
                }
                _ => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidBaseDirection,
                        format!("compound literal {cl} has direction {direction}"),
                    ));
                }
            }
        }

        if let Some(node) = graph.get_mut(&usage.subject)
            && let Some(Value::Array(items)) = node.get_mut(&usage.property)
        {
            for item in items.iter_mut().filter(|item| json::id_of(item) == Some(cl.as_str())) {
                *item = Value::Object(literal.clone());
            }
        }
    }
    Ok(())
}

/// Walks every chain ending in `rdf:nil` backwards and replaces its head with an `@list`.
fn fold_lists(graph: &mut Graph, usages: &[Usage], referenced_once: &HashMap<String, Option<Usage>>) {
    for usage in usages {
        let mut subject = usage.subject.clone();
        let mut property = usage.property.clone();
        let mut head = usage.value.clone();
        let mut list = Vec::new();
        let mut list_nodes = Vec::new();

        while property == rdf::REST && is_blank_node_id(&subject) {
            let Some(Some(node_usage)) = referenced_once.get(&subject) else {
                break;
            };
            let Some(item) = graph.get(&subject).and_then(list_item) else {
                break;
            };
            list.push(item.clone());
            list_nodes.push(subject);

            subject = node_usage.subject.clone();
            property = node_usage.property.clone();
            head = node_usage.value.clone();
        }

        list.reverse();
        if let Some(node) = graph.get_mut(&subject)
            && let Some(Value::Array(items)) = node.get_mut(&property)
            && let Some(slot) = items.iter_mut().find(|item| **item == head)
        {
            *slot = single(kw::LIST, Value::Array(list));
        }
        for id in &list_nodes {
            graph.shift_remove(id);
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// The `rdf:first` value of a well-formed list node: one `rdf:first`, one
/// `rdf:rest`, and nothing else but an optional `@type` of `rdf:List`.
fn list_item(node: &Map<String, Value>) -> Option<&Value> {
    let first = as_slice(node.get(rdf::FIRST)?);
    let rest = as_slice(node.get(rdf::REST)?);
    if first.len() != 1 || rest.len() != 1 {
        return None;
    }
    let well_formed = match node.len() {
        3 => true,
        4 => node.get(kw::TYPE).is_some_and(|t| as_slice(t) == [Value::String(rdf::LIST.to_string())]),
        _ => false,
    };
    well_formed.then(|| &first[0])
}

/// RDF to Object conversion.
fn object_to_json(object: &Object, options: &JsonLdOptions) -> Result<Value> {
    let literal = match object {
        Object::Named(n) => return Ok(single(kw::ID, Value::String(n.iri.clone()))),
        Object::Blank(b) => return Ok(single(kw::ID, Value::String(b.identifier()))),
        Object::Literal(literal) => literal,
    };
    literal_to_json(literal, options)
}

fn literal_to_json(literal: &Literal, options: &JsonLdOptions) -> Result<Value> {
    let lexical = literal.value.as_str();
    let datatype = literal.datatype.iri.as_str();
    let mut result = Map::new();
    let mut converted = Value::String(lexical.to_string());
    let mut type_ = None;

    if options.use_native_types && matches!(datatype, xsd::BOOLEAN | xsd::INTEGER | xsd::DOUBLE) {
        match native_value(lexical, datatype) {
            Some(value) => converted = value,
            None => type_ = Some(datatype.to_string()),
        }
    } else if !options.is_json_ld_10() && datatype == rdf::JSON {
        converted = serde_json::from_str(lexical)
            .map_err(|e| JsonLdError::new(ErrorCode::InvalidJsonLiteral, format!("{lexical}: {e}")))?;
        type_ = Some(kw::JSON.to_string());
    } else if options.rdf_direction == Some(RdfDirection::I18nDatatype)
        && let Some(suffix) = datatype.strip_prefix(I18N_BASE)
    {
        let (tag, direction) = suffix.split_once('_').unwrap_or((suffix, ""));
        if !tag.is_empty() {
            language::check(tag);
            result.insert(kw::LANGUAGE.to_string(), Value::String(tag.to_string()));
        }
        if !direction.is_empty() {
            result.insert(kw::DIRECTION.to_string(), Value::String(direction.to_string()));
        }
    } else if let Some(tag) = &literal.language {
        result.insert(kw::LANGUAGE.to_string(), Value::String(tag.clone()));
    } else if datatype != xsd::STRING {
        type_ = Some(datatype.to_string());
    }

    result.insert(kw::VALUE.to_string(), converted);
    if let Some(type_) = type_ {
        result.insert(kw::TYPE.to_string(), Value::String(type_));
    }
    Ok(Value::Object(result))
}

/// Native JSON form of `xsd:boolean`, `xsd:integer` and `xsd:double` literals.
/// `None` for other datatypes and for lexical forms that do not parse.
fn native_value(lexical: &str, datatype: &str) -> Option<Value> {
    match datatype {
        xsd::BOOLEAN => match lexical {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        xsd::INTEGER => {
            let digits = lexical.strip_prefix(['+', '-']).unwrap_or(lexical);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            lexical.trim_start_matches('+').parse::<i64>().ok().map(Value::from)
        }
        xsd::DOUBLE => {
            let valid = lexical.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
            if !valid {
                return None;
            }
            lexical.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nquads;
    use serde_json::json;

    fn convert(input: &str, options: &JsonLdOptions) -> Result<Vec<Value>> {
        let dataset = nquads::parse(input).unwrap();
        from_rdf(&dataset, &options.clone().with_ordered(true))
    }

    #[test]
    fn collections_become_lists() {
        let input = "\
<http://example.org/s> <http://example.org/p> _:l0 .
_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"a\" .
_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> _:l1 .
_:l1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"b\" .
_:l1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .
";
        let output = convert(input, &JsonLdOptions::default()).unwrap();
        assert_eq!(
            output,
            vec![json!({
                "@id": "http://example.org/s",
                "http://example.org/p": [{"@list": [{"@value": "a"}, {"@value": "b"}]}]
            })]
        );
    }

    #[test]
    fn shared_list_nodes_stay_expanded() {
        let input = "\
<http://example.org/s> <http://example.org/p> _:l0 .
<http://example.org/t> <http://example.org/p> _:l0 .
_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#first> \"a\" .
_:l0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#rest> <http://www.w3.org/1999/02/22-rdf-syntax-ns#nil> .
";
        let output = convert(input, &JsonLdOptions::default()).unwrap();
        assert_eq!(output.len(), 3);
        assert_eq!(
            output[0],
            json!({
                "@id": "_:l0",
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#first": [{"@value": "a"}],
                "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest": [{"@list": []}]
            })
        );
    }

    #[test]
    fn types_and_native_values() {
        let input = "\
<http://example.org/s> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/T> .
<http://example.org/s> <http://example.org/n> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://example.org/s> <http://example.org/b> \"true\"^^<http://www.w3.org/2001/XMLSchema#boolean> .
<http://example.org/s> <http://example.org/x> \"abc\"^^<http://www.w3.org/2001/XMLSchema#integer> .
";
        let typed = convert(input, &JsonLdOptions::default()).unwrap();
        assert_eq!(typed[0]["@type"], json!(["http://example.org/T"]));
        assert_eq!(
            typed[0]["http://example.org/n"],
            json!([{"@value": "42", "@type": "http://www.w3.org/2001/XMLSchema#integer"}])
        );

        let native = convert(input, &JsonLdOptions::default().with_use_native_types(true)).unwrap();
        assert_eq!(native[0]["http://example.org/n"], json!([{"@value": 42}]));
        assert_eq!(native[0]["http://example.org/b"], json!([{"@value": true}]));
        assert_eq!(
            native[0]["http://example.org/x"],
            json!([{"@value": "abc", "@type": "http://www.w3.org/2001/XMLSchema#integer"}])
        );

        let rdf_type = convert(input, &JsonLdOptions::default().with_use_rdf_type(true)).unwrap();
        assert_eq!(
            rdf_type[0]["http://www.w3.org/1999/02/22-rdf-syntax-ns#type"],
            json!([{"@id": "http://example.org/T"}])
        );
    }

    #[test]
    fn json_literals() {
        let valid = "<http://example.org/s> <http://example.org/p> \"{\\\"a\\\":1}\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON> .\n";
        let output = convert(valid, &JsonLdOptions::default()).unwrap();
        assert_eq!(output[0]["http://example.org/p"], json!([{"@value": {"a": 1}, "@type": "@json"}]));

        let invalid = "<http://example.org/s> <http://example.org/p> \"{a\"^^<http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON> .\n";
        let err = convert(invalid, &JsonLdOptions::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidJsonLiteral);
    }

    #[test]
    fn compound_literals() {
        let input = "\
<http://example.org/s> <http://example.org/p> _:c .
_:c <http://www.w3.org/1999/02/22-rdf-syntax-ns#value> \"hello\" .
_:c <http://www.w3.org/1999/02/22-rdf-syntax-ns#language> \"en\" .
_:c <http://www.w3.org/1999/02/22-rdf-syntax-ns#direction> \"ltr\" .
";
        let options = JsonLdOptions::default().with_rdf_direction(RdfDirection::CompoundLiteral);
        let output = convert(input, &options).unwrap();
        assert_eq!(
            output,
            vec![json!({
                "@id": "http://example.org/s",
                "http://example.org/p": [{"@value": "hello", "@language": "en", "@direction": "ltr"}]
            })]
        );

        let bad = input.replace("\"ltr\"", "\"up\"");
        assert_eq!(convert(&bad, &options).unwrap_err().code(), ErrorCode::InvalidBaseDirection);
    }

    #[test]
    fn i18n_datatypes() {
        let input = "<http://example.org/s> <http://example.org/p> \"hi\"^^<https://www.w3.org/ns/i18n#en_rtl> .\n";
        let options = JsonLdOptions::default().with_rdf_direction(RdfDirection::I18nDatatype);
        let output = convert(input, &options).unwrap();
        assert_eq!(
            output[0]["http://example.org/p"],
            json!([{"@language": "en", "@direction": "rtl", "@value": "hi"}])
        );
    }

    #[test]
    fn named_graphs() {
        let input = "<http://example.org/s> <http://example.org/p> \"v\" <http://example.org/g> .\n";
        let output = convert(input, &JsonLdOptions::default()).unwrap();
        assert_eq!(
            output,
            vec![json!({
                "@id": "http://example.org/g",
                "@graph": [{"@id": "http://example.org/s", "http://example.org/p": [{"@value": "v"}]}]
            })]
        );
    }
}
