//! Frame matching: decides which node objects a frame selects.

use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};
use crate::flattening::Graph;
use crate::iri::{is_absolute, is_blank_node_id};
use crate::json::{self, as_slice};
use crate::keywords::{self as kw, is_keyword};

/// Checks that `frame` is a single map with IRI or wildcard `@id`/`@type` values.
pub(crate) fn validate_frame(frame: &Value) -> Result<&Map<String, Value>> {
    let frame = match frame {
        Value::Array(items) if items.len() == 1 => &items[0],
        Value::Array(_) => return Err(JsonLdError::invalid_frame("a frame must be a single object")),
        other => other,
    };
    let Value::Object(frame) = frame else {
        return Err(JsonLdError::invalid_frame(format!("a frame must be an object, found {frame}")));
    };

    for key in [kw::ID, kw::TYPE] {
        let Some(values) = frame.get(key) else {
            continue;
        };
        for value in as_slice(values) {
            let valid = match value {
                Value::Object(_) => true,
                Value::String(s) => is_absolute(s) && !is_blank_node_id(s),
                _ => false,
            };
            if !valid {
                return Err(JsonLdError::invalid_frame(format!("{key} in a frame must be an IRI or a wildcard, found {value}")));
            }
        }
    }
    Ok(frame)
}

/// Whether `subject` satisfies `frame`.
///
/// `subjects` is the graph node references are resolved against when a frame
/// property describes the referenced node.
pub(crate) fn filter_subject(subjects: &Graph, subject: &Map<String, Value>, frame: &Map<String, Value>, require_all: bool) -> Result<bool> {
    let mut wildcard = true;
    let mut matches_some = false;

    for (key, frame_values) in frame {
        let node_values = subject.get(key).map(as_slice).unwrap_or_default();
        let frame_values = as_slice(frame_values);
        let match_this;

        if key == kw::ID {
            match_this = match frame_values.first() {
                Some(first) if json::is_empty_object(first) => true,
                None => true,
                _ => node_values.first().is_some_and(|id| frame_values.contains(id)),
            };
            if !require_all {
                return Ok(match_this);
            }
        } else if key == kw::TYPE {
            wildcard = false;
            if frame_values.is_empty() {
                if !node_values.is_empty() {
                    return Ok(false);
                }
                match_this = true;
            } else if frame_values.len() == 1 && json::is_empty_object(&frame_values[0]) {
                match_this = !node_values.is_empty();
            } else {
                match_this = frame_values.iter().any(|t| {
                    t.as_object().is_some_and(|t| t.contains_key(kw::DEFAULT)) || node_values.contains(t)
                });
                if !require_all {
                    return Ok(match_this);
                }
            }
        } else if is_keyword(key) {
            continue;
        } else {
            let this_frame = frame_values.first();
            let has_default = match this_frame {
                Some(this_frame) => validate_frame(this_frame)?.contains_key(kw::DEFAULT),
                None => false,
            };
            wildcard = false;

            if node_values.is_empty() && has_default {
                continue;
            }
            if !node_values.is_empty() && frame_values.is_empty() {
                return Ok(false);
            }

            match_this = match this_frame {
                None => node_values.is_empty(),
                Some(this_frame) if json::is_list_object(this_frame) => {
                    let pattern = this_frame.get(kw::LIST).and_then(|l| as_slice(l).first());
                    let node_list = node_values.first().filter(|v| json::is_list_object(v)).and_then(|v| v.get(kw::LIST));
                    match (pattern, node_list) {
                        (Some(pattern), Some(list)) if json::is_value_object(pattern) => {
                            as_slice(list).iter().any(|item| value_match(pattern, item))
                        }
                        (Some(pattern), Some(list)) if json::is_node_object(pattern) || json::is_node_reference(pattern) => {
                            let mut found = false;
                            for item in as_slice(list) {
                                if node_match(subjects, pattern, item, require_all)? {
                                    found = true;
                                    break;
                                }
                            }
                            found
                        }
                        _ => false,
                    }
                }
                Some(this_frame) if json::is_value_object(this_frame) => {
                    node_values.iter().any(|value| value_match(this_frame, value))
                }
                Some(this_frame) if is_id_pattern(this_frame) => {
                    let mut found = false;
                    for value in node_values {
                        if node_match(subjects, this_frame, value, require_all)? {
                            found = true;
                            break;
                        }
                    }
                    found
                }
                Some(Value::Object(_)) => !node_values.is_empty(),
                Some(_) => false,
            };
        }

        if !match_this && require_all {
            return Ok(false);
        }
        matches_some = matches_some || match_this;
    }

    Ok(wildcard || matches_some)
}

/// A frame that only names `@id`.
fn is_id_pattern(frame: &Value) -> bool {
    frame.as_object().is_some_and(|m| m.len() == 1 && m.contains_key(kw::ID))
}

fn node_match(subjects: &Graph, pattern: &Value, value: &Value, require_all: bool) -> Result<bool> {
    let (Some(id), Some(pattern)) = (json::id_of(value), pattern.as_object()) else {
        return Ok(false);
    };
    match subjects.get(id) {
        Some(node) => filter_subject(subjects, node, pattern, require_all),
        None => Ok(false),
    }
}

/// Matches a value object against a value pattern with optional `@value`,
/// `@type` and `@language` constraints, where `{}` is a wildcard.
pub(crate) fn value_match(pattern: &Value, value: &Value) -> bool {
    let constraint = |key: &str| pattern.get(key).map(as_slice).unwrap_or_default();
    let v2 = constraint(kw::VALUE);
    let t2 = constraint(kw::TYPE);
    let l2 = constraint(kw::LANGUAGE);
    if v2.is_empty() && t2.is_empty() && l2.is_empty() {
        return true;
    }

    let is_wildcard = |values: &[Value]| values.first().is_some_and(json::is_empty_object);

    let v1 = value.get(kw::VALUE);
    if !(v1.is_some_and(|v| v2.contains(v)) || is_wildcard(v2)) {
        return false;
    }

    let t1 = value.get(kw::TYPE);
    let type_ok = match t1 {
        None => t2.is_empty(),
        Some(t) => t2.contains(t) || is_wildcard(t2),
    };
    if !type_ok {
        return false;
    }

    let l1 = value.get(kw::LANGUAGE).and_then(Value::as_str);
    match l1 {
        None => l2.is_empty(),
        Some(l) => is_wildcard(l2) || l2.iter().filter_map(Value::as_str).any(|p| p.eq_ignore_ascii_case(l)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(validate_frame(&json!([{}, {}])).is_err());
        assert!(validate_frame(&json!("frame")).is_err());
        assert!(validate_frame(&json!([{"@id": ["_:b0"]}])).is_err());
        assert!(validate_frame(&json!([{"@type": ["relative"]}])).is_err());
        assert!(validate_frame(&json!([{"@type": [{}]}])).is_ok());
    }

    #[test]
    fn type_matching() {
        let graph = Graph::new();
        let person = node(json!({"@id": "http://example.org/a", "@type": ["http://example.org/Person"]}));
        let untyped = node(json!({"@id": "http://example.org/b"}));

        let by_type = node(json!({"@type": ["http://example.org/Person"]}));
        assert!(filter_subject(&graph, &person, &by_type, false).unwrap());
        assert!(!filter_subject(&graph, &untyped, &by_type, false).unwrap());

        let any_type = node(json!({"@type": [{}]}));
        assert!(filter_subject(&graph, &person, &any_type, false).unwrap());
        assert!(!filter_subject(&graph, &untyped, &any_type, false).unwrap());

        let no_type = node(json!({"@type": []}));
        assert!(!filter_subject(&graph, &person, &no_type, false).unwrap());
        assert!(filter_subject(&graph, &untyped, &no_type, false).unwrap());
    }

    #[test]
    fn duck_typing_and_require_all() {
        let graph = Graph::new();
        let subject = node(json!({
            "@id": "http://example.org/a",
            "http://example.org/name": [{"@value": "Alice"}]
        }));
        let frame = node(json!({"http://example.org/name": [{}], "http://example.org/age": [{}]}));
        assert!(filter_subject(&graph, &subject, &frame, false).unwrap());
        assert!(!filter_subject(&graph, &subject, &frame, true).unwrap());

        let with_default = node(json!({
            "http://example.org/name": [{}],
            "http://example.org/age": [{"@default": {"@value": 0}}]
        }));
        assert!(filter_subject(&graph, &subject, &with_default, true).unwrap());
    }

    #[test]
    fn value_patterns() {
        let value = json!({"@value": "chat", "@language": "FR"});
        assert!(value_match(&json!({}), &value));
        assert!(value_match(&json!({"@value": [{}], "@language": ["fr"]}), &value));
        assert!(!value_match(&json!({"@value": [{}], "@language": ["en"]}), &value));
        assert!(!value_match(&json!({"@type": [{}]}), &value));
    }
}
