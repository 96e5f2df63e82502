//! Value Expansion: turns a scalar into a value object or node reference
//! according to the term definition of its property.

use serde_json::{Map, Value};

use crate::context::ActiveContext;
use crate::error::Result;
use crate::keywords as kw;

/// Expands `value`, the value of `active_property`, into its expanded form.
pub fn expand_value(active: &ActiveContext, active_property: &str, value: &Value) -> Result<Value> {
    let definition = active.term(active_property);
    let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());

    // Step 1-2
    if let Value::String(s) = value {
        let expanded = match type_mapping {
            Some(kw::ID) => Some(active.expand_iri(s, true, false)?),
            Some(kw::VOCAB) => Some(active.expand_iri(s, true, true)?),
            _ => None,
        };
        if let Some(id) = expanded {
            let mut node = Map::new();
            node.insert(kw::ID.to_string(), id.map_or(Value::Null, Value::String));
            return Ok(Value::Object(node));
        }
    }

    // Step 3
    let mut result = Map::new();
    result.insert(kw::VALUE.to_string(), value.clone());

    // Step 4
    if let Some(type_mapping) = type_mapping
        && !matches!(type_mapping, kw::ID | kw::VOCAB | kw::NONE)
    {
        result.insert(kw::TYPE.to_string(), Value::String(type_mapping.to_string()));
    } else if value.is_string() {
        // Step 5
        let language = match definition.and_then(|d| d.language.as_ref()) {
            Some(language) => language.clone(),
            None => active.default_language.clone(),
        };
        let direction = match definition.and_then(|d| d.direction) {
            Some(direction) => direction,
            None => active.default_direction,
        };
        if let Some(language) = language {
            result.insert(kw::LANGUAGE.to_string(), Value::String(language));
        }
        if let Some(direction) = direction {
            result.insert(kw::DIRECTION.to_string(), Value::String(direction.to_string()));
        }
    }

    Ok(Value::Object(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Direction, TermDefinition};
    use crate::options::ProcessingMode;
    use serde_json::json;

    fn context() -> ActiveContext {
        let mut ctx = ActiveContext::new(Some("http://example.org/".into()), ProcessingMode::JsonLd11);
        ctx.default_language = Some("en".into());
        ctx.set_term(
            "link",
            TermDefinition {
                iri: Some("http://example.org/link".into()),
                type_mapping: Some("@id".into()),
                ..Default::default()
            },
        );
        ctx.set_term(
            "date",
            TermDefinition {
                iri: Some("http://example.org/date".into()),
                type_mapping: Some("http://www.w3.org/2001/XMLSchema#date".into()),
                ..Default::default()
            },
        );
        ctx.set_term(
            "code",
            TermDefinition {
                iri: Some("http://example.org/code".into()),
                language: Some(None),
                direction: Some(Some(Direction::Ltr)),
                ..Default::default()
            },
        );
        ctx
    }

    #[test]
    fn node_reference_for_id_type() {
        let ctx = context();
        assert_eq!(expand_value(&ctx, "link", &json!("page")).unwrap(), json!({"@id": "http://example.org/page"}));
    }

    #[test]
    fn typed_and_language_values() {
        let ctx = context();
        assert_eq!(
            expand_value(&ctx, "date", &json!("2024-01-01")).unwrap(),
            json!({"@value": "2024-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"})
        );
        assert_eq!(expand_value(&ctx, "other", &json!("hi")).unwrap(), json!({"@value": "hi", "@language": "en"}));
        assert_eq!(expand_value(&ctx, "code", &json!("x")).unwrap(), json!({"@value": "x", "@direction": "ltr"}));
        assert_eq!(expand_value(&ctx, "other", &json!(5)).unwrap(), json!({"@value": 5}));
    }
}
