/*!
 * JSON-LD 1.1 Compaction.
 *
 * Applies a context to an expanded document, choosing terms, compact IRIs
 * and container shapes that the context allows. Compaction is the inverse of
 * expansion: expanding the compacted output yields the original input.
 */

pub mod iri;
pub mod value;

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::context::{ActiveContext, Container, ContextFlags, process_context};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::json::{self, add_value};
use crate::keywords as kw;
use crate::options::JsonLdOptions;

/// Runs the compaction algorithms with a fixed set of options.
pub struct Compactor<'a> {
    pub options: &'a JsonLdOptions,
}

impl<'a> Compactor<'a> {
    pub fn new(options: &'a JsonLdOptions) -> Self {
        Compactor { options }
    }

    fn process(&self, active: &ActiveContext, local: &Value, base_url: Option<&str>, flags: ContextFlags) -> Result<ActiveContext> {
        process_context(active, local, base_url, &mut Vec::new(), flags, self.options)
    }

    /// Compacts `element`, the expanded value of `active_property`.
    pub fn compact(&self, active: &ActiveContext, active_property: Option<&str>, element: &Value) -> Result<Value> {
        match element {
            // Step 2
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(element.clone()),

            // Step 3
            Value::Array(items) => {
                let mut result = Vec::new();
                for item in items {
                    let compacted = self.compact(active, active_property, item)?;
                    if !compacted.is_null() {
                        result.push(compacted);
                    }
                }
                let keep_array = result.len() != 1
                    || !self.options.compact_arrays
                    || matches!(active_property, Some(kw::GRAPH) | Some(kw::SET))
                    || active_property.is_some_and(|p| {
                        active.has_container(p, Container::List) || active.has_container(p, Container::Set)
                    });
                if keep_array {
                    return Ok(Value::Array(result));
                }
                Ok(result.into_iter().next().unwrap_or(Value::Null))
            }

            Value::Object(map) => self.compact_map(active, active_property, map),
        }
    }

    fn compact_map(&self, active: &ActiveContext, active_property: Option<&str>, element: &Map<String, Value>) -> Result<Value> {
        // Step 1
        let type_scoped = active;
        let mut active = Cow::Borrowed(active);

        // Step 5
        if let Some(previous) = active.previous_context.clone() {
            let node_reference = element.len() == 1 && element.contains_key(kw::ID);
            if !element.contains_key(kw::VALUE) && !node_reference {
                active = Cow::Owned((*previous).clone());
            }
        }

        // Step 6
        let property_scoped = active_property
            .and_then(|p| type_scoped.term(p))
            .and_then(|d| d.context.clone().map(|c| (c, d.base_url.clone())));
        if let Some((context, base)) = property_scoped {
            let flags = ContextFlags {
                override_protected: true,
                ..Default::default()
            };
            active = Cow::Owned(self.process(&active, &context, base.as_deref(), flags)?);
        }

        // Step 7
        if element.contains_key(kw::VALUE) || (element.contains_key(kw::ID) && element.keys().all(|k| k == kw::ID || k == kw::INDEX))
        {
            let result = self.compact_value(&active, active_property, element)?;
            let json_typed = active_property
                .and_then(|p| active.term(p))
                .and_then(|d| d.type_mapping.as_deref())
                == Some(kw::JSON);
            if json::is_scalar(&result) || json_typed {
                return Ok(result);
            }
        }

        // Step 8
        if let Some(list) = element.get(kw::LIST)
            && let Some(property) = active_property
            && active.has_container(property, Container::List)
        {
            return self.compact(&active, active_property, list);
        }

        // Step 9-10
        let inside_reverse = active_property == Some(kw::REVERSE);
        let mut result = Map::new();

        // Step 11
        if let Some(types) = element.get(kw::TYPE) {
            let mut compacted_types = Vec::new();
            for t in json::as_slice(types).iter().filter_map(Value::as_str) {
                compacted_types.push(self.compact_iri(&active, t, None, true, false)?);
            }
            compacted_types.sort();
            for term in compacted_types {
                if let Some(definition) = type_scoped.term(&term)
                    && let Some(context) = &definition.context
                {
                    let flags = ContextFlags {
                        propagate: false,
                        ..Default::default()
                    };
                    active = Cow::Owned(self.process(&active, context, definition.base_url.as_deref(), flags)?);
                }
            }
        }

        // Step 12
        for expanded_property in json::keys(element, self.options.ordered) {
            let expanded_value = &element[expanded_property.as_str()];
            match expanded_property.as_str() {
                // Step 12.1
                kw::ID => {
                    let compacted = match expanded_value {
                        Value::String(id) => Value::String(self.compact_iri(&active, id, None, false, false)?),
                        other => other.clone(),
                    };
                    let alias = self.compact_iri(&active, kw::ID, None, true, false)?;
                    result.insert(alias, compacted);
                    continue;
                }
                // Step 12.2
                kw::TYPE => {
                    let mut compacted = Vec::new();
                    for t in json::as_slice(expanded_value) {
                        match t {
                            Value::String(t) => compacted.push(Value::String(self.compact_iri(type_scoped, t, None, true, false)?)),
                            other => compacted.push(other.clone()),
                        }
                    }
                    let compacted = if compacted.len() == 1 {
                        compacted.into_iter().next().unwrap_or(Value::Null)
                    } else {
                        Value::Array(compacted)
                    };
                    let alias = self.compact_iri(&active, kw::TYPE, None, true, false)?;
                    let as_array = (!active.is_json_ld_10() && active.has_container(&alias, Container::Set))
                        || !self.options.compact_arrays;
                    add_value(&mut result, &alias, compacted, as_array);
                    continue;
                }
                // Step 12.3
                kw::REVERSE => {
                    let compacted = self.compact(&active, Some(kw::REVERSE), expanded_value)?;
                    let mut remaining = Map::new();
                    if let Value::Object(compacted) = compacted {
                        for (property, value) in compacted {
                            if active.term(&property).is_some_and(|d| d.reverse) {
                                let as_array = active.has_container(&property, Container::Set) || !self.options.compact_arrays;
                                add_value(&mut result, &property, value, as_array);
                            } else {
                                remaining.insert(property, value);
                            }
                        }
                    }
                    if !remaining.is_empty() {
                        let alias = self.compact_iri(&active, kw::REVERSE, None, true, false)?;
                        result.insert(alias, Value::Object(remaining));
                    }
                    continue;
                }
                // Step 12.4
                kw::PRESERVE => {
                    let compacted = self.compact(&active, active_property, expanded_value)?;
                    if compacted.as_array().is_none_or(|a| !a.is_empty()) {
                        result.insert(kw::PRESERVE.to_string(), compacted);
                    }
                    continue;
                }
                // Step 12.5
                kw::INDEX if active_property.is_some_and(|p| active.has_container(p, Container::Index)) => continue,
                // Step 12.6
                kw::DIRECTION | kw::INDEX | kw::LANGUAGE | kw::VALUE => {
                    let alias = self.compact_iri(&active, &expanded_property, None, true, false)?;
                    result.insert(alias, expanded_value.clone());
                    continue;
                }
                _ => {}
            }

            // Step 12.7
            if expanded_value.as_array().is_some_and(Vec::is_empty) {
                let item_property = self.compact_iri(&active, &expanded_property, Some(expanded_value), true, inside_reverse)?;
                let target = self.nest_target(&active, &mut result, &item_property)?;
                add_value(target, &item_property, Value::Array(Vec::new()), true);
            }

            // Step 12.8
            for expanded_item in json::as_slice(expanded_value) {
                self.compact_item(&active, &expanded_property, expanded_item, inside_reverse, &mut result)?;
            }
        }

        Ok(Value::Object(result))
    }

    /// Step 12.8: compacts one value of `expanded_property` into `result`.
    fn compact_item(
        &self,
        active: &ActiveContext,
        expanded_property: &str,
        expanded_item: &Value,
        inside_reverse: bool,
        result: &mut Map<String, Value>,
    ) -> Result<()> {
        let item_property = self.compact_iri(active, expanded_property, Some(expanded_item), true, inside_reverse)?;
        let container = active.container(&item_property);
        let as_array = container.contains(&Container::Set)
            || item_property == kw::GRAPH
            || item_property == kw::LIST
            || !self.options.compact_arrays;

        let is_list = json::is_list_object(expanded_item);
        let is_graph = json::is_graph_object(expanded_item);
        let inner = if is_list {
            &expanded_item[kw::LIST]
        } else if is_graph {
            &expanded_item[kw::GRAPH]
        } else {
            expanded_item
        };
        let mut compacted_item = self.compact(active, Some(&item_property), inner)?;

        let target = self.nest_target(active, result, &item_property)?;

        if is_list {
            // Step 12.8.7
            let compacted_item = Value::Array(json::into_vec(compacted_item));
            if container.contains(&Container::List) {
                target.insert(item_property, compacted_item);
            } else {
                let mut wrapper = Map::new();
                wrapper.insert(self.compact_iri(active, kw::LIST, None, true, false)?, compacted_item);
                if let Some(index) = expanded_item.get(kw::INDEX) {
                    wrapper.insert(self.compact_iri(active, kw::INDEX, None, true, false)?, index.clone());
                }
                add_value(target, &item_property, Value::Object(wrapper), as_array);
            }
            return Ok(());
        }

        if is_graph {
            // Step 12.8.8
            let graph_container = container.contains(&Container::Graph);
            if graph_container && container.contains(&Container::Id) {
                let map_key = match expanded_item.get(kw::ID).and_then(Value::as_str) {
                    Some(id) => self.compact_iri(active, id, None, false, false)?,
                    None => self.compact_iri(active, kw::NONE, None, true, false)?,
                };
                let map_object = map_entry(target, &item_property)?;
                add_value(map_object, &map_key, compacted_item, as_array);
            } else if graph_container && container.contains(&Container::Index) && json::is_simple_graph_object(expanded_item) {
                let map_key = match expanded_item.get(kw::INDEX).and_then(Value::as_str) {
                    Some(index) => index.to_string(),
                    None => kw::NONE.to_string(),
                };
                let map_object = map_entry(target, &item_property)?;
                add_value(map_object, &map_key, compacted_item, as_array);
            } else if graph_container && json::is_simple_graph_object(expanded_item) {
                if compacted_item.as_array().is_some_and(|a| a.len() > 1) {
                    let mut included = Map::new();
                    included.insert(self.compact_iri(active, kw::INCLUDED, None, true, false)?, compacted_item);
                    compacted_item = Value::Object(included);
                }
                add_value(target, &item_property, compacted_item, as_array);
            } else {
                let mut wrapper = Map::new();
                wrapper.insert(self.compact_iri(active, kw::GRAPH, None, true, false)?, compacted_item);
                if let Some(id) = expanded_item.get(kw::ID).and_then(Value::as_str) {
                    let compacted_id = self.compact_iri(active, id, None, false, false)?;
                    wrapper.insert(self.compact_iri(active, kw::ID, None, true, false)?, Value::String(compacted_id));
                }
                if let Some(index) = expanded_item.get(kw::INDEX) {
                    wrapper.insert(self.compact_iri(active, kw::INDEX, None, true, false)?, index.clone());
                }
                add_value(target, &item_property, Value::Object(wrapper), as_array);
            }
            return Ok(());
        }

        let map_container = [Container::Language, Container::Index, Container::Id, Container::Type]
            .into_iter()
            .find(|c| container.contains(c));
        let Some(map_container) = map_container.filter(|_| !container.contains(&Container::Graph)) else {
            // Step 12.8.10
            add_value(target, &item_property, compacted_item, as_array);
            return Ok(());
        };

        // Step 12.8.9
        let mut container_key = self.compact_iri(active, map_container.as_str(), None, true, false)?;
        let index_key = active
            .term(&item_property)
            .and_then(|d| d.index.clone())
            .unwrap_or_else(|| kw::INDEX.to_string());
        let mut map_key: Option<String> = None;

        match map_container {
            Container::Language => {
                if let Some(inner) = expanded_item.get(kw::VALUE) {
                    compacted_item = inner.clone();
                }
                map_key = expanded_item.get(kw::LANGUAGE).and_then(Value::as_str).map(str::to_string);
            }
            Container::Index if index_key == kw::INDEX => {
                map_key = expanded_item.get(kw::INDEX).and_then(Value::as_str).map(str::to_string);
            }
            Container::Index => {
                let expanded_index_key = active.expand_vocab(&index_key)?.unwrap_or_else(|| index_key.clone());
                container_key = self.compact_iri(active, &expanded_index_key, None, true, false)?;
                if let Value::Object(item) = &mut compacted_item {
                    map_key = take_first_string(item, &container_key);
                }
            }
            Container::Id => {
                if let Value::Object(item) = &mut compacted_item {
                    map_key = match item.remove(&container_key) {
                        Some(Value::String(id)) => Some(id),
                        Some(other) => {
                            item.insert(container_key.clone(), other);
                            None
                        }
                        None => None,
                    };
                }
            }
            Container::Type => {
                if let Value::Object(item) = &mut compacted_item {
                    map_key = take_first_string(item, &container_key);
                    let id_alias = self.compact_iri(active, kw::ID, None, true, false)?;
                    let only_id = item.len() == 1 && item.contains_key(&id_alias);
                    if only_id && let Some(id) = expanded_item.get(kw::ID) {
                        let mut reference = Map::new();
                        reference.insert(kw::ID.to_string(), id.clone());
                        compacted_item = self.compact(active, Some(&item_property), &Value::Object(reference))?;
                    }
                }
            }
            _ => {}
        }

        let map_key = match map_key {
            Some(key) => key,
            None => self.compact_iri(active, kw::NONE, None, true, false)?,
        };
        let map_object = map_entry(target, &item_property)?;
        add_value(map_object, &map_key, compacted_item, as_array);
        Ok(())
    }

    /// The map a compacted property is written to: `result` itself, or the
    /// nesting map named by the term's `@nest`.
    fn nest_target<'r>(
        &self,
        active: &ActiveContext,
        result: &'r mut Map<String, Value>,
        item_property: &str,
    ) -> Result<&'r mut Map<String, Value>> {
        let Some(nest_term) = active.term(item_property).and_then(|d| d.nest.clone()) else {
            return Ok(result);
        };
        if nest_term != kw::NEST && active.expand_vocab(&nest_term)?.as_deref() != Some(kw::NEST) {
            return Err(JsonLdError::new(
                ErrorCode::InvalidKeywordNestValue,
                format!("nest term '{nest_term}' of '{item_property}' is not an alias of @nest"),
            ));
        }
        map_entry(result, &nest_term)
    }
}

/// The map stored under `key`, created when missing.
fn map_entry<'m>(map: &'m mut Map<String, Value>, key: &str) -> Result<&'m mut Map<String, Value>> {
    map.entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| JsonLdError::new(ErrorCode::CollidingKeywords, format!("'{key}' holds both a map and plain values")))
}

/// Removes the first string under `key`, leaving any remaining values in place.
fn take_first_string(item: &mut Map<String, Value>, key: &str) -> Option<String> {
    let mut values = match item.remove(key) {
        Some(v) => json::into_vec(v),
        None => return None,
    };
    let first = match values.first() {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    if first.is_some() {
        values.remove(0);
    }
    match values.len() {
        0 => {}
        1 => {
            item.insert(key.to_string(), values.remove(0));
        }
        _ => {
            item.insert(key.to_string(), Value::Array(values));
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProcessingMode;
    use serde_json::json;

    fn compact_with(context: Value, expanded: Value) -> Value {
        let options = JsonLdOptions::default();
        let base = ActiveContext::new(None, ProcessingMode::JsonLd11);
        let active = process_context(&base, &context, None, &mut Vec::new(), ContextFlags::default(), &options).unwrap();
        Compactor::new(&options).compact(&active, None, &expanded).unwrap()
    }

    #[test]
    fn compacts_terms_and_values() {
        let compacted = compact_with(
            json!({"name": "http://schema.org/name", "knows": {"@id": "http://schema.org/knows", "@type": "@id"}}),
            json!([{
                "@id": "http://example.org/alice",
                "http://schema.org/name": [{"@value": "Alice"}],
                "http://schema.org/knows": [{"@id": "http://example.org/bob"}]
            }]),
        );
        assert_eq!(
            compacted,
            json!({"@id": "http://example.org/alice", "name": "Alice", "knows": "http://example.org/bob"})
        );
    }

    #[test]
    fn compact_iris_and_lists() {
        let compacted = compact_with(
            json!({"ex": "http://example.org/", "items": {"@id": "http://example.org/items", "@container": "@list"}}),
            json!([{
                "http://example.org/p": [{"@value": "v"}],
                "http://example.org/items": [{"@list": [{"@value": 1}, {"@value": 2}]}]
            }]),
        );
        assert_eq!(compacted, json!({"ex:p": "v", "items": [1, 2]}));
    }

    #[test]
    fn language_maps() {
        let compacted = compact_with(
            json!({"label": {"@id": "http://example.org/label", "@container": "@language"}}),
            json!([{
                "http://example.org/label": [
                    {"@value": "Hello", "@language": "en"},
                    {"@value": "Bonjour", "@language": "fr"}
                ]
            }]),
        );
        assert_eq!(compacted, json!({"label": {"en": "Hello", "fr": "Bonjour"}}));
    }

    #[test]
    fn iri_confused_with_prefix() {
        let options = JsonLdOptions::default();
        let base = ActiveContext::new(None, ProcessingMode::JsonLd11);
        let active = process_context(
            &base,
            &json!({"tag": "http://example.org/tag/"}),
            None,
            &mut Vec::new(),
            ContextFlags::default(),
            &options,
        )
        .unwrap();
        let err = Compactor::new(&options)
            .compact(&active, None, &json!([{"@id": "tag:example.com,2024:x", "http://example.org/p": [{"@value": 1}]}]))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IriConfusedWithPrefix);
    }
}
