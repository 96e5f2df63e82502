/*!
 * JSON-LD 1.1 Expansion.
 *
 * Removes the context from a document: every property becomes an absolute
 * IRI or keyword, every value is a value object, node object or list object,
 * and every multi-valued entry is an array.
 *
 * The same pass expands frames when `frame_expansion` is set, in which case
 * framing keywords and wildcard values (`{}`, `[]`) survive expansion.
 */

pub mod value;

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::context::{ActiveContext, Container, ContextFlags, Direction, process_context};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::json::{self, add_value};
use crate::keywords::{self as kw, is_keyword};
use crate::language;
use crate::options::JsonLdOptions;

pub use value::expand_value;

fn err(code: ErrorCode, msg: impl std::fmt::Display) -> JsonLdError {
    JsonLdError::new(code, msg)
}

/// Expands `element` and normalizes the result to a top-level array.
///
/// `base_url` is the document location, used to resolve remote contexts.
pub fn expand(
    active: &ActiveContext,
    element: &Value,
    base_url: Option<&str>,
    options: &JsonLdOptions,
    frame_expansion: bool,
) -> Result<Vec<Value>> {
    let expander = Expander { options, base_url };
    let expanded = expander.expand_element(active, None, element, frame_expansion, false)?;

    let expanded = match expanded {
        Value::Object(mut map) if map.len() == 1 && map.contains_key(kw::GRAPH) => {
            map.remove(kw::GRAPH).unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(match expanded {
        Value::Null => Vec::new(),
        other => json::into_vec(other),
    })
}

struct Expander<'a> {
    options: &'a JsonLdOptions,
    base_url: Option<&'a str>,
}

impl Expander<'_> {
    fn process(&self, active: &ActiveContext, local: &Value, base_url: Option<&str>, flags: ContextFlags) -> Result<ActiveContext> {
        process_context(active, local, base_url, &mut Vec::new(), flags, self.options)
    }

    fn expand_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Value,
        frame_expansion: bool,
        from_map: bool,
    ) -> Result<Value> {
        // Step 2
        let frame_expansion = frame_expansion && active_property != Some(kw::DEFAULT);

        // Step 3
        let property_scoped = active_property
            .and_then(|p| active.term(p))
            .and_then(|d| d.context.as_ref().map(|c| (c.clone(), d.base_url.clone())));

        match element {
            // Step 1
            Value::Null => Ok(Value::Null),

            // Step 4
            Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                let Some(property) = active_property.filter(|p| *p != kw::GRAPH) else {
                    return Ok(Value::Null);
                };
                match &property_scoped {
                    Some((context, base)) => {
                        let scoped = self.process(active, context, base.as_deref(), override_protected())?;
                        expand_value(&scoped, property, element)
                    }
                    None => expand_value(active, property, element),
                }
            }

            // Step 5
            Value::Array(items) => {
                let is_list = active_property.is_some_and(|p| active.has_container(p, Container::List));
                let mut result = Vec::new();
                for item in items {
                    let expanded = self.expand_element(active, active_property, item, frame_expansion, from_map)?;
                    let expanded = match expanded {
                        Value::Array(inner) if is_list => list_object(inner),
                        other => other,
                    };
                    match expanded {
                        Value::Array(inner) => result.extend(inner),
                        Value::Null => {}
                        other => result.push(other),
                    }
                }
                Ok(Value::Array(result))
            }

            Value::Object(map) => self.expand_map(active, active_property, map, property_scoped, frame_expansion, from_map),
        }
    }

    fn expand_map(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, Value>,
        property_scoped: Option<(Value, Option<String>)>,
        frame_expansion: bool,
        from_map: bool,
    ) -> Result<Value> {
        let mut active = Cow::Borrowed(active);

        // Step 7
        if !from_map && let Some(previous) = active.previous_context.clone() {
            let mut revert = true;
            for key in element.keys() {
                let expanded = active.expand_vocab(key)?;
                if expanded.as_deref() == Some(kw::VALUE)
                    || (element.len() == 1 && expanded.as_deref() == Some(kw::ID))
                {
                    revert = false;
                    break;
                }
            }
            if revert {
                tracing::trace!("reverting to previous context for a new node object");
                active = Cow::Owned((*previous).clone());
            }
        }

        // Step 8
        if let Some((context, base)) = &property_scoped {
            active = Cow::Owned(self.process(&active, context, base.as_deref(), override_protected())?);
        }

        // Step 9
        if let Some(context) = element.get(kw::CONTEXT) {
            active = Cow::Owned(self.process(&active, context, self.base_url, ContextFlags::default())?);
        }

        // Step 10
        let type_scoped = active.clone().into_owned();

        // Step 11
        let mut sorted_keys: Vec<&String> = element.keys().collect();
        sorted_keys.sort();
        let mut type_key = None;
        for key in &sorted_keys {
            if active.expand_vocab(key)?.as_deref() != Some(kw::TYPE) {
                continue;
            }
            if type_key.is_none() {
                type_key = Some(key.as_str());
            }
            let mut terms: Vec<&str> = json::as_slice(&element[key.as_str()]).iter().filter_map(Value::as_str).collect();
            terms.sort_unstable();
            for term in terms {
                if let Some(definition) = type_scoped.term(term)
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
        let input_type = match type_key.and_then(|k| json::as_slice(&element[k]).last()) {
            Some(Value::String(t)) => active.expand_iri(t, false, true)?,
            _ => None,
        };

        // Step 13-14
        let mut result = Map::new();
        self.expand_object(
            &active,
            &type_scoped,
            active_property,
            element,
            input_type.as_deref(),
            &mut result,
            frame_expansion,
        )?;

        // Step 15
        if let Some(value) = result.get(kw::VALUE) {
            if let Some(extra) = result
                .keys()
                .find(|k| !matches!(k.as_str(), kw::DIRECTION | kw::INDEX | kw::LANGUAGE | kw::TYPE | kw::VALUE))
            {
                return Err(err(ErrorCode::InvalidValueObject, format!("value object cannot contain '{extra}'")));
            }
            let typed = result.contains_key(kw::TYPE);
            if typed && (result.contains_key(kw::LANGUAGE) || result.contains_key(kw::DIRECTION)) {
                return Err(err(ErrorCode::InvalidValueObject, "value object cannot have both @type and @language or @direction"));
            }
            let type_value = result.get(kw::TYPE);
            if type_value.and_then(Value::as_str) == Some(kw::JSON) {
                // any JSON value is allowed
            } else if value.is_null() || value.as_array().is_some_and(Vec::is_empty) {
                return Ok(Value::Null);
            } else if !frame_expansion {
                if !value.is_string() && result.contains_key(kw::LANGUAGE) {
                    return Err(err(ErrorCode::InvalidLanguageTaggedValue, format!("{value} cannot have a language")));
                }
                if let Some(t) = type_value
                    && !t.as_str().is_some_and(|t| crate::iri::is_absolute(t) && !crate::iri::is_blank_node_id(t))
                {
                    return Err(err(ErrorCode::InvalidTypedValue, format!("value type {t} is not an IRI")));
                }
            }
        } else if let Some(types) = result.get_mut(kw::TYPE) {
            // Step 16
            if !types.is_array() {
                *types = Value::Array(vec![types.take()]);
            }
        } else if result.contains_key(kw::SET) || result.contains_key(kw::LIST) {
            // Step 17
            let valid = result.len() == 1 || (result.len() == 2 && result.contains_key(kw::INDEX));
            if !valid {
                return Err(err(ErrorCode::InvalidSetOrListObject, "@set and @list objects may only carry @index"));
            }
            if let Some(set) = result.remove(kw::SET) {
                return Ok(set);
            }
        }

        // Step 18
        if result.len() == 1 && result.contains_key(kw::LANGUAGE) {
            return Ok(Value::Null);
        }

        // Step 19
        if active_property.is_none() || active_property == Some(kw::GRAPH) {
            let drop = !frame_expansion
                && (result.is_empty()
                    || result.contains_key(kw::VALUE)
                    || result.contains_key(kw::LIST)
                    || (result.len() == 1 && result.contains_key(kw::ID)));
            if drop {
                return Ok(Value::Null);
            }
        }

        Ok(Value::Object(result))
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_object(
        &self,
        active: &ActiveContext,
        type_scoped: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, Value>,
        input_type: Option<&str>,
        result: &mut Map<String, Value>,
        frame_expansion: bool,
    ) -> Result<()> {
        let mut nests: BTreeSet<String> = BTreeSet::new();

        for key in json::keys(element, self.options.ordered) {
            let value = &element[key.as_str()];

            // Step 13.1
            if key == kw::CONTEXT {
                continue;
            }

            // Step 13.2-3
            let Some(expanded_property) = active.expand_vocab(&key)? else {
                continue;
            };
            if !expanded_property.contains(':') && !is_keyword(&expanded_property) {
                tracing::trace!(key, "dropping property without an IRI mapping");
                continue;
            }

            // Step 13.4
            if is_keyword(&expanded_property) {
                if active_property == Some(kw::REVERSE) {
                    return Err(err(ErrorCode::InvalidReversePropertyMap, format!("keyword {expanded_property} inside @reverse")));
                }
                if result.contains_key(&expanded_property)
                    && !matches!(expanded_property.as_str(), kw::INCLUDED | kw::TYPE)
                {
                    return Err(err(ErrorCode::CollidingKeywords, format!("{expanded_property} appears more than once")));
                }

                let expanded_value = match expanded_property.as_str() {
                    kw::ID => self.expand_id(active, value, frame_expansion)?,
                    kw::TYPE => {
                        let expanded = self.expand_type(type_scoped, value, frame_expansion)?;
                        match (result.remove(kw::TYPE), expanded) {
                            (Some(existing), Value::Null) => existing,
                            (Some(existing), expanded) => {
                                let mut merged = json::into_vec(existing);
                                merged.extend(json::into_vec(expanded));
                                Value::Array(merged)
                            }
                            (None, expanded) => expanded,
                        }
                    }
                    kw::GRAPH => {
                        let expanded = self.expand_element(active, Some(kw::GRAPH), value, frame_expansion, false)?;
                        Value::Array(json::into_vec(expanded).into_iter().filter(|v| !v.is_null()).collect())
                    }
                    kw::INCLUDED => {
                        if active.is_json_ld_10() {
                            continue;
                        }
                        let expanded = self.expand_element(active, None, value, frame_expansion, false)?;
                        let mut included = match result.remove(kw::INCLUDED) {
                            Some(existing) => json::into_vec(existing),
                            None => Vec::new(),
                        };
                        for item in json::into_vec(expanded) {
                            if item.is_null() {
                                continue;
                            }
                            if !json::is_node_object(&item) {
                                return Err(err(ErrorCode::InvalidKeywordIncludedValue, "@included values must be node objects"));
                            }
                            included.push(item);
                        }
                        Value::Array(included)
                    }
                    kw::VALUE => {
                        let expanded = expand_value_entry(active, value, input_type, frame_expansion)?;
                        if expanded.is_null() {
                            result.insert(kw::VALUE.to_string(), Value::Null);
                            continue;
                        }
                        expanded
                    }
                    kw::LANGUAGE => expand_language(value, frame_expansion)?,
                    kw::DIRECTION => {
                        if active.is_json_ld_10() {
                            continue;
                        }
                        expand_direction(value, frame_expansion)?
                    }
                    kw::INDEX => match value {
                        Value::String(_) => value.clone(),
                        other => {
                            return Err(err(ErrorCode::InvalidKeywordIndexValue, format!("@index must be a string, found {other}")));
                        }
                    },
                    kw::LIST => {
                        if active_property.is_none() || active_property == Some(kw::GRAPH) {
                            continue;
                        }
                        let expanded = self.expand_element(active, active_property, value, frame_expansion, false)?;
                        match expanded {
                            Value::Null => Value::Array(Vec::new()),
                            other => Value::Array(json::into_vec(other)),
                        }
                    }
                    kw::SET => self.expand_element(active, active_property, value, frame_expansion, false)?,
                    kw::REVERSE => {
                        self.expand_reverse(active, value, result, frame_expansion)?;
                        continue;
                    }
                    kw::NEST => {
                        nests.insert(key.clone());
                        continue;
                    }
                    k if frame_expansion && kw::FRAMING.contains(&k) => {
                        self.expand_element(active, Some(k), value, frame_expansion, false)?
                    }
                    _ => continue,
                };

                // Step 13.4.16
                if !expanded_value.is_null() {
                    result.insert(expanded_property, expanded_value);
                }
                continue;
            }

            // Step 13.5
            let definition = active.term(&key);
            let container = active.container(&key);

            let expanded_value = if definition.and_then(|d| d.type_mapping.as_deref()) == Some(kw::JSON) {
                // Step 13.6
                let mut v = Map::new();
                v.insert(kw::VALUE.to_string(), value.clone());
                v.insert(kw::TYPE.to_string(), Value::String(kw::JSON.to_string()));
                Value::Object(v)
            } else if container.contains(&Container::Language) && value.is_object() {
                // Step 13.7
                let direction = match definition.and_then(|d| d.direction) {
                    Some(direction) => direction,
                    None => active.default_direction,
                };
                self.expand_language_map(active, value, direction)?
            } else if value.is_object()
                && (container.contains(&Container::Index)
                    || container.contains(&Container::Type)
                    || container.contains(&Container::Id))
            {
                // Step 13.8
                let index_key = definition.and_then(|d| d.index.clone()).unwrap_or_else(|| kw::INDEX.to_string());
                self.expand_index_map(active, &key, value, &container, &index_key, frame_expansion)?
            } else {
                // Step 13.9
                self.expand_element(active, Some(&key), value, frame_expansion, false)?
            };

            // Step 13.10
            if expanded_value.is_null() {
                continue;
            }

            // Step 13.11
            let expanded_value = if container.contains(&Container::List) && !json::is_list_object(&expanded_value) {
                list_object(json::into_vec(expanded_value))
            } else {
                expanded_value
            };

            // Step 13.12
            let expanded_value = if container.contains(&Container::Graph)
                && !container.contains(&Container::Id)
                && !container.contains(&Container::Index)
            {
                Value::Array(json::into_vec(expanded_value).into_iter().map(graph_object).collect())
            } else {
                expanded_value
            };

            // Step 13.13-14
            if definition.is_some_and(|d| d.reverse) {
                let reverse_map = reverse_map(result)?;
                for item in json::into_vec(expanded_value) {
                    if json::is_value_object(&item) || json::is_list_object(&item) {
                        return Err(err(ErrorCode::InvalidReversePropertyValue, format!("reverse property {key} cannot hold values or lists")));
                    }
                    add_value(reverse_map, &expanded_property, item, true);
                }
            } else {
                add_value(result, &expanded_property, expanded_value, true);
            }
        }

        // Step 14
        for nesting_key in nests {
            for nested in json::as_slice(&element[nesting_key.as_str()]) {
                let Value::Object(nested_map) = nested else {
                    return Err(err(ErrorCode::InvalidKeywordNestValue, format!("{nesting_key} must contain node objects")));
                };
                for nested_key in nested_map.keys() {
                    if active.expand_vocab(nested_key)?.as_deref() == Some(kw::VALUE) {
                        return Err(err(ErrorCode::InvalidKeywordNestValue, "nested values cannot contain @value"));
                    }
                }
                self.expand_object(active, type_scoped, active_property, nested_map, input_type, result, frame_expansion)?;
            }
        }
        Ok(())
    }

    fn expand_id(&self, active: &ActiveContext, value: &Value, frame_expansion: bool) -> Result<Value> {
        let expand = |s: &str| -> Result<Value> {
            Ok(active.expand_iri(s, true, false)?.map_or(Value::Null, Value::String))
        };
        match value {
            Value::String(s) if !frame_expansion => expand(s),
            Value::String(s) => Ok(Value::Array(vec![expand(s)?])),
            Value::Object(map) if frame_expansion && map.is_empty() => Ok(Value::Array(vec![value.clone()])),
            Value::Array(items) if frame_expansion && items.iter().all(Value::is_string) => {
                let mut ids = Vec::new();
                for item in items.iter().filter_map(Value::as_str) {
                    ids.push(expand(item)?);
                }
                Ok(Value::Array(ids))
            }
            other => Err(err(ErrorCode::InvalidKeywordIdValue, format!("@id must be a string, found {other}"))),
        }
    }

    fn expand_type(&self, type_scoped: &ActiveContext, value: &Value, frame_expansion: bool) -> Result<Value> {
        let expand = |s: &str| -> Result<Option<Value>> { Ok(type_scoped.expand_iri(s, true, true)?.map(Value::String)) };
        match value {
            Value::String(s) => Ok(expand(s)?.unwrap_or(Value::Null)),
            Value::Array(items) if items.iter().all(Value::is_string) => {
                let mut types = Vec::new();
                for item in items.iter().filter_map(Value::as_str) {
                    types.extend(expand(item)?);
                }
                Ok(Value::Array(types))
            }
            Value::Object(map) if frame_expansion && map.is_empty() => Ok(value.clone()),
            Value::Object(map) if frame_expansion && map.len() == 1 && map.contains_key(kw::DEFAULT) => {
                let default = match &map[kw::DEFAULT] {
                    Value::String(s) => expand(s)?.unwrap_or(Value::Null),
                    other => {
                        return Err(err(ErrorCode::InvalidTypeValue, format!("@type default must be a string, found {other}")));
                    }
                };
                let mut expanded = Map::new();
                expanded.insert(kw::DEFAULT.to_string(), default);
                Ok(Value::Object(expanded))
            }
            other => Err(err(ErrorCode::InvalidTypeValue, format!("@type must be a string or array of strings, found {other}"))),
        }
    }

    fn expand_reverse(
        &self,
        active: &ActiveContext,
        value: &Value,
        result: &mut Map<String, Value>,
        frame_expansion: bool,
    ) -> Result<()> {
        if !value.is_object() {
            return Err(err(ErrorCode::InvalidKeywordReverseValue, "@reverse must be a map"));
        }
        let expanded = self.expand_element(active, Some(kw::REVERSE), value, frame_expansion, false)?;
        let Value::Object(mut expanded) = expanded else {
            return Ok(());
        };

        // Step 13.4.13.3: a doubly reversed property is a forward property
        if let Some(Value::Object(forward)) = expanded.remove(kw::REVERSE) {
            for (property, items) in forward {
                add_value(result, &property, items, true);
            }
        }

        // Step 13.4.13.4
        if !expanded.is_empty() {
            let reverse_map = reverse_map(result)?;
            for (property, items) in expanded {
                for item in json::into_vec(items) {
                    if json::is_value_object(&item) || json::is_list_object(&item) {
                        return Err(err(ErrorCode::InvalidReversePropertyValue, format!("{property} cannot hold values or lists")));
                    }
                    add_value(reverse_map, &property, item, true);
                }
            }
        }
        Ok(())
    }

    fn expand_language_map(&self, active: &ActiveContext, value: &Value, direction: Option<Direction>) -> Result<Value> {
        let Value::Object(map) = value else {
            return Ok(Value::Null);
        };
        let mut expanded = Vec::new();
        for language in json::keys(map, self.options.ordered) {
            let is_none = language == kw::NONE || active.expand_vocab(&language)?.as_deref() == Some(kw::NONE);
            for item in json::as_slice(&map[language.as_str()]) {
                let text = match item {
                    Value::Null => continue,
                    Value::String(s) => s,
                    other => {
                        return Err(err(ErrorCode::InvalidLanguageMapValue, format!("language map values must be strings, found {other}")));
                    }
                };
                let mut v = Map::new();
                v.insert(kw::VALUE.to_string(), Value::String(text.clone()));
                if !is_none {
                    language::check(&language);
                    v.insert(kw::LANGUAGE.to_string(), Value::String(language.clone()));
                }
                if let Some(direction) = direction {
                    v.insert(kw::DIRECTION.to_string(), Value::String(direction.to_string()));
                }
                expanded.push(Value::Object(v));
            }
        }
        Ok(Value::Array(expanded))
    }

    fn expand_index_map(
        &self,
        active: &ActiveContext,
        key: &str,
        value: &Value,
        container: &BTreeSet<Container>,
        index_key: &str,
        frame_expansion: bool,
    ) -> Result<Value> {
        let Value::Object(map) = value else {
            return Ok(Value::Null);
        };
        let id_or_type = container.contains(&Container::Id) || container.contains(&Container::Type);
        let mut expanded = Vec::new();

        for index in json::keys(map, self.options.ordered) {
            // Step 13.8.3.1-2
            let mut map_context = match &active.previous_context {
                Some(previous) if id_or_type => Cow::Owned((**previous).clone()),
                _ => Cow::Borrowed(active),
            };
            if container.contains(&Container::Type)
                && let Some(definition) = map_context.term(&index)
                && let Some(context) = definition.context.clone()
            {
                let base = definition.base_url.clone();
                map_context = Cow::Owned(self.process(&map_context, &context, base.as_deref(), ContextFlags::default())?);
            }

            // Step 13.8.3.3-4
            let expanded_index = active.expand_vocab(&index)?;
            let is_none = expanded_index.as_deref() == Some(kw::NONE);
            let index_value = Value::Array(json::as_slice(&map[index.as_str()]).to_vec());
            let items = self.expand_element(&map_context, Some(key), &index_value, frame_expansion, true)?;

            for item in json::into_vec(items) {
                if item.is_null() {
                    continue;
                }
                // Step 13.8.3.7.1
                let mut item = if container.contains(&Container::Graph) && !json::is_graph_object(&item) {
                    graph_object(item)
                } else {
                    item
                };
                if let Value::Object(entries) = &mut item {
                    if container.contains(&Container::Index) && index_key != kw::INDEX && !is_none {
                        // Step 13.8.3.7.2
                        let re_expanded = expand_value(active, index_key, &Value::String(index.clone()))?;
                        if let Some(expanded_key) = active.expand_vocab(index_key)? {
                            let mut values = vec![re_expanded];
                            if let Some(existing) = entries.remove(&expanded_key) {
                                values.extend(json::into_vec(existing));
                            }
                            entries.insert(expanded_key, Value::Array(values));
                        }
                        if entries.contains_key(kw::VALUE) {
                            return Err(err(ErrorCode::InvalidValueObject, format!("property-indexed value for {key} cannot be a value object")));
                        }
                    } else if container.contains(&Container::Index) && !entries.contains_key(kw::INDEX) && !is_none {
                        entries.insert(kw::INDEX.to_string(), Value::String(index.clone()));
                    } else if container.contains(&Container::Id) && !entries.contains_key(kw::ID) && !is_none {
                        let id = active.expand_iri(&index, true, false)?;
                        entries.insert(kw::ID.to_string(), id.map_or(Value::Null, Value::String));
                    } else if container.contains(&Container::Type) && !is_none {
                        let mut types: Vec<Value> = expanded_index.iter().cloned().map(Value::String).collect();
                        if let Some(existing) = entries.remove(kw::TYPE) {
                            types.extend(json::into_vec(existing));
                        }
                        entries.insert(kw::TYPE.to_string(), Value::Array(types));
                    }
                }
                expanded.push(item);
            }
        }
        Ok(Value::Array(expanded))
    }
}

fn override_protected() -> ContextFlags {
    ContextFlags {
        override_protected: true,
        ..Default::default()
    }
}

fn list_object(items: Vec<Value>) -> Value {
    let mut map = Map::new();
    map.insert(kw::LIST.to_string(), Value::Array(items));
    Value::Object(map)
}

fn graph_object(item: Value) -> Value {
    let mut map = Map::new();
    map.insert(kw::GRAPH.to_string(), Value::Array(json::into_vec(item)));
    Value::Object(map)
}

fn reverse_map(result: &mut Map<String, Value>) -> Result<&mut Map<String, Value>> {
    result
        .entry(kw::REVERSE)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| err(ErrorCode::InvalidReversePropertyMap, "@reverse must be a map"))
}

fn expand_value_entry(active: &ActiveContext, value: &Value, input_type: Option<&str>, frame_expansion: bool) -> Result<Value> {
    if input_type == Some(kw::JSON) {
        if active.is_json_ld_10() {
            return Err(err(ErrorCode::InvalidValueObjectValue, "@json values require JSON-LD 1.1"));
        }
        return Ok(value.clone());
    }
    match value {
        Value::Null => Ok(Value::Null),
        v if json::is_scalar(v) => Ok(if frame_expansion { Value::Array(vec![v.clone()]) } else { v.clone() }),
        Value::Object(map) if frame_expansion && map.is_empty() => Ok(Value::Array(vec![value.clone()])),
        Value::Array(items) if frame_expansion && items.iter().all(json::is_scalar) => Ok(value.clone()),
        other => Err(err(ErrorCode::InvalidValueObjectValue, format!("@value must be a scalar or null, found {other}"))),
    }
}

fn expand_language(value: &Value, frame_expansion: bool) -> Result<Value> {
    match value {
        Value::String(s) => {
            language::check(s);
            Ok(if frame_expansion { Value::Array(vec![value.clone()]) } else { Value::String(s.clone()) })
        }
        Value::Object(map) if frame_expansion && map.is_empty() => Ok(Value::Array(vec![value.clone()])),
        Value::Array(items) if frame_expansion && items.iter().all(Value::is_string) => Ok(value.clone()),
        other => Err(err(ErrorCode::InvalidLanguageTaggedString, format!("@language must be a string, found {other}"))),
    }
}

fn expand_direction(value: &Value, frame_expansion: bool) -> Result<Value> {
    match value {
        Value::String(s) if Direction::parse(s).is_some() => {
            Ok(if frame_expansion { Value::Array(vec![value.clone()]) } else { value.clone() })
        }
        Value::Object(map) if frame_expansion && map.is_empty() => Ok(Value::Array(vec![value.clone()])),
        Value::Array(items) if frame_expansion && items.iter().all(Value::is_string) => Ok(value.clone()),
        other => Err(err(ErrorCode::InvalidBaseDirection, format!("@direction must be \"ltr\" or \"rtl\", found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ProcessingMode;
    use serde_json::json;

    fn expand_doc(doc: Value) -> Result<Vec<Value>> {
        let options = JsonLdOptions::default();
        let active = ActiveContext::new(Some("http://example.org/doc".into()), ProcessingMode::JsonLd11);
        expand(&active, &doc, None, &options, false)
    }

    #[test]
    fn expands_terms_and_types() {
        let expanded = expand_doc(json!({
            "@context": {"@vocab": "http://schema.org/", "knows": {"@type": "@id"}},
            "@id": "alice",
            "@type": "Person",
            "name": "Alice",
            "knows": "bob"
        }))
        .unwrap();
        assert_eq!(
            expanded,
            vec![json!({
                "@id": "http://example.org/alice",
                "@type": ["http://schema.org/Person"],
                "http://schema.org/name": [{"@value": "Alice"}],
                "http://schema.org/knows": [{"@id": "http://example.org/bob"}]
            })]
        );
    }

    #[test]
    fn drops_unmapped_properties_and_free_values() {
        let expanded = expand_doc(json!({"unmapped": "x", "http://example.org/p": "y"})).unwrap();
        assert_eq!(expanded, vec![json!({"http://example.org/p": [{"@value": "y"}]})]);
        assert!(expand_doc(json!({"@value": "free"})).unwrap().is_empty());
        assert!(expand_doc(json!({"@id": "http://example.org/only-id"})).unwrap().is_empty());
    }

    #[test]
    fn list_and_set_containers() {
        let expanded = expand_doc(json!({
            "@context": {
                "list": {"@id": "http://example.org/list", "@container": "@list"},
                "set": {"@id": "http://example.org/set", "@container": "@set"}
            },
            "list": [1, 2],
            "set": {"@set": ["a"]}
        }))
        .unwrap();
        assert_eq!(expanded[0]["http://example.org/list"], json!([{"@list": [{"@value": 1}, {"@value": 2}]}]));
        assert_eq!(expanded[0]["http://example.org/set"], json!([{"@value": "a"}]));
    }

    #[test]
    fn language_and_index_maps() {
        let expanded = expand_doc(json!({
            "@context": {
                "label": {"@id": "http://example.org/label", "@container": "@language"},
                "post": {"@id": "http://example.org/post", "@container": "@index"}
            },
            "label": {"en": "Hello", "@none": "Hallo"},
            "post": {"first": {"@id": "http://example.org/p1"}}
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://example.org/label"],
            json!([{"@value": "Hello", "@language": "en"}, {"@value": "Hallo"}])
        );
        assert_eq!(
            expanded[0]["http://example.org/post"],
            json!([{"@id": "http://example.org/p1", "@index": "first"}])
        );
    }

    #[test]
    fn reverse_properties() {
        let expanded = expand_doc(json!({
            "@context": {"parent": {"@reverse": "http://example.org/child"}},
            "@id": "http://example.org/c",
            "parent": {"@id": "http://example.org/p"}
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["@reverse"],
            json!({"http://example.org/child": [{"@id": "http://example.org/p"}]})
        );
    }

    #[test]
    fn nested_properties() {
        let expanded = expand_doc(json!({
            "@context": {"@vocab": "http://example.org/", "meta": "@nest"},
            "meta": {"author": "Ann"}
        }))
        .unwrap();
        assert_eq!(expanded[0]["http://example.org/author"], json!([{"@value": "Ann"}]));
    }

    #[test]
    fn json_literals() {
        let expanded = expand_doc(json!({
            "@context": {"data": {"@id": "http://example.org/data", "@type": "@json"}},
            "data": {"b": 1, "a": [true]}
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://example.org/data"],
            json!([{"@value": {"b": 1, "a": [true]}, "@type": "@json"}])
        );
    }

    #[test]
    fn type_scoped_contexts_do_not_propagate() {
        let expanded = expand_doc(json!({
            "@context": {
                "@vocab": "http://example.org/",
                "Person": {"@context": {"name": "http://schema.org/name"}}
            },
            "@type": "Person",
            "name": "Ann",
            "friend": {"name": "Bob"}
        }))
        .unwrap();
        assert!(expanded[0].get("http://schema.org/name").is_some());
        assert!(expanded[0]["http://example.org/friend"][0].get("http://example.org/name").is_some());
    }

    #[test]
    fn error_codes() {
        let code = |doc: Value| expand_doc(doc).unwrap_err().code();
        assert_eq!(code(json!({"@id": 5})), ErrorCode::InvalidKeywordIdValue);
        assert_eq!(code(json!({"@type": 5})), ErrorCode::InvalidTypeValue);
        assert_eq!(code(json!({"http://example.org/p": {"@value": {"x": 1}}})), ErrorCode::InvalidValueObjectValue);
        assert_eq!(code(json!({"http://example.org/p": {"@value": 1, "@language": "en"}})), ErrorCode::InvalidLanguageTaggedValue);
        assert_eq!(
            code(json!({"http://example.org/p": {"@value": "x", "@type": "http://t", "@language": "en"}})),
            ErrorCode::InvalidValueObject
        );
        assert_eq!(code(json!({"http://example.org/p": {"@list": [], "@id": "x"}})), ErrorCode::InvalidSetOrListObject);
        assert_eq!(code(json!({"@reverse": 1})), ErrorCode::InvalidKeywordReverseValue);
        assert_eq!(
            code(json!({"@context": {"id1": "@id", "id2": "@id"}, "id1": "a", "id2": "b"})),
            ErrorCode::CollidingKeywords
        );
    }
}
