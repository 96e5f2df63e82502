//! Value Compaction.

use serde_json::{Map, Value};

use super::Compactor;
use crate::context::{ActiveContext, Container};
use crate::error::Result;
use crate::keywords as kw;

impl Compactor<'_> {
    /// Compacts a value object or node reference held by `active_property`.
    pub(crate) fn compact_value(&self, active: &ActiveContext, active_property: Option<&str>, value: &Map<String, Value>) -> Result<Value> {
        let definition = active_property.and_then(|p| active.term(p));
        let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());
        let index_container = definition.is_some_and(|d| d.has_container(Container::Index));

        // Step 3-4
        let language = match definition.and_then(|d| d.language.as_ref()) {
            Some(language) => language.clone(),
            None => active.default_language.clone(),
        };
        let direction = match definition.and_then(|d| d.direction) {
            Some(direction) => direction,
            None => active.default_direction,
        };

        let index_allows = !value.contains_key(kw::INDEX) || index_container;

        let mut result: Value = Value::Object(value.clone());

        if let Some(id) = value.get(kw::ID).and_then(Value::as_str)
            && value.keys().all(|k| k == kw::ID || k == kw::INDEX)
        {
            // Step 5
            match type_mapping {
                Some(kw::ID) => result = Value::String(self.compact_iri(active, id, None, false, false)?),
                Some(kw::VOCAB) => result = Value::String(self.compact_iri(active, id, None, true, false)?),
                _ => {}
            }
        } else if let Some(value_type) = value.get(kw::TYPE)
            && type_mapping.is_some_and(|t| value_type.as_str() == Some(t))
        {
            // Step 6
            if index_allows {
                result = value.get(kw::VALUE).cloned().unwrap_or(Value::Null);
            }
        } else if type_mapping == Some(kw::NONE) || value.contains_key(kw::TYPE) {
            // Step 7
            if let Value::Object(map) = &mut result
                && let Some(types) = map.get_mut(kw::TYPE)
            {
                *types = match types.take() {
                    Value::String(t) => Value::String(self.compact_iri(active, &t, None, true, false)?),
                    Value::Array(items) => {
                        let mut compacted = Vec::with_capacity(items.len());
                        for item in items {
                            match item {
                                Value::String(t) => compacted.push(Value::String(self.compact_iri(active, &t, None, true, false)?)),
                                other => compacted.push(other),
                            }
                        }
                        Value::Array(compacted)
                    }
                    other => other,
                };
            }
        } else if let Some(inner) = value.get(kw::VALUE)
            && !inner.is_string()
        {
            // Step 8
            if index_allows {
                result = inner.clone();
            }
        } else {
            // Step 9
            let value_language = value.get(kw::LANGUAGE).and_then(Value::as_str);
            let language_matches = match (value_language, language.as_deref()) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            };
            let value_direction = value.get(kw::DIRECTION).and_then(Value::as_str);
            let direction_matches = value_direction == direction.map(|d| d.as_str());
            if language_matches && direction_matches && index_allows {
                result = value.get(kw::VALUE).cloned().unwrap_or(Value::Null);
            }
        }

        // Step 10
        if let Value::Object(map) = result {
            let mut aliased = Map::new();
            for (key, entry) in map {
                let alias = self.compact_iri(active, &key, None, true, false)?;
                aliased.insert(alias, entry);
            }
            return Ok(Value::Object(aliased));
        }
        Ok(result)
    }
}
