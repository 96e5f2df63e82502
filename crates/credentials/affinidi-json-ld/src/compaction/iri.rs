//! IRI Compaction: chooses the term, compact IRI or relative IRI that best
//! represents an IRI for a given value.

use serde_json::Value;

use super::Compactor;
use crate::context::ActiveContext;
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::json;
use crate::keywords::{self as kw, is_keyword_form};

fn lang_dir(language: Option<&str>, direction: Option<&str>) -> String {
    let language = language.map(str::to_lowercase).unwrap_or_default();
    match direction {
        Some(direction) => format!("{language}_{direction}"),
        None => language,
    }
}

impl Compactor<'_> {
    /// Compacts `var`, a vocabulary IRI when `vocab` is set, otherwise a document IRI.
    pub(crate) fn compact_iri(
        &self,
        active: &ActiveContext,
        var: &str,
        value: Option<&Value>,
        vocab: bool,
        reverse: bool,
    ) -> Result<String> {
        // Step 3
        if vocab {
            let inverse = active.inverse();
            if inverse.contains(var) {
                let (containers, type_language, preferred) = self.term_selection_input(active, var, value, reverse)?;
                let containers: Vec<&str> = containers.iter().map(String::as_str).collect();
                if let Some(term) = inverse.select_term(var, &containers, type_language, &preferred) {
                    return Ok(term.to_string());
                }
            }

            // Step 4
            if let Some(vocab_iri) = &active.vocab
                && let Some(suffix) = var.strip_prefix(vocab_iri.as_str())
                && !suffix.is_empty()
                && active.term(suffix).is_none()
            {
                return Ok(suffix.to_string());
            }
        }

        // Step 5-6
        let mut compact_iri: Option<String> = None;
        for (term, definition) in active.terms() {
            let Some(term_iri) = &definition.iri else {
                continue;
            };
            if term_iri == var || !definition.prefix {
                continue;
            }
            let Some(suffix) = var.strip_prefix(term_iri.as_str()) else {
                continue;
            };
            let candidate = format!("{term}:{suffix}");
            let better = match &compact_iri {
                None => true,
                Some(current) => {
                    candidate.len() < current.len() || (candidate.len() == current.len() && candidate < *current)
                }
            };
            let usable = match active.term(&candidate) {
                None => true,
                Some(existing) => existing.iri.as_deref() == Some(var) && value.is_none(),
            };
            if better && usable {
                compact_iri = Some(candidate);
            }
        }

        // Step 7
        if let Some(compact_iri) = compact_iri {
            return Ok(compact_iri);
        }

        // Step 8
        if let Some(colon) = var.find(':')
            && iri::is_absolute(var)
        {
            let scheme = &var[..colon];
            if !var[colon + 1..].starts_with("//") && active.term(scheme).is_some_and(|d| d.prefix) {
                return Err(JsonLdError::new(
                    ErrorCode::IriConfusedWithPrefix,
                    format!("{var} would be read as a compact IRI using prefix '{scheme}'"),
                ));
            }
        }

        // Step 9
        if !vocab && self.options.compact_to_relative && active.base_iri.is_some() {
            let relative = iri::relativize(active.base_iri.as_deref(), var);
            if is_keyword_form(&relative) {
                return Ok(format!("./{relative}"));
            }
            return Ok(relative);
        }

        Ok(var.to_string())
    }

    /// Step 3.1-3.19: the container list, type/language selector and preferred values
    /// that drive term selection for `value`.
    fn term_selection_input(
        &self,
        active: &ActiveContext,
        var: &str,
        value: Option<&Value>,
        reverse: bool,
    ) -> Result<(Vec<String>, &'static str, Vec<String>)> {
        // Step 3.1
        let default_language = match active.default_direction {
            Some(direction) => lang_dir(active.default_language.as_deref(), Some(direction.as_str())),
            None => active
                .default_language
                .as_deref()
                .map_or_else(|| kw::NONE.to_string(), str::to_lowercase),
        };

        // Step 3.2
        let value = match value.and_then(|v| v.get(kw::PRESERVE)) {
            Some(preserved) => json::as_slice(preserved).first(),
            None => value,
        };
        let has = |key: &str| value.is_some_and(|v| v.get(key).is_some());

        // Step 3.3-3.4
        let mut containers: Vec<String> = Vec::new();
        let mut type_language = kw::LANGUAGE;
        let mut type_language_value = kw::NULL.to_string();

        // Step 3.5
        if has(kw::INDEX) && !value.is_some_and(json::is_graph_object) {
            containers.extend(["@index".to_string(), "@index@set".to_string()]);
        }

        if reverse {
            // Step 3.6
            type_language = kw::TYPE;
            type_language_value = kw::REVERSE.to_string();
            containers.push(kw::SET.to_string());
        } else if let Some(list) = value.filter(|v| json::is_list_object(v)).and_then(|v| v.get(kw::LIST)) {
            // Step 3.7
            if !has(kw::INDEX) {
                containers.push(kw::LIST.to_string());
            }
            let list = json::as_slice(list);
            let mut common_type: Option<String> = None;
            let mut common_language: Option<String> = None;
            if list.is_empty() {
                common_language = Some(default_language.clone());
            }
            for item in list {
                let mut item_language = kw::NONE.to_string();
                let mut item_type = kw::NONE.to_string();
                if json::is_value_object(item) {
                    if let Some(direction) = item.get(kw::DIRECTION).and_then(Value::as_str) {
                        item_language = lang_dir(item.get(kw::LANGUAGE).and_then(Value::as_str), Some(direction));
                    } else if let Some(language) = item.get(kw::LANGUAGE).and_then(Value::as_str) {
                        item_language = language.to_lowercase();
                    } else if let Some(item_type_value) = item.get(kw::TYPE).and_then(Value::as_str) {
                        item_type = item_type_value.to_string();
                    } else {
                        item_language = kw::NULL.to_string();
                    }
                } else {
                    item_type = kw::ID.to_string();
                }

                match &common_language {
                    None => common_language = Some(item_language),
                    Some(common) if *common != item_language && json::is_value_object(item) => {
                        common_language = Some(kw::NONE.to_string());
                    }
                    _ => {}
                }
                match &common_type {
                    None => common_type = Some(item_type),
                    Some(common) if *common != item_type => common_type = Some(kw::NONE.to_string()),
                    _ => {}
                }
                if common_language.as_deref() == Some(kw::NONE) && common_type.as_deref() == Some(kw::NONE) {
                    break;
                }
            }
            let common_language = common_language.unwrap_or_else(|| kw::NONE.to_string());
            let common_type = common_type.unwrap_or_else(|| kw::NONE.to_string());
            if common_type != kw::NONE {
                type_language = kw::TYPE;
                type_language_value = common_type;
            } else {
                type_language_value = common_language;
            }
        } else if value.is_some_and(json::is_graph_object) {
            // Step 3.8
            if has(kw::INDEX) {
                containers.extend(["@graph@index", "@graph@index@set"].map(String::from));
            }
            if has(kw::ID) {
                containers.extend(["@graph@id", "@graph@id@set"].map(String::from));
            }
            containers.extend(["@graph", "@graph@set", "@set"].map(String::from));
            if !has(kw::INDEX) {
                containers.extend(["@graph@index", "@graph@index@set"].map(String::from));
            }
            if !has(kw::ID) {
                containers.extend(["@graph@id", "@graph@id@set"].map(String::from));
            }
            containers.extend(["@index", "@index@set"].map(String::from));
            type_language = kw::TYPE;
            type_language_value = kw::ID.to_string();
        } else {
            // Step 3.9
            match value {
                Some(v) if json::is_value_object(v) => {
                    let language = v.get(kw::LANGUAGE).and_then(Value::as_str);
                    if let Some(direction) = v.get(kw::DIRECTION).and_then(Value::as_str)
                        && !has(kw::INDEX)
                    {
                        type_language_value = lang_dir(language, Some(direction));
                        containers.extend(["@language", "@language@set"].map(String::from));
                    } else if let Some(language) = language
                        && !has(kw::INDEX)
                    {
                        type_language_value = language.to_lowercase();
                        containers.extend(["@language", "@language@set"].map(String::from));
                    } else if let Some(value_type) = v.get(kw::TYPE).and_then(Value::as_str) {
                        type_language = kw::TYPE;
                        type_language_value = value_type.to_string();
                    }
                }
                _ => {
                    type_language = kw::TYPE;
                    type_language_value = kw::ID.to_string();
                    containers.extend(["@id", "@id@set", "@type", "@set@type"].map(String::from));
                }
            }
            containers.push(kw::SET.to_string());
        }

        // Step 3.10
        containers.push(kw::NONE.to_string());

        // Step 3.11
        if !active.is_json_ld_10() && !has(kw::INDEX) {
            containers.extend(["@index", "@index@set"].map(String::from));
        }

        // Step 3.12
        if !active.is_json_ld_10() && value.is_some_and(|v| v.as_object().is_some_and(|m| m.len() == 1 && m.contains_key(kw::VALUE))) {
            containers.extend(["@language", "@language@set"].map(String::from));
        }

        // Step 3.14-3.17
        let mut preferred: Vec<String> = Vec::new();
        if type_language_value == kw::REVERSE {
            preferred.push(kw::REVERSE.to_string());
        }
        let id = value.and_then(|v| v.get(kw::ID));
        if (type_language_value == kw::ID || type_language_value == kw::REVERSE) && id.is_some() {
            if let Some(id) = id.and_then(Value::as_str) {
                let compacted = self.compact_iri(active, id, None, true, false)?;
                let round_trips = active
                    .term(&compacted)
                    .is_some_and(|d| d.iri.as_deref() == Some(id));
                if round_trips {
                    preferred.extend([kw::VOCAB, kw::ID, kw::NONE].map(String::from));
                } else {
                    preferred.extend([kw::ID, kw::VOCAB, kw::NONE].map(String::from));
                }
            } else {
                preferred.extend([kw::ID, kw::VOCAB, kw::NONE].map(String::from));
            }
        } else {
            preferred.push(type_language_value.clone());
            preferred.push(kw::NONE.to_string());
            let empty_list = value
                .and_then(|v| v.get(kw::LIST))
                .is_some_and(|l| l.as_array().is_some_and(Vec::is_empty));
            if empty_list {
                type_language = kw::ANY;
            }
        }

        // Step 3.18
        preferred.push(kw::ANY.to_string());

        // Step 3.19
        if let Some(underscore) = preferred.iter().find_map(|p| p.find('_').map(|i| p[i..].to_string())) {
            preferred.push(underscore);
        }

        tracing::trace!(var, ?containers, type_language, ?preferred, "term selection");
        Ok((containers, type_language, preferred))
    }
}
