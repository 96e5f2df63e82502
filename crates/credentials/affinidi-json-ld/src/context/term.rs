//! Create Term Definition, plus IRI expansion against a context being defined.

use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Value};

use super::processing::{ContextFlags, process_context};
use super::{ActiveContext, Container, Direction, TermDefinition};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::keywords::{self as kw, is_keyword, is_keyword_form};
use crate::language;
use crate::options::JsonLdOptions;

/// Progress of a term while its definition is being created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DefineStatus {
    Defining,
    Defined,
}

const TERM_ENTRIES: &[&str] = &[
    kw::ID,
    kw::REVERSE,
    kw::CONTAINER,
    kw::CONTEXT,
    kw::DIRECTION,
    kw::INDEX,
    kw::LANGUAGE,
    kw::NEST,
    kw::PREFIX,
    kw::PROTECTED,
    kw::TYPE,
];

fn err(code: ErrorCode, msg: impl std::fmt::Display) -> JsonLdError {
    JsonLdError::new(code, msg)
}

/// Defines the terms of one local context map into an active context.
pub(crate) struct TermBuilder<'a> {
    pub active: &'a mut ActiveContext,
    pub local: &'a Map<String, Value>,
    pub defined: HashMap<String, DefineStatus>,
    pub base_url: Option<&'a str>,
    pub protected: bool,
    pub override_protected: bool,
    pub remote_contexts: &'a [String],
    pub options: &'a JsonLdOptions,
}

impl TermBuilder<'_> {
    /// IRI Expansion that first defines terms from the local context on demand.
    pub fn expand_iri(&mut self, value: &str, document_relative: bool, vocab: bool) -> Result<Option<String>> {
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        if is_keyword_form(value) {
            tracing::warn!(value, "ignoring keyword-like value");
            return Ok(None);
        }

        // Step 3
        if self.local.contains_key(value) && self.defined.get(value) != Some(&DefineStatus::Defined) {
            self.create_term_definition(value)?;
        }

        // Step 6.3
        if let Some(idx) = value.find(':')
            && idx > 0
        {
            let prefix = &value[..idx];
            let suffix = &value[idx + 1..];
            if prefix != "_"
                && !suffix.starts_with("//")
                && self.local.contains_key(prefix)
                && self.defined.get(prefix) != Some(&DefineStatus::Defined)
            {
                self.create_term_definition(prefix)?;
            }
        }

        self.active.expand_iri(value, document_relative, vocab)
    }

    /// Create Term Definition.
    pub fn create_term_definition(&mut self, term: &str) -> Result<()> {
        // Step 1
        match self.defined.get(term) {
            Some(DefineStatus::Defined) => return Ok(()),
            Some(DefineStatus::Defining) => {
                return Err(err(ErrorCode::CyclicIriMapping, format!("term '{term}' depends on itself")));
            }
            None => {}
        }

        // Step 2
        if term.is_empty() {
            return Err(err(ErrorCode::InvalidTermDefinition, "the empty string is not a valid term"));
        }
        self.defined.insert(term.to_string(), DefineStatus::Defining);

        // Step 3
        let value = self.local.get(term).cloned().unwrap_or(Value::Null);

        // Step 4
        if term == kw::TYPE && !self.active.is_json_ld_10() {
            let allowed = value.as_object().is_some_and(|map| {
                !map.is_empty()
                    && map.iter().all(|(k, v)| match k.as_str() {
                        kw::CONTAINER => v == kw::SET,
                        kw::PROTECTED => true,
                        _ => false,
                    })
            });
            if !allowed {
                return Err(err(ErrorCode::KeywordRedefinition, "@type may only be given @container: @set or @protected"));
            }
        } else if is_keyword(term) {
            return Err(err(ErrorCode::KeywordRedefinition, format!("keyword '{term}' cannot be redefined")));
        } else if is_keyword_form(term) {
            // Step 5
            tracing::warn!(term, "ignoring term with the form of a keyword");
            self.defined.insert(term.to_string(), DefineStatus::Defined);
            return Ok(());
        }

        // Step 6
        let previous = self.active.remove_term(term);

        // Step 7-9
        let (value, simple_term) = match value {
            Value::Null => {
                let mut map = Map::new();
                map.insert(kw::ID.to_string(), Value::Null);
                (map, false)
            }
            Value::String(s) => {
                let mut map = Map::new();
                map.insert(kw::ID.to_string(), Value::String(s));
                (map, true)
            }
            Value::Object(map) => (map, false),
            other => {
                return Err(err(
                    ErrorCode::InvalidTermDefinition,
                    format!("term '{term}' must be a string, map or null, found {other}"),
                ));
            }
        };

        // Step 10
        let mut definition = TermDefinition::default();

        // Step 11-12
        if let Some(protected) = value.get(kw::PROTECTED) {
            if self.active.is_json_ld_10() {
                return Err(err(ErrorCode::InvalidTermDefinition, "@protected requires JSON-LD 1.1"));
            }
            definition.protected = protected
                .as_bool()
                .ok_or_else(|| err(ErrorCode::InvalidKeywordProtectedValue, format!("@protected of '{term}' must be a boolean")))?;
        } else {
            definition.protected = self.protected;
        }

        // Step 13
        if let Some(type_value) = value.get(kw::TYPE) {
            let type_str = type_value
                .as_str()
                .ok_or_else(|| err(ErrorCode::InvalidTypeMapping, format!("@type of '{term}' must be a string")))?;
            let expanded = self.expand_iri(type_str, false, true)?.ok_or_else(|| {
                err(ErrorCode::InvalidTypeMapping, format!("@type '{type_str}' does not expand to an IRI"))
            })?;
            let keyword_type = matches!(expanded.as_str(), kw::ID | kw::VOCAB | kw::JSON | kw::NONE);
            if (expanded == kw::JSON || expanded == kw::NONE) && self.active.is_json_ld_10() {
                return Err(err(ErrorCode::InvalidTypeMapping, format!("{expanded} type requires JSON-LD 1.1")));
            }
            if !keyword_type && !iri::is_absolute(&expanded) {
                return Err(err(ErrorCode::InvalidTypeMapping, format!("@type '{expanded}' is not an absolute IRI")));
            }
            definition.type_mapping = Some(expanded);
        }

        // Step 14
        if let Some(reverse) = value.get(kw::REVERSE) {
            if value.contains_key(kw::ID) || value.contains_key(kw::NEST) {
                return Err(err(ErrorCode::InvalidReverseProperty, format!("reverse term '{term}' cannot have @id or @nest")));
            }
            let reverse = reverse
                .as_str()
                .ok_or_else(|| err(ErrorCode::InvalidIriMapping, format!("@reverse of '{term}' must be a string")))?;
            if is_keyword_form(reverse) {
                tracing::warn!(term, reverse, "ignoring keyword-like @reverse value");
                self.defined.insert(term.to_string(), DefineStatus::Defined);
                return Ok(());
            }
            match self.expand_iri(reverse, false, true)? {
                Some(expanded) if expanded.contains(':') => definition.iri = Some(expanded),
                _ => {
                    return Err(err(ErrorCode::InvalidIriMapping, format!("@reverse '{reverse}' is not an IRI")));
                }
            }
            if let Some(container) = value.get(kw::CONTAINER) {
                match container {
                    Value::Null => {}
                    Value::String(s) if s == kw::SET || s == kw::INDEX => {
                        definition.container.insert(Container::parse(s).unwrap_or(Container::Set));
                    }
                    _ => {
                        return Err(err(
                            ErrorCode::InvalidReverseProperty,
                            format!("reverse term '{term}' container must be @set, @index or null"),
                        ));
                    }
                }
            }
            definition.reverse = true;
            self.finish(term, definition, previous)?;
            return Ok(());
        }

        // Step 16-20
        let id_value = value.get(kw::ID);
        if let Some(id) = id_value
            && id.as_str() != Some(term)
        {
            match id {
                Value::Null => definition.iri = None,
                Value::String(id) => {
                    if !is_keyword(id) && is_keyword_form(id) {
                        tracing::warn!(term, id = id.as_str(), "ignoring keyword-like @id value");
                        self.defined.insert(term.to_string(), DefineStatus::Defined);
                        return Ok(());
                    }
                    let expanded = self
                        .expand_iri(id, false, true)?
                        .ok_or_else(|| err(ErrorCode::InvalidIriMapping, format!("@id of '{term}' does not expand")))?;
                    if !is_keyword(&expanded) && !expanded.contains(':') {
                        return Err(err(ErrorCode::InvalidIriMapping, format!("'{expanded}' is not an IRI")));
                    }
                    if expanded == kw::CONTEXT {
                        return Err(err(ErrorCode::InvalidKeywordAlias, "@context cannot be aliased"));
                    }

                    let inner_colon = term
                        .char_indices()
                        .any(|(i, c)| c == ':' && i > 0 && i + 1 < term.len());
                    if inner_colon || term.contains('/') {
                        self.defined.insert(term.to_string(), DefineStatus::Defined);
                        let term_iri = self.expand_iri(term, false, true)?;
                        if term_iri.as_deref() != Some(expanded.as_str()) {
                            return Err(err(
                                ErrorCode::InvalidIriMapping,
                                format!("term '{term}' looks like an IRI that differs from its @id"),
                            ));
                        }
                        self.defined.insert(term.to_string(), DefineStatus::Defining);
                    }

                    if !term.contains(':')
                        && !term.contains('/')
                        && simple_term
                        && (iri::ends_with_gen_delim(&expanded) || iri::is_blank_node_id(&expanded))
                    {
                        definition.prefix = true;
                    }
                    definition.iri = Some(expanded);
                }
                other => {
                    return Err(err(ErrorCode::InvalidIriMapping, format!("@id of '{term}' must be a string, found {other}")));
                }
            }
        } else if let Some((idx, _)) = term.char_indices().skip(1).find(|(_, c)| *c == ':') {
            // Step 17
            let prefix = &term[..idx];
            let suffix = &term[idx + 1..];
            if self.local.contains_key(prefix) {
                self.create_term_definition(prefix)?;
            }
            definition.iri = match self.active.term(prefix).and_then(|d| d.iri.as_ref()) {
                Some(prefix_iri) => Some(format!("{prefix_iri}{suffix}")),
                None => Some(term.to_string()),
            };
        } else if term.contains('/') {
            // Step 18
            match self.expand_iri(term, false, true)? {
                Some(expanded) if iri::is_absolute(&expanded) => definition.iri = Some(expanded),
                _ => {
                    return Err(err(ErrorCode::InvalidIriMapping, format!("relative term '{term}' has no IRI")));
                }
            }
        } else if term == kw::TYPE {
            // Step 19
            definition.iri = Some(kw::TYPE.to_string());
        } else if let Some(vocab) = &self.active.vocab {
            // Step 20
            definition.iri = Some(format!("{vocab}{term}"));
        } else {
            return Err(err(ErrorCode::InvalidIriMapping, format!("term '{term}' has no IRI mapping and no @vocab is set")));
        }

        // Step 21
        if let Some(container) = value.get(kw::CONTAINER) {
            definition.container = self.parse_container(term, container)?;
            if definition.has_container(Container::Type) {
                match definition.type_mapping.as_deref() {
                    None => definition.type_mapping = Some(kw::ID.to_string()),
                    Some(kw::ID) | Some(kw::VOCAB) => {}
                    Some(other) => {
                        return Err(err(
                            ErrorCode::InvalidTypeMapping,
                            format!("type map term '{term}' cannot have @type {other}"),
                        ));
                    }
                }
            }
        }

        // Step 22
        if let Some(index) = value.get(kw::INDEX) {
            if self.active.is_json_ld_10() || !definition.has_container(Container::Index) {
                return Err(err(ErrorCode::InvalidTermDefinition, format!("@index on '{term}' requires an @index container")));
            }
            let index = index
                .as_str()
                .ok_or_else(|| err(ErrorCode::InvalidTermDefinition, "@index must be a string"))?;
            match self.expand_iri(index, false, true)? {
                Some(expanded) if iri::is_absolute(&expanded) && !is_keyword(index) => {}
                _ => {
                    return Err(err(ErrorCode::InvalidTermDefinition, format!("@index '{index}' is not an IRI")));
                }
            }
            definition.index = Some(index.to_string());
        }

        // Step 23
        if let Some(context) = value.get(kw::CONTEXT) {
            if self.active.is_json_ld_10() {
                return Err(err(ErrorCode::InvalidTermDefinition, "scoped contexts require JSON-LD 1.1"));
            }
            let mut remote = self.remote_contexts.to_vec();
            let flags = ContextFlags {
                override_protected: true,
                propagate: true,
                validate_scoped: false,
            };
            process_context(self.active, context, self.base_url, &mut remote, flags, self.options).map_err(|e| {
                err(ErrorCode::InvalidScopedContext, format!("scoped context of '{term}': {e}"))
            })?;
            definition.context = Some(context.clone());
            definition.base_url = self.base_url.map(str::to_string);
        }

        // Step 24
        if let Some(lang) = value.get(kw::LANGUAGE)
            && !value.contains_key(kw::TYPE)
        {
            definition.language = Some(match lang {
                Value::Null => None,
                Value::String(s) => {
                    language::check(s);
                    Some(s.clone())
                }
                _ => {
                    return Err(err(ErrorCode::InvalidLanguageMapping, format!("@language of '{term}' must be a string or null")));
                }
            });
        }

        // Step 25
        if let Some(direction) = value.get(kw::DIRECTION)
            && !value.contains_key(kw::TYPE)
        {
            definition.direction = Some(match direction {
                Value::Null => None,
                Value::String(s) => Some(Direction::parse(s).ok_or_else(|| {
                    err(ErrorCode::InvalidBaseDirection, format!("invalid @direction '{s}'"))
                })?),
                _ => {
                    return Err(err(ErrorCode::InvalidBaseDirection, "@direction must be a string or null"));
                }
            });
        }

        // Step 26
        if let Some(nest) = value.get(kw::NEST) {
            if self.active.is_json_ld_10() {
                return Err(err(ErrorCode::InvalidTermDefinition, "@nest requires JSON-LD 1.1"));
            }
            match nest.as_str() {
                Some(n) if n == kw::NEST || !is_keyword(n) => definition.nest = Some(n.to_string()),
                _ => {
                    return Err(err(ErrorCode::InvalidKeywordNestValue, format!("invalid @nest value on '{term}'")));
                }
            }
        }

        // Step 27
        if let Some(prefix) = value.get(kw::PREFIX) {
            if self.active.is_json_ld_10() || term.contains(':') || term.contains('/') {
                return Err(err(ErrorCode::InvalidTermDefinition, format!("@prefix is not allowed on '{term}'")));
            }
            definition.prefix = prefix
                .as_bool()
                .ok_or_else(|| err(ErrorCode::InvalidKeywordPrefixValue, "@prefix must be a boolean"))?;
            if definition.prefix && definition.iri.as_deref().is_some_and(is_keyword) {
                return Err(err(ErrorCode::InvalidTermDefinition, "a keyword alias cannot be a prefix"));
            }
        }

        // Step 28
        if let Some(extra) = value.keys().find(|k| !TERM_ENTRIES.contains(&k.as_str())) {
            return Err(err(ErrorCode::InvalidTermDefinition, format!("unexpected entry '{extra}' in definition of '{term}'")));
        }

        self.finish(term, definition, previous)
    }

    /// Step 29-30: protected term checks, then store the definition.
    fn finish(&mut self, term: &str, definition: TermDefinition, previous: Option<TermDefinition>) -> Result<()> {
        let definition = match previous {
            Some(previous) if !self.override_protected && previous.protected => {
                if !previous.same_definition(&definition) {
                    return Err(err(ErrorCode::ProtectedTermRedefinition, format!("protected term '{term}' cannot be redefined")));
                }
                previous
            }
            _ => definition,
        };
        self.active.set_term(term, definition);
        self.defined.insert(term.to_string(), DefineStatus::Defined);
        Ok(())
    }

    fn parse_container(&self, term: &str, value: &Value) -> Result<BTreeSet<Container>> {
        let invalid = || err(ErrorCode::InvalidContainerMapping, format!("invalid @container on '{term}'"));

        if self.active.is_json_ld_10() {
            let s = value.as_str().ok_or_else(invalid)?;
            let container = Container::parse(s).ok_or_else(invalid)?;
            if matches!(container, Container::Graph | Container::Id | Container::Type) {
                return Err(invalid());
            }
            return Ok([container].into_iter().collect());
        }

        let mut containers = BTreeSet::new();
        let items: &[Value] = match value {
            Value::Array(items) => items,
            Value::String(_) => std::slice::from_ref(value),
            Value::Null => return Ok(containers),
            _ => return Err(invalid()),
        };
        for item in items {
            let container = item.as_str().and_then(Container::parse).ok_or_else(invalid)?;
            containers.insert(container);
        }

        let mut rest: BTreeSet<Container> = containers.clone();
        rest.remove(&Container::Set);
        let valid = if containers.contains(&Container::List) {
            containers.len() == 1
        } else if rest.contains(&Container::Graph) {
            rest.remove(&Container::Graph);
            rest.is_empty() || (rest.len() == 1 && (rest.contains(&Container::Id) || rest.contains(&Container::Index)))
        } else {
            rest.len() <= 1
        };
        if !valid {
            return Err(invalid());
        }
        Ok(containers)
    }
}
