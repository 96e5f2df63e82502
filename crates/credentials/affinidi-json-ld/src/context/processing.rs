//! Context Processing: turns a local context into a new active context.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::term::TermBuilder;
use super::{ActiveContext, Direction};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::json;
use crate::keywords as kw;
use crate::language;
use crate::options::JsonLdOptions;

/// Flags controlling how a local context may change the active context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextFlags {
    /// Allow redefining or clearing protected terms (property-scoped contexts).
    pub override_protected: bool,
    /// Whether the result survives into node objects below the one that defined it.
    pub propagate: bool,
    /// Re-validate remote contexts that were already seen.
    pub validate_scoped: bool,
}

impl Default for ContextFlags {
    fn default() -> Self {
        ContextFlags {
            override_protected: false,
            propagate: true,
            validate_scoped: true,
        }
    }
}

const CONTEXT_KEYWORDS: &[&str] = &[
    kw::BASE,
    kw::DIRECTION,
    kw::IMPORT,
    kw::LANGUAGE,
    kw::PROPAGATE,
    kw::PROTECTED,
    kw::VERSION,
    kw::VOCAB,
];

fn err(code: ErrorCode, msg: impl std::fmt::Display) -> JsonLdError {
    JsonLdError::new(code, msg)
}

/// Processes `local` against `active` and returns the resulting context.
///
/// `base_url` is the location of the document the local context came from and
/// is used to resolve relative context references. `remote_contexts` tracks
/// dereferenced context URLs to detect recursion.
pub fn process_context(
    active: &ActiveContext,
    local: &Value,
    base_url: Option<&str>,
    remote_contexts: &mut Vec<String>,
    flags: ContextFlags,
    options: &JsonLdOptions,
) -> Result<ActiveContext> {
    // Step 1
    let mut result = active.clone();
    let mut propagate = flags.propagate;
    if let Some(value) = local.get(kw::PROPAGATE)
        && let Some(b) = value.as_bool()
    {
        propagate = b;
    }

    // Step 2
    if !propagate && result.previous_context.is_none() {
        result.previous_context = Some(Arc::new(active.clone()));
    }

    // Step 3-5
    for context in json::as_slice(local) {
        match context {
            Value::Null => {
                if !flags.override_protected && result.has_protected_terms() {
                    return Err(err(
                        ErrorCode::InvalidContextNullification,
                        "cannot clear a context containing protected terms",
                    ));
                }
                let previous = result.clone();
                result = active.reset();
                if !propagate {
                    result.previous_context = Some(Arc::new(previous));
                }
            }
            Value::String(reference) => {
                result = process_remote(&result, reference, base_url, remote_contexts, flags, options)?;
            }
            Value::Object(definition) => {
                process_definition(&mut result, definition, base_url, remote_contexts, flags, options)?;
            }
            other => {
                return Err(err(ErrorCode::InvalidLocalContext, format!("a context must be a map, string or null, found {other}")));
            }
        }
    }

    result.clear_inverse();
    Ok(result)
}

fn process_remote(
    result: &ActiveContext,
    reference: &str,
    base_url: Option<&str>,
    remote_contexts: &mut Vec<String>,
    flags: ContextFlags,
    options: &JsonLdOptions,
) -> Result<ActiveContext> {
    // Step 5.2.1
    let url = iri::resolve(base_url, reference);
    if !iri::is_absolute(&url) {
        return Err(JsonLdError::loading_document(format!("context reference '{reference}' is not an IRI")));
    }

    // Step 5.2.2
    if !flags.validate_scoped && remote_contexts.contains(&url) {
        tracing::trace!(url, "remote context already validated");
        return Ok(result.clone());
    }

    // Step 5.2.3
    if remote_contexts.len() >= options.max_remote_contexts {
        return Err(err(
            ErrorCode::ContextOverflow,
            format!("more than {} remote contexts while loading {url}", options.max_remote_contexts),
        ));
    }
    remote_contexts.push(url.clone());

    // Step 5.2.4-5
    let loader = options.document_loader.as_ref().ok_or_else(|| {
        err(ErrorCode::LoadingRemoteContextFailed, format!("no document loader configured to load {url}"))
    })?;
    let document = loader
        .load(&url)
        .map_err(|e| err(ErrorCode::LoadingRemoteContextFailed, format!("{url}: {}", e.message())))?;
    let document_url = document.document_url.clone().unwrap_or_else(|| url.clone());
    let loaded = document
        .into_json()
        .map_err(|e| err(ErrorCode::LoadingRemoteContextFailed, e.message()))?;
    let Some(context) = loaded.get(kw::CONTEXT) else {
        return Err(err(ErrorCode::InvalidRemoteContext, format!("{url} has no @context entry")));
    };
    tracing::debug!(url, "processing remote context");

    // Step 5.2.6
    let mut nested = remote_contexts.clone();
    process_context(result, context, Some(&document_url), &mut nested, flags, options)
}

fn process_definition(
    result: &mut ActiveContext,
    definition: &Map<String, Value>,
    base_url: Option<&str>,
    remote_contexts: &mut Vec<String>,
    flags: ContextFlags,
    options: &JsonLdOptions,
) -> Result<()> {
    // Step 5.5
    if let Some(version) = definition.get(kw::VERSION) {
        if version.as_f64() != Some(1.1) {
            return Err(err(ErrorCode::InvalidKeywordVersionValue, format!("@version must be 1.1, found {version}")));
        }
        if result.is_json_ld_10() {
            return Err(err(ErrorCode::ProcessingModeConflict, "@version 1.1 used in json-ld-1.0 mode"));
        }
    }

    // Step 5.6
    let imported;
    let definition = match definition.get(kw::IMPORT) {
        Some(import) => {
            imported = import_context(result, import, definition, base_url, options)?;
            &imported
        }
        None => definition,
    };

    // Step 5.7
    if let Some(base) = definition.get(kw::BASE)
        && remote_contexts.is_empty()
    {
        result.base_iri = match base {
            Value::Null => None,
            Value::String(s) if iri::is_absolute(s) => Some(s.clone()),
            Value::String(s) if result.base_iri.is_some() => Some(iri::resolve(result.base_iri.as_deref(), s)),
            other => {
                return Err(err(ErrorCode::InvalidBaseIri, format!("invalid @base {other}")));
            }
        };
    }

    // Step 5.8
    if let Some(vocab) = definition.get(kw::VOCAB) {
        result.vocab = match vocab {
            Value::Null => None,
            Value::String(s) => {
                if result.is_json_ld_10() && !iri::is_absolute_or_blank(s) {
                    return Err(err(ErrorCode::InvalidVocabMapping, format!("@vocab '{s}' must be absolute in json-ld-1.0")));
                }
                match result.expand_iri(s, true, true)? {
                    Some(expanded) if iri::is_absolute_or_blank(&expanded) || expanded.is_empty() => Some(expanded),
                    _ => {
                        return Err(err(ErrorCode::InvalidVocabMapping, format!("@vocab '{s}' is not an IRI")));
                    }
                }
            }
            other => {
                return Err(err(ErrorCode::InvalidVocabMapping, format!("@vocab must be a string or null, found {other}")));
            }
        };
    }

    // Step 5.9
    if let Some(lang) = definition.get(kw::LANGUAGE) {
        result.default_language = match lang {
            Value::Null => None,
            Value::String(s) => {
                language::check(s);
                Some(s.clone())
            }
            other => {
                return Err(err(ErrorCode::InvalidDefaultLanguage, format!("@language must be a string or null, found {other}")));
            }
        };
    }

    // Step 5.10
    if let Some(direction) = definition.get(kw::DIRECTION) {
        if result.is_json_ld_10() {
            return Err(err(ErrorCode::InvalidContextEntry, "@direction requires JSON-LD 1.1"));
        }
        result.default_direction = match direction {
            Value::Null => None,
            Value::String(s) => Some(
                Direction::parse(s).ok_or_else(|| err(ErrorCode::InvalidBaseDirection, format!("invalid @direction '{s}'")))?,
            ),
            other => {
                return Err(err(ErrorCode::InvalidBaseDirection, format!("invalid @direction {other}")));
            }
        };
    }

    // Step 5.11
    if let Some(propagate) = definition.get(kw::PROPAGATE) {
        if result.is_json_ld_10() {
            return Err(err(ErrorCode::InvalidContextEntry, "@propagate requires JSON-LD 1.1"));
        }
        if !propagate.is_boolean() {
            return Err(err(ErrorCode::InvalidKeywordPropagateValue, format!("@propagate must be a boolean, found {propagate}")));
        }
    }

    let protected = match definition.get(kw::PROTECTED) {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(err(ErrorCode::InvalidKeywordProtectedValue, format!("@protected must be a boolean, found {other}")));
        }
    };

    // Step 5.12-13
    let mut builder = TermBuilder {
        active: result,
        local: definition,
        defined: HashMap::new(),
        base_url,
        protected,
        override_protected: flags.override_protected,
        remote_contexts: remote_contexts.as_slice(),
        options,
    };
    for term in definition.keys() {
        if CONTEXT_KEYWORDS.contains(&term.as_str()) {
            continue;
        }
        builder.create_term_definition(term)?;
    }
    Ok(())
}

/// Step 5.6: merges the imported context under the entries of `definition`.
fn import_context(
    result: &ActiveContext,
    import: &Value,
    definition: &Map<String, Value>,
    base_url: Option<&str>,
    options: &JsonLdOptions,
) -> Result<Map<String, Value>> {
    if result.is_json_ld_10() {
        return Err(err(ErrorCode::InvalidContextEntry, "@import requires JSON-LD 1.1"));
    }
    let reference = import
        .as_str()
        .ok_or_else(|| err(ErrorCode::InvalidKeywordImportValue, format!("@import must be a string, found {import}")))?;
    let url = iri::resolve(base_url, reference);

    let loader = options.document_loader.as_ref().ok_or_else(|| {
        err(ErrorCode::LoadingRemoteContextFailed, format!("no document loader configured to load {url}"))
    })?;
    let loaded = loader
        .load(&url)
        .and_then(|doc| doc.into_json())
        .map_err(|e| err(ErrorCode::LoadingRemoteContextFailed, format!("{url}: {}", e.message())))?;

    let Some(Value::Object(imported)) = loaded.get(kw::CONTEXT) else {
        return Err(err(ErrorCode::InvalidRemoteContext, format!("{url} does not contain a context map")));
    };
    if imported.contains_key(kw::IMPORT) {
        return Err(err(ErrorCode::InvalidContextEntry, format!("{url} contains a nested @import")));
    }

    let mut merged = imported.clone();
    for (key, value) in definition {
        if key != kw::IMPORT {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Container;
    use crate::loader::StaticDocumentLoader;
    use crate::options::ProcessingMode;
    use serde_json::json;

    fn process(local: Value) -> Result<ActiveContext> {
        process_with(local, &JsonLdOptions::default())
    }

    fn process_with(local: Value, options: &JsonLdOptions) -> Result<ActiveContext> {
        let active = ActiveContext::new(Some("http://example.org/doc".into()), options.processing_mode);
        process_context(&active, &local, None, &mut Vec::new(), ContextFlags::default(), options)
    }

    #[test]
    fn simple_terms_and_prefixes() {
        let ctx = process(json!({
            "schema": "http://schema.org/",
            "name": "schema:name",
            "knows": {"@id": "schema:knows", "@type": "@id"}
        }))
        .unwrap();
        assert!(ctx.term("schema").unwrap().prefix);
        assert_eq!(ctx.term("name").unwrap().iri.as_deref(), Some("http://schema.org/name"));
        assert_eq!(ctx.term("knows").unwrap().type_mapping.as_deref(), Some("@id"));
    }

    #[test]
    fn terms_defined_out_of_order() {
        let ctx = process(json!({
            "name": "ex:name",
            "ex": "http://example.org/"
        }))
        .unwrap();
        assert_eq!(ctx.term("name").unwrap().iri.as_deref(), Some("http://example.org/name"));
    }

    #[test]
    fn cyclic_definition() {
        let err = process(json!({"a": "b:x", "b": "a:y"})).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CyclicIriMapping);
    }

    #[test]
    fn vocab_language_direction() {
        let ctx = process(json!({
            "@vocab": "http://vocab.org/",
            "@language": "en-US",
            "@direction": "rtl"
        }))
        .unwrap();
        assert_eq!(ctx.vocab.as_deref(), Some("http://vocab.org/"));
        assert_eq!(ctx.default_language.as_deref(), Some("en-US"));
        assert_eq!(ctx.default_direction, Some(Direction::Rtl));
    }

    #[test]
    fn relative_vocab_resolves_against_base() {
        let ctx = process(json!({"@vocab": ""})).unwrap();
        assert_eq!(ctx.vocab.as_deref(), Some("http://example.org/doc"));
    }

    #[test]
    fn invalid_entries() {
        assert_eq!(process(json!(42)).unwrap_err().code(), ErrorCode::InvalidLocalContext);
        assert_eq!(process(json!({"@version": 1.0})).unwrap_err().code(), ErrorCode::InvalidKeywordVersionValue);
        assert_eq!(process(json!({"@language": 7})).unwrap_err().code(), ErrorCode::InvalidDefaultLanguage);
        assert_eq!(process(json!({"@direction": "up"})).unwrap_err().code(), ErrorCode::InvalidBaseDirection);
        assert_eq!(process(json!({"@propagate": "no"})).unwrap_err().code(), ErrorCode::InvalidKeywordPropagateValue);
        assert_eq!(process(json!({"@id": "http://x"})).unwrap_err().code(), ErrorCode::KeywordRedefinition);
        assert_eq!(process(json!({"x": {"@id": "@context"}})).unwrap_err().code(), ErrorCode::InvalidKeywordAlias);
        assert_eq!(process(json!({"x": {"foo": 1, "@id": "http://x"}})).unwrap_err().code(), ErrorCode::InvalidTermDefinition);
        assert_eq!(
            process(json!({"x": {"@id": "http://x", "@container": ["@list", "@set"]}})).unwrap_err().code(),
            ErrorCode::InvalidContainerMapping
        );
    }

    #[test]
    fn version_conflicts_with_json_ld_10() {
        let options = JsonLdOptions::default().with_processing_mode(ProcessingMode::JsonLd10);
        let err = process_with(json!({"@version": 1.1}), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProcessingModeConflict);
    }

    #[test]
    fn protected_terms() {
        let active = process(json!({"@protected": true, "name": "http://schema.org/name"})).unwrap();
        assert!(active.term("name").unwrap().protected);

        let options = JsonLdOptions::default();
        let redefine = json!({"name": "http://other.org/name"});
        let err = process_context(&active, &redefine, None, &mut Vec::new(), ContextFlags::default(), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProtectedTermRedefinition);

        let same = json!({"name": "http://schema.org/name"});
        assert!(process_context(&active, &same, None, &mut Vec::new(), ContextFlags::default(), &options).is_ok());

        let err = process_context(&active, &Value::Null, None, &mut Vec::new(), ContextFlags::default(), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidContextNullification);

        let flags = ContextFlags {
            override_protected: true,
            ..Default::default()
        };
        let cleared = process_context(&active, &Value::Null, None, &mut Vec::new(), flags, &options).unwrap();
        assert!(cleared.is_empty());
    }

    #[test]
    fn remote_and_imported_contexts() {
        let loader = StaticDocumentLoader::new()
            .with_document("http://example.org/ctx.jsonld", json!({"@context": {"name": "http://schema.org/name"}}))
            .with_document("http://example.org/loop.jsonld", json!({"@context": "http://example.org/loop.jsonld"}));
        let options = JsonLdOptions::default().with_document_loader(Arc::new(loader));

        let ctx = process_with(json!("http://example.org/ctx.jsonld"), &options).unwrap();
        assert_eq!(ctx.term("name").unwrap().iri.as_deref(), Some("http://schema.org/name"));

        let ctx = process_with(
            json!({"@import": "http://example.org/ctx.jsonld", "name": {"@id": "http://schema.org/name", "@container": "@set"}}),
            &options,
        )
        .unwrap();
        assert!(ctx.has_container("name", Container::Set));

        let err = process_with(json!("http://example.org/loop.jsonld"), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ContextOverflow);

        let err = process_with(json!("http://example.org/missing.jsonld"), &options).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoadingRemoteContextFailed);
    }

    #[test]
    fn propagate_false_keeps_previous_context() {
        let ctx = process(json!({"@propagate": false, "a": "http://example.org/a"})).unwrap();
        assert!(ctx.previous_context.is_some());
    }
}
