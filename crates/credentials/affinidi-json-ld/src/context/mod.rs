//! Active contexts and term definitions.
//!
//! An [`ActiveContext`] is immutable once built: processing a local context
//! clones the term table copy-on-write and returns a new context, so scoped
//! contexts and `previous_context` chains share structure cheaply.

pub mod inverse;
pub mod processing;
pub mod term;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::iri;
use crate::keywords::{self as kw, is_keyword, is_keyword_form};
use crate::options::ProcessingMode;

pub use inverse::InverseContext;
pub use processing::{ContextFlags, process_context};

/// Container mapping entries, ordered like their keyword spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    Graph,
    Id,
    Index,
    Language,
    List,
    Set,
    Type,
}

impl Container {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            kw::GRAPH => Self::Graph,
            kw::ID => Self::Id,
            kw::INDEX => Self::Index,
            kw::LANGUAGE => Self::Language,
            kw::LIST => Self::List,
            kw::SET => Self::Set,
            kw::TYPE => Self::Type,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graph => kw::GRAPH,
            Self::Id => kw::ID,
            Self::Index => kw::INDEX,
            Self::Language => kw::LANGUAGE,
            Self::List => kw::LIST,
            Self::Set => kw::SET,
            Self::Type => kw::TYPE,
        }
    }
}

/// Base direction of a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ltr" => Some(Self::Ltr),
            "rtl" => Some(Self::Rtl),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single term definition.
///
/// `language` and `direction` distinguish "not set" (`None`) from an explicit
/// `null` (`Some(None)`), which suppresses the context default.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermDefinition {
    /// `None` when the term is explicitly mapped to null.
    pub iri: Option<String>,
    pub prefix: bool,
    pub protected: bool,
    pub reverse: bool,
    pub base_url: Option<String>,
    pub context: Option<Value>,
    pub container: BTreeSet<Container>,
    pub direction: Option<Option<Direction>>,
    pub index: Option<String>,
    pub language: Option<Option<String>>,
    pub nest: Option<String>,
    pub type_mapping: Option<String>,
}

impl TermDefinition {
    /// Equality ignoring the protected flag, used to allow identical redefinition of protected terms.
    pub fn same_definition(&self, other: &TermDefinition) -> bool {
        self.iri == other.iri
            && self.prefix == other.prefix
            && self.reverse == other.reverse
            && self.base_url == other.base_url
            && self.context == other.context
            && self.container == other.container
            && self.direction == other.direction
            && self.index == other.index
            && self.language == other.language
            && self.nest == other.nest
            && self.type_mapping == other.type_mapping
    }

    pub fn has_container(&self, container: Container) -> bool {
        self.container.contains(&container)
    }

    /// The container mapping as the concatenated, sorted keyword string used by inverse contexts.
    pub fn container_key(&self) -> String {
        if self.container.is_empty() {
            return kw::NONE.to_string();
        }
        self.container.iter().map(Container::as_str).collect()
    }
}

/// The context in effect at some point of processing.
#[derive(Clone, Debug)]
pub struct ActiveContext {
    terms: Arc<IndexMap<String, TermDefinition>>,
    pub base_iri: Option<String>,
    pub original_base_url: Option<String>,
    pub vocab: Option<String>,
    pub default_language: Option<String>,
    pub default_direction: Option<Direction>,
    pub previous_context: Option<Arc<ActiveContext>>,
    pub processing_mode: ProcessingMode,
    inverse: OnceLock<Arc<InverseContext>>,
}

impl ActiveContext {
    pub fn new(base_iri: Option<String>, processing_mode: ProcessingMode) -> Self {
        ActiveContext {
            terms: Arc::new(IndexMap::new()),
            original_base_url: base_iri.clone(),
            base_iri,
            vocab: None,
            default_language: None,
            default_direction: None,
            previous_context: None,
            processing_mode,
            inverse: OnceLock::new(),
        }
    }

    pub fn is_json_ld_10(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd10
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&String, &TermDefinition)> {
        self.terms.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn has_protected_terms(&self) -> bool {
        self.terms.values().any(|d| d.protected)
    }

    pub(crate) fn set_term(&mut self, term: &str, definition: TermDefinition) {
        self.inverse = OnceLock::new();
        Arc::make_mut(&mut self.terms).insert(term.to_string(), definition);
    }

    pub(crate) fn remove_term(&mut self, term: &str) -> Option<TermDefinition> {
        if !self.terms.contains_key(term) {
            return None;
        }
        self.inverse = OnceLock::new();
        Arc::make_mut(&mut self.terms).shift_remove(term)
    }

    /// A fresh context carrying over only the base and processing mode.
    pub(crate) fn reset(&self) -> Self {
        ActiveContext::new(self.original_base_url.clone(), self.processing_mode)
    }

    /// The inverse context, built on first use.
    pub fn inverse(&self) -> Arc<InverseContext> {
        self.inverse
            .get_or_init(|| Arc::new(InverseContext::new(self)))
            .clone()
    }

    pub(crate) fn clear_inverse(&mut self) {
        self.inverse = OnceLock::new();
    }

    /// Container mapping of a term, empty when the term is undefined.
    pub fn container(&self, term: &str) -> BTreeSet<Container> {
        self.term(term)
            .map(|d| d.container.clone())
            .unwrap_or_default()
    }

    pub fn has_container(&self, term: &str, container: Container) -> bool {
        self.term(term).is_some_and(|d| d.has_container(container))
    }

    /// IRI Expansion without a local context.
    ///
    /// Returns `None` for null mappings and for keyword-like strings that are
    /// not keywords; the latter are ignored with a warning.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Result<Option<String>> {
        // Step 1
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        // Step 2
        if is_keyword_form(value) {
            tracing::warn!(value, "ignoring keyword-like value");
            return Ok(None);
        }

        let definition = self.term(value);
        // Step 4
        if let Some(def) = definition
            && let Some(mapped) = &def.iri
            && is_keyword(mapped)
        {
            return Ok(Some(mapped.clone()));
        }
        // Step 5
        if vocab && let Some(def) = definition {
            return Ok(def.iri.clone());
        }

        // Step 6
        if let Some(idx) = value.find(':')
            && idx > 0
        {
            let (prefix, suffix) = (&value[..idx], &value[idx + 1..]);
            if prefix == "_" || suffix.starts_with("//") {
                return Ok(Some(value.to_string()));
            }
            if let Some(def) = self.term(prefix)
                && let Some(prefix_iri) = &def.iri
                && def.prefix
            {
                return Ok(Some(format!("{prefix_iri}{suffix}")));
            }
            if iri::is_absolute(value) {
                return Ok(Some(value.to_string()));
            }
        }

        // Step 7
        if vocab && let Some(vocab_iri) = &self.vocab {
            return Ok(Some(format!("{vocab_iri}{value}")));
        }
        // Step 8
        if document_relative {
            return Ok(Some(iri::resolve(self.base_iri.as_deref(), value)));
        }
        Ok(Some(value.to_string()))
    }

    /// Vocabulary-relative IRI expansion, the common case for keys and types.
    pub fn expand_vocab(&self, value: &str) -> Result<Option<String>> {
        self.expand_iri(value, false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_with(terms: &[(&str, &str, bool)]) -> ActiveContext {
        let mut ctx = ActiveContext::new(Some("http://example.org/base/".into()), ProcessingMode::JsonLd11);
        for (term, iri, prefix) in terms {
            ctx.set_term(
                term,
                TermDefinition {
                    iri: Some(iri.to_string()),
                    prefix: *prefix,
                    ..Default::default()
                },
            );
        }
        ctx
    }

    #[test]
    fn expand_iri_uses_terms_and_prefixes() {
        let ctx = context_with(&[
            ("name", "http://schema.org/name", false),
            ("schema", "http://schema.org/", true),
            ("id", "@id", false),
        ]);
        assert_eq!(ctx.expand_vocab("name").unwrap().as_deref(), Some("http://schema.org/name"));
        assert_eq!(ctx.expand_vocab("schema:knows").unwrap().as_deref(), Some("http://schema.org/knows"));
        assert_eq!(ctx.expand_iri("id", false, false).unwrap().as_deref(), Some("@id"));
        assert_eq!(ctx.expand_vocab("_:b0").unwrap().as_deref(), Some("_:b0"));
        assert_eq!(ctx.expand_vocab("@ignored").unwrap(), None);
    }

    #[test]
    fn expand_iri_relative() {
        let mut ctx = context_with(&[]);
        assert_eq!(
            ctx.expand_iri("doc", true, false).unwrap().as_deref(),
            Some("http://example.org/base/doc")
        );
        assert_eq!(ctx.expand_vocab("doc").unwrap().as_deref(), Some("doc"));
        ctx.vocab = Some("http://vocab.org/".into());
        assert_eq!(ctx.expand_vocab("doc").unwrap().as_deref(), Some("http://vocab.org/doc"));
    }

    #[test]
    fn container_key_sorted() {
        let def = TermDefinition {
            container: [Container::Set, Container::Index].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(def.container_key(), "@index@set");
        assert_eq!(TermDefinition::default().container_key(), "@none");
    }

    #[test]
    fn copy_on_write_terms() {
        let base = context_with(&[("a", "http://example.org/a", false)]);
        let mut derived = base.clone();
        derived.set_term("b", TermDefinition::default());
        assert!(base.term("b").is_none());
        assert!(derived.term("a").is_some());
    }
}
