/*!
 * Processing options shared by every JSON-LD operation.
 *
 * Options can be built in code with the `with_*` methods or deserialized from
 * the camelCase JSON form used by JSON-LD API options objects.
 */

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorCode, JsonLdError, Result};
use crate::loader::DocumentLoader;

/// Default upper bound on remote contexts dereferenced while processing one document.
pub const DEFAULT_MAX_REMOTE_CONTEXTS: usize = 32;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    #[serde(rename = "json-ld-1.0")]
    JsonLd10,
    #[default]
    #[serde(rename = "json-ld-1.1")]
    JsonLd11,
}

impl ProcessingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonLd10 => "json-ld-1.0",
            Self::JsonLd11 => "json-ld-1.1",
        }
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How base direction is carried into RDF.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RdfDirection {
    /// Datatype IRI `https://www.w3.org/ns/i18n#{language}_{direction}`.
    #[serde(rename = "i18n-datatype")]
    I18nDatatype,
    /// Blank node carrying `rdf:value`, `rdf:language` and `rdf:direction`.
    #[serde(rename = "compound-literal")]
    CompoundLiteral,
}

/// Framing `@embed` policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Embed {
    #[serde(rename = "@always")]
    Always,
    #[default]
    #[serde(rename = "@once")]
    Once,
    #[serde(rename = "@never")]
    Never,
}

impl Embed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "@always",
            Self::Once => "@once",
            Self::Never => "@never",
        }
    }

    /// Parses an `@embed` keyword value. `true`/`false` are the 1.0 spellings.
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(true) => Ok(Self::Once),
            Value::Bool(false) => Ok(Self::Never),
            Value::String(s) => match s.as_str() {
                "@always" => Ok(Self::Always),
                "@once" | "@last" | "@link" => Ok(Self::Once),
                "@never" => Ok(Self::Never),
                other => Err(JsonLdError::new(
                    ErrorCode::InvalidKeywordEmbedValue,
                    format!("unknown @embed value '{other}'"),
                )),
            },
            other => Err(JsonLdError::new(
                ErrorCode::InvalidKeywordEmbedValue,
                format!("@embed must be a string or boolean, found {other}"),
            )),
        }
    }
}

/// Options accepted by every [`crate::processor`] operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdOptions {
    /// Base IRI overriding the document location.
    pub base: Option<String>,
    /// Replace single-element arrays by their element when compacting.
    pub compact_arrays: bool,
    /// Compact IRIs relative to the base.
    pub compact_to_relative: bool,
    /// Loader for remote documents and contexts. Without one, any remote reference fails.
    #[serde(skip)]
    pub document_loader: Option<Arc<dyn DocumentLoader>>,
    /// Context applied before the document's own contexts during expansion.
    pub expand_context: Option<Value>,
    /// Visit map entries in lexicographic key order.
    pub ordered: bool,
    pub processing_mode: ProcessingMode,
    /// Keep triples with blank node predicates when producing RDF.
    pub produce_generalized_rdf: bool,
    pub rdf_direction: Option<RdfDirection>,
    /// Convert `xsd:boolean`, `xsd:integer` and `xsd:double` literals to native JSON values.
    pub use_native_types: bool,
    /// Keep `rdf:type` as a regular property instead of `@type`.
    pub use_rdf_type: bool,
    pub embed: Embed,
    pub explicit: bool,
    pub omit_default: bool,
    /// Omit the top-level `@graph` when framing produces a single node. Defaults by processing mode.
    pub omit_graph: Option<bool>,
    pub require_all: bool,
    /// Maximum number of remote contexts dereferenced for one document.
    pub max_remote_contexts: usize,
    /// Abort normalization after this many blank node orderings. `None` is unlimited.
    pub permutation_limit: Option<usize>,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        JsonLdOptions {
            base: None,
            compact_arrays: true,
            compact_to_relative: true,
            document_loader: None,
            expand_context: None,
            ordered: false,
            processing_mode: ProcessingMode::JsonLd11,
            produce_generalized_rdf: true,
            rdf_direction: None,
            use_native_types: false,
            use_rdf_type: false,
            embed: Embed::Once,
            explicit: false,
            omit_default: false,
            omit_graph: None,
            require_all: false,
            max_remote_contexts: DEFAULT_MAX_REMOTE_CONTEXTS,
            permutation_limit: None,
        }
    }
}

impl JsonLdOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_compact_arrays(mut self, compact_arrays: bool) -> Self {
        self.compact_arrays = compact_arrays;
        self
    }

    pub fn with_compact_to_relative(mut self, compact_to_relative: bool) -> Self {
        self.compact_to_relative = compact_to_relative;
        self
    }

    /// Installs the loader used for remote documents and `@context` references.
    /// Example:
    /// ```
    /// use std::sync::Arc;
    /// use affinidi_json_ld::{JsonLdOptions, StaticDocumentLoader};
    /// use serde_json::json;
    ///
    /// let loader = StaticDocumentLoader::new()
    ///     .with_document("https://example.org/ctx", json!({"@context": {"name": "http://schema.org/name"}}));
    /// let options = JsonLdOptions::new().with_document_loader(Arc::new(loader));
    /// assert!(options.document_loader.is_some());
    /// ```
    pub fn with_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }

    pub fn with_expand_context(mut self, context: Value) -> Self {
        self.expand_context = Some(context);
        self
    }

    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn with_processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.processing_mode = mode;
        self
    }

    pub fn with_produce_generalized_rdf(mut self, generalized: bool) -> Self {
        self.produce_generalized_rdf = generalized;
        self
    }

    pub fn with_rdf_direction(mut self, direction: RdfDirection) -> Self {
        self.rdf_direction = Some(direction);
        self
    }

    pub fn with_use_native_types(mut self, native: bool) -> Self {
        self.use_native_types = native;
        self
    }

    pub fn with_use_rdf_type(mut self, use_rdf_type: bool) -> Self {
        self.use_rdf_type = use_rdf_type;
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_omit_default(mut self, omit_default: bool) -> Self {
        self.omit_default = omit_default;
        self
    }

    pub fn with_omit_graph(mut self, omit_graph: bool) -> Self {
        self.omit_graph = Some(omit_graph);
        self
    }

    pub fn with_require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn with_max_remote_contexts(mut self, max: usize) -> Self {
        self.max_remote_contexts = max;
        self
    }

    pub fn with_permutation_limit(mut self, limit: usize) -> Self {
        self.permutation_limit = Some(limit);
        self
    }

    pub fn is_json_ld_10(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd10
    }

    /// Effective `omitGraph`: true under 1.1 unless set explicitly.
    pub fn omit_graph(&self) -> bool {
        self.omit_graph.unwrap_or(!self.is_json_ld_10())
    }
}
