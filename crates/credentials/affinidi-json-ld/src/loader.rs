/*!
 * Remote document loading.
 *
 * Processing never touches the network itself: remote documents and remote
 * `@context` references go through a [`DocumentLoader`] supplied in
 * [`crate::JsonLdOptions`]. [`StaticDocumentLoader`] serves a fixed set of
 * preloaded documents, which is what tests and offline deployments want.
 */

use std::collections::HashMap;
use std::fmt::Debug;

use serde_json::Value;

use crate::error::{JsonLdError, Result};
use crate::model::Dataset;
use crate::rdf::{NQuadsProvider, RdfProvider};

pub const JSON_LD_CONTENT_TYPE: &str = "application/ld+json";
pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const NQUADS_CONTENT_TYPE: &str = "application/n-quads";

/// Body of a loaded document.
#[derive(Clone, Debug, PartialEq)]
pub enum DocumentContent {
    Json(Value),
    Rdf(Dataset),
}

/// A document together with the metadata of its retrieval.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteDocument {
    /// Final URL after redirects; used as the base IRI.
    pub document_url: Option<String>,
    /// Context from an HTTP `Link` header.
    pub context_url: Option<String>,
    pub content_type: Option<String>,
    pub profile: Option<String>,
    pub content: DocumentContent,
}

impl RemoteDocument {
    pub fn json(document: Value) -> Self {
        RemoteDocument {
            document_url: None,
            context_url: None,
            content_type: Some(JSON_LD_CONTENT_TYPE.to_string()),
            profile: None,
            content: DocumentContent::Json(document),
        }
    }

    pub fn rdf(dataset: Dataset) -> Self {
        RemoteDocument {
            document_url: None,
            context_url: None,
            content_type: Some(NQUADS_CONTENT_TYPE.to_string()),
            profile: None,
            content: DocumentContent::Rdf(dataset),
        }
    }

    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = Some(url.into());
        self
    }

    pub fn with_context_url(mut self, url: impl Into<String>) -> Self {
        self.context_url = Some(url.into());
        self
    }

    pub fn as_json(&self) -> Option<&Value> {
        match &self.content {
            DocumentContent::Json(v) => Some(v),
            DocumentContent::Rdf(_) => None,
        }
    }

    pub fn into_json(self) -> Result<Value> {
        match self.content {
            DocumentContent::Json(v) => Ok(v),
            DocumentContent::Rdf(_) => Err(JsonLdError::loading_document(format!(
                "expected a JSON document at {}",
                self.document_url.as_deref().unwrap_or("<inline>")
            ))),
        }
    }
}

/// Resolves URLs to documents.
pub trait DocumentLoader: Send + Sync + Debug {
    /// Loads the document at `url`. Failures are reported with
    /// `LOADING_DOCUMENT_FAILED`; callers loading contexts remap the code.
    fn load(&self, url: &str) -> Result<RemoteDocument>;
}

/// Serves preloaded documents keyed by URL.
#[derive(Clone, Debug, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, RemoteDocument>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a JSON document.
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        let url = url.into();
        let remote = RemoteDocument::json(document).with_document_url(url.clone());
        self.documents.insert(url, remote);
        self
    }

    /// Registers an N-Quads document.
    pub fn with_nquads(mut self, url: impl Into<String>, nquads: &str) -> Result<Self> {
        let url = url.into();
        let dataset = NQuadsProvider.read(NQUADS_CONTENT_TYPE, nquads)?;
        let remote = RemoteDocument::rdf(dataset).with_document_url(url.clone());
        self.documents.insert(url, remote);
        Ok(self)
    }

    /// Registers a fully described remote document, keyed by its `document_url`.
    pub fn with_remote(mut self, url: impl Into<String>, document: RemoteDocument) -> Self {
        self.documents.insert(url.into(), document);
        self
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(&self, url: &str) -> Result<RemoteDocument> {
        let found = self.documents.get(url).cloned();
        match found {
            Some(doc) => {
                tracing::debug!(url, "loaded static document");
                Ok(doc)
            }
            None => Err(JsonLdError::loading_document(format!("no document registered for {url}"))),
        }
    }
}

/// Input to a processor operation: an inline document or a URL to load.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonLdInput {
    Document(RemoteDocument),
    Url(String),
}

impl JsonLdInput {
    pub fn url(url: impl Into<String>) -> Self {
        JsonLdInput::Url(url.into())
    }
}

impl From<Value> for JsonLdInput {
    fn from(value: Value) -> Self {
        JsonLdInput::Document(RemoteDocument::json(value))
    }
}

impl From<Dataset> for JsonLdInput {
    fn from(dataset: Dataset) -> Self {
        JsonLdInput::Document(RemoteDocument::rdf(dataset))
    }
}

impl From<RemoteDocument> for JsonLdInput {
    fn from(doc: RemoteDocument) -> Self {
        JsonLdInput::Document(doc)
    }
}
