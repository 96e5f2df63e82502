//! Reading and writing RDF datasets in a concrete syntax.

use std::fmt::Debug;

use crate::error::{RdfError, RdfResult};
use crate::loader::NQUADS_CONTENT_TYPE;
use crate::model::Dataset;
use crate::nquads;

/// An RDF syntax the processor can read datasets from and write them to.
pub trait RdfProvider: Send + Sync + Debug {
    /// Media types this provider understands.
    fn content_types(&self) -> &[&str];

    fn read(&self, content_type: &str, input: &str) -> RdfResult<Dataset>;

    fn write(&self, content_type: &str, dataset: &Dataset) -> RdfResult<String>;

    fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type.split(';').next().unwrap_or_default().trim();
        self.content_types().iter().any(|t| t.eq_ignore_ascii_case(essence))
    }
}

/// In-process N-Quads support.
#[derive(Clone, Copy, Debug, Default)]
pub struct NQuadsProvider;

impl RdfProvider for NQuadsProvider {
    fn content_types(&self) -> &[&str] {
        &[NQUADS_CONTENT_TYPE]
    }

    fn read(&self, content_type: &str, input: &str) -> RdfResult<Dataset> {
        if !self.accepts(content_type) {
            return Err(RdfError::UnsupportedContent(content_type.to_string()));
        }
        nquads::parse(input)
    }

    fn write(&self, content_type: &str, dataset: &Dataset) -> RdfResult<String> {
        if !self.accepts(content_type) {
            return Err(RdfError::UnsupportedContent(content_type.to_string()));
        }
        Ok(nquads::serialize_dataset(dataset))
    }
}
