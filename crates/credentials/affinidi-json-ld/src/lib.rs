//! JSON-LD 1.1 processing and RDF dataset normalization.
//!
//! The [`processor`] module holds the public operations (expansion,
//! compaction, flattening, framing, conversion to and from RDF) and
//! [`urdna2015`] canonicalizes the resulting datasets.

pub mod compaction;
pub mod context;
pub mod error;
pub mod expansion;
pub mod flattening;
pub mod framing;
pub mod iri;
pub mod json;
pub mod keywords;
pub mod language;
pub mod loader;
pub mod model;
pub mod nquads;
pub mod options;
pub mod processor;
pub mod rdf;
pub mod urdna2015;

pub use error::{ErrorCode, JsonLdError, RdfError, RdfResult, Result};
pub use loader::{DocumentContent, DocumentLoader, JsonLdInput, RemoteDocument, StaticDocumentLoader};
pub use model::{BlankNode, Dataset, GraphLabel, Literal, NamedNode, Object, Quad, Resource};
pub use options::{Embed, JsonLdOptions, ProcessingMode, RdfDirection};
pub use processor::{compact, expand, flatten, frame, from_rdf, normalize, to_canonical_nquads, to_rdf};
pub use rdf::{NQuadsProvider, RdfProvider};

/// Convenience: convert a JSON-LD document to RDF, canonicalize it with
/// URDNA2015 and return the SHA-256 hash of the canonical N-Quads.
pub fn expand_canonicalize_and_hash(document: &serde_json::Value, options: &JsonLdOptions) -> Result<[u8; 32]> {
    let dataset = to_rdf(document.clone(), options)?;
    Ok(urdna2015::canonicalize_and_hash(&dataset)?)
}
