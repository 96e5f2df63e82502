//! Conversion between expanded JSON-LD and RDF datasets.

pub mod from_rdf;
pub mod number;
pub mod provider;
pub mod to_rdf;

pub use from_rdf::from_rdf;
pub use provider::{NQuadsProvider, RdfProvider};
pub use to_rdf::to_rdf;
