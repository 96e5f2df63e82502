//! N-Quads reading and writing.
//!
//! The serializer produces the canonical form used for hashing: one space
//! between terms, ` .` terminator and `\n` after every quad.

pub mod escape;
pub mod parser;
pub mod serializer;

pub use parser::parse;
pub use serializer::{serialize_dataset, serialize_quad};
