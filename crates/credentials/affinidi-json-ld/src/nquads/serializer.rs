use std::fmt::Write;

use super::escape::escape_literal;
use crate::model::{Dataset, GraphLabel, Object, Quad, Resource, xsd};

fn write_resource(out: &mut String, resource: &Resource) {
    match resource {
        Resource::Named(n) => {
            let _ = write!(out, "<{}>", n.iri);
        }
        Resource::Blank(b) => {
            let _ = write!(out, "_:{}", b.id);
        }
    }
}

/// Serializes one quad as an N-Quads statement, without the trailing newline.
pub fn serialize_quad(quad: &Quad) -> String {
    let mut out = String::with_capacity(128);

    write_resource(&mut out, &quad.subject);
    out.push(' ');
    write_resource(&mut out, &quad.predicate);
    out.push(' ');

    match &quad.object {
        Object::Named(n) => {
            let _ = write!(out, "<{}>", n.iri);
        }
        Object::Blank(b) => {
            let _ = write!(out, "_:{}", b.id);
        }
        Object::Literal(lit) => {
            let _ = write!(out, "\"{}\"", escape_literal(&lit.value));
            if let Some(lang) = &lit.language {
                let _ = write!(out, "@{lang}");
            } else if lit.datatype.iri != xsd::STRING {
                let _ = write!(out, "^^<{}>", lit.datatype.iri);
            }
        }
    }

    match &quad.graph {
        GraphLabel::Named(n) => {
            let _ = write!(out, " <{}>", n.iri);
        }
        GraphLabel::Blank(b) => {
            let _ = write!(out, " _:{}", b.id);
        }
        GraphLabel::Default => {}
    }

    out.push_str(" .");
    out
}

/// Serializes every quad of a dataset, in dataset order, one statement per line.
pub fn serialize_dataset(dataset: &Dataset) -> String {
    serialize_quads(dataset.iter())
}

/// Serializes an arbitrary sequence of quads, each line terminated by `\n`.
pub fn serialize_quads<'a>(quads: impl IntoIterator<Item = &'a Quad>) -> String {
    let mut out = String::new();
    for q in quads {
        out.push_str(&serialize_quad(q));
        out.push('\n');
    }
    out
}
