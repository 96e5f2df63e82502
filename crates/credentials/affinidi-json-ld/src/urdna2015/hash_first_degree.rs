use sha2::{Digest, Sha256};

use crate::model::{BlankNode, GraphLabel, Object, Quad, Resource};
use crate::nquads;

/// Hash First Degree Quads.
///
/// Every quad mentioning the blank node is serialized with that node written
/// as `_:a` and any other blank node as `_:z`; the sorted lines are hashed.
pub fn hash_first_degree_quads(blank_node_id: &str, quads: &[&Quad]) -> String {
    let mut lines: Vec<String> = quads
        .iter()
        .map(|q| {
            let mut line = nquads::serialize_quad(&substitute(q, blank_node_id));
            line.push('\n');
            line
        })
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
    }
    hex_encode(hasher.finalize())
}

fn placeholder(id: &str, reference: &str) -> BlankNode {
    BlankNode::new(if id == reference { "a" } else { "z" })
}

/// Rewrites subject, object and graph blank nodes for first-degree hashing.
pub(crate) fn substitute(quad: &Quad, reference: &str) -> Quad {
    let subject = match &quad.subject {
        Resource::Blank(b) => Resource::Blank(placeholder(&b.id, reference)),
        other => other.clone(),
    };
    let object = match &quad.object {
        Object::Blank(b) => Object::Blank(placeholder(&b.id, reference)),
        other => other.clone(),
    };
    let graph = match &quad.graph {
        GraphLabel::Blank(b) => GraphLabel::Blank(placeholder(&b.id, reference)),
        other => other.clone(),
    };
    Quad {
        subject,
        predicate: quad.predicate.clone(),
        object,
        graph,
    }
}

pub(crate) fn sha256_hex(data: &str) -> String {
    hex_encode(Sha256::digest(data.as_bytes()))
}

/// Lowercase hex encoding.
pub(crate) fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";
    let bytes = bytes.as_ref();
    let mut s = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        s.push(HEX_DIGITS[(b >> 4) as usize] as char);
        s.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn reference_becomes_a_and_others_z() {
        let quad = Quad::new(
            BlankNode::new("b0"),
            NamedNode::new("http://example.org/p"),
            BlankNode::new("b1"),
            GraphLabel::Blank(BlankNode::new("b0")),
        );
        assert_eq!(
            nquads::serialize_quad(&substitute(&quad, "b0")),
            "_:a <http://example.org/p> _:z _:a ."
        );
    }

    #[test]
    fn hash_ignores_original_labels() {
        let make = |label: &str| {
            Quad::new(
                BlankNode::new(label),
                NamedNode::new("http://example.org/p"),
                Literal::new("v"),
                GraphLabel::Default,
            )
        };
        let (q1, q2) = (make("x"), make("something-else"));
        let h1 = hash_first_degree_quads("x", &[&q1]);
        assert_eq!(h1.len(), 64);
        assert_eq!(h1, hash_first_degree_quads("something-else", &[&q2]));
    }

    #[test]
    fn sha256_of_empty_string() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
