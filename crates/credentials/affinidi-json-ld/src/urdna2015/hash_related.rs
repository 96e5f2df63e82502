use super::Canonicalizer;
use super::hash_first_degree::sha256_hex;
use super::identifier_issuer::IdentifierIssuer;
use crate::model::{GraphLabel, Object, Quad, Resource};

/// Where a related blank node sits in the quad that links it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Object,
    Graph,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "s",
            Self::Object => "o",
            Self::Graph => "g",
        }
    }
}

/// Blank nodes of a quad other than `reference`, with their position.
pub(crate) fn related_blank_nodes<'q>(quad: &'q Quad, reference: &str) -> Vec<(&'q str, Position)> {
    let mut related = Vec::with_capacity(3);
    if let Resource::Blank(b) = &quad.subject
        && b.id != reference
    {
        related.push((b.id.as_str(), Position::Subject));
    }
    if let Object::Blank(b) = &quad.object
        && b.id != reference
    {
        related.push((b.id.as_str(), Position::Object));
    }
    if let GraphLabel::Blank(b) = &quad.graph
        && b.id != reference
    {
        related.push((b.id.as_str(), Position::Graph));
    }
    related
}

impl Canonicalizer<'_> {
    /// Hash Related Blank Node.
    ///
    /// The hashed input is the position tag, the predicate for subject and
    /// object positions, then the best identifier known for the related node:
    /// canonical, else temporary, else its first-degree hash.
    pub(crate) fn hash_related_blank_node(
        &self,
        related: &str,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: Position,
    ) -> String {
        let identifier = self
            .canonical
            .get(related)
            .or_else(|| issuer.get(related))
            .or_else(|| self.first_degree.get(related).map(String::as_str))
            .unwrap_or_default();

        let mut input = String::from(position.as_str());
        if position != Position::Graph {
            input.push_str(&quad.predicate.to_string());
        }
        input.push_str(identifier);
        sha256_hex(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn related_skips_reference() {
        let quad = Quad::new(
            BlankNode::new("a"),
            NamedNode::new("http://example.org/p"),
            BlankNode::new("b"),
            GraphLabel::Blank(BlankNode::new("a")),
        );
        assert_eq!(related_blank_nodes(&quad, "a"), vec![("b", Position::Object)]);
        assert_eq!(related_blank_nodes(&quad, "b").len(), 2);
    }
}
