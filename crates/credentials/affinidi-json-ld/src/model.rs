use std::collections::HashSet;
use std::fmt;

use indexmap::IndexSet;

use crate::nquads::escape::escape_literal;

/// An IRI-identified RDF node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    pub iri: String,
}

impl NamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

/// A blank (anonymous) RDF node. The `id` field stores the label without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    pub id: String,
}

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Builds a blank node from a `_:`-prefixed JSON-LD identifier.
    pub fn from_identifier(identifier: &str) -> Self {
        Self::new(identifier.strip_prefix("_:").unwrap_or(identifier))
    }

    /// The `_:`-prefixed form used by JSON-LD documents.
    pub fn identifier(&self) -> String {
        format!("_:{}", self.id)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

/// An RDF literal value with datatype and optional language tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: NamedNode,
    pub language: Option<String>,
}

impl Literal {
    /// Create a plain string literal (xsd:string).
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: NamedNode::new(xsd::STRING),
            language: None,
        }
    }

    /// Create a typed literal.
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype,
            language: None,
        }
    }

    /// Create a language-tagged literal (rdf:langString).
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: NamedNode::new(rdf::LANG_STRING),
            language: Some(language.into()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_literal(&self.value))?;
        if let Some(ref lang) = self.language {
            write!(f, "@{lang}")
        } else if self.datatype.iri != xsd::STRING {
            write!(f, "^^{}", self.datatype)
        } else {
            Ok(())
        }
    }
}

/// An IRI or blank node, used in subject and predicate position.
///
/// Predicates are only blank nodes in generalized RDF.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Named(NamedNode),
    Blank(BlankNode),
}

impl Resource {
    /// Parses a JSON-LD node identifier: `_:` prefixed strings are blank nodes.
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.starts_with("_:") {
            Self::Blank(BlankNode::from_identifier(identifier))
        } else {
            Self::Named(NamedNode::new(identifier))
        }
    }

    /// The JSON-LD identifier form (`_:` prefixed for blank nodes).
    pub fn identifier(&self) -> String {
        match self {
            Self::Named(n) => n.iri.clone(),
            Self::Blank(b) => b.identifier(),
        }
    }

    pub fn is_iri(&self, iri: &str) -> bool {
        matches!(self, Self::Named(n) if n.iri == iri)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
        }
    }
}

impl From<NamedNode> for Resource {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Resource {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

/// The object of an RDF quad.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Object {
    Named(NamedNode),
    Blank(BlankNode),
    Literal(Literal),
}

impl Object {
    pub fn is_iri(&self, iri: &str) -> bool {
        matches!(self, Self::Named(n) if n.iri == iri)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
            Self::Literal(l) => l.fmt(f),
        }
    }
}

impl From<NamedNode> for Object {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Object {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

impl From<Literal> for Object {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<Resource> for Object {
    fn from(r: Resource) -> Self {
        match r {
            Resource::Named(n) => Self::Named(n),
            Resource::Blank(b) => Self::Blank(b),
        }
    }
}

/// The graph label of an RDF quad.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphLabel {
    Named(NamedNode),
    Blank(BlankNode),
    Default,
}

impl GraphLabel {
    /// The JSON-LD graph name: `@default` for the default graph.
    pub fn identifier(&self) -> String {
        match self {
            Self::Named(n) => n.iri.clone(),
            Self::Blank(b) => b.identifier(),
            Self::Default => "@default".to_string(),
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
            Self::Default => Ok(()),
        }
    }
}

impl From<Resource> for GraphLabel {
    fn from(r: Resource) -> Self {
        match r {
            Resource::Named(n) => Self::Named(n),
            Resource::Blank(b) => Self::Blank(b),
        }
    }
}

/// An RDF quad (subject, predicate, object, graph).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Resource,
    pub predicate: Resource,
    pub object: Object,
    pub graph: GraphLabel,
}

impl Quad {
    pub fn new(
        subject: impl Into<Resource>,
        predicate: impl Into<Resource>,
        object: impl Into<Object>,
        graph: GraphLabel,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            graph,
        }
    }

    /// Blank node labels (without `_:`) appearing in subject, object or graph position.
    pub fn blank_node_ids(&self) -> impl Iterator<Item = &str> {
        let subject = match &self.subject {
            Resource::Blank(b) => Some(b.id.as_str()),
            Resource::Named(_) => None,
        };
        let object = match &self.object {
            Object::Blank(b) => Some(b.id.as_str()),
            _ => None,
        };
        let graph = match &self.graph {
            GraphLabel::Blank(b) => Some(b.id.as_str()),
            _ => None,
        };
        subject.into_iter().chain(object).chain(graph)
    }

    /// Returns true if this quad references the given blank node ID in subject, object, or graph.
    pub fn references_blank_node(&self, id: &str) -> bool {
        self.blank_node_ids().any(|b| b == id)
    }
}

/// An ordered, duplicate-free collection of RDF quads.
///
/// Quads keep their insertion order; inserting a quad that is already present is a no-op.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    quads: IndexSet<Quad>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quad, returning false if an identical quad was already present.
    pub fn add(&mut self, quad: Quad) -> bool {
        self.quads.insert(quad)
    }

    pub fn contains(&self, quad: &Quad) -> bool {
        self.quads.contains(quad)
    }

    pub fn quads(&self) -> &IndexSet<Quad> {
        &self.quads
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.quads.iter()
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Graph labels in first-seen order, the default graph first when present.
    pub fn graph_names(&self) -> Vec<&GraphLabel> {
        let mut names: IndexSet<&GraphLabel> = self.quads.iter().map(|q| &q.graph).collect();
        if let Some(idx) = names.get_index_of(&GraphLabel::Default) {
            names.move_index(idx, 0);
        }
        names.into_iter().collect()
    }

    /// The quads belonging to one graph.
    pub fn graph<'a>(&'a self, label: &'a GraphLabel) -> impl Iterator<Item = &'a Quad> + 'a {
        self.quads.iter().filter(move |q| &q.graph == label)
    }

    /// Returns the set of all blank node IDs in this dataset.
    pub fn blank_nodes(&self) -> HashSet<String> {
        self.quads
            .iter()
            .flat_map(|q| q.blank_node_ids())
            .map(str::to_string)
            .collect()
    }

    /// Returns all quads that reference the given blank node ID.
    pub fn quads_for_blank_node(&self, id: &str) -> Vec<&Quad> {
        self.quads
            .iter()
            .filter(|q| q.references_blank_node(id))
            .collect()
    }
}

/// Datasets compare as sets; insertion order is ignored.
impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|q| other.contains(q))
    }
}

impl Eq for Dataset {}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        Self {
            quads: iter.into_iter().collect(),
        }
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        self.quads.extend(iter);
    }
}

/// XSD namespace constants.
pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
}

/// RDF namespace constants.
pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
    pub const LIST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#List";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    pub const JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";
    pub const VALUE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#value";
    pub const LANGUAGE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#language";
    pub const DIRECTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#direction";
}

/// Base IRI of the `i18n-datatype` direction encoding.
pub const I18N_BASE: &str = "https://www.w3.org/ns/i18n#";
