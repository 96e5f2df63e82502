//! URDNA2015 RDF dataset normalization.
//!
//! Produces a canonical relabeling of blank nodes (`_:c14n0`, `_:c14n1`...)
//! so that isomorphic datasets serialize to identical N-Quads.

pub mod hash_first_degree;
pub mod hash_ndegree;
pub mod hash_related;
pub mod identifier_issuer;

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};

use crate::error::{RdfError, RdfResult};
use crate::model::{BlankNode, Dataset, GraphLabel, Object, Quad, Resource};
use crate::nquads;

use hash_first_degree::{hash_first_degree_quads, hex_encode};
use identifier_issuer::IdentifierIssuer;

/// The only supported normalization algorithm name.
pub const URDNA2015: &str = "URDNA2015";

/// Normalizes a dataset. The result is ordered by serialized N-Quad.
pub fn normalize(dataset: &Dataset) -> RdfResult<Dataset> {
    normalize_with_limit(dataset, None)
}

/// Normalizes a dataset, failing with [`RdfError::PermutationLimitExceeded`]
/// once more than `permutation_limit` orderings have been explored.
pub fn normalize_with_limit(dataset: &Dataset, permutation_limit: Option<usize>) -> RdfResult<Dataset> {
    Canonicalizer::new(dataset, permutation_limit).run()
}

/// Normalizes with a named algorithm. Only `URDNA2015` (any case) is accepted.
pub fn normalize_with_algorithm(dataset: &Dataset, algorithm: &str) -> RdfResult<Dataset> {
    if !algorithm.eq_ignore_ascii_case(URDNA2015) {
        return Err(RdfError::UnsupportedAlgorithm(algorithm.to_string()));
    }
    normalize(dataset)
}

/// Normalizes and serializes to canonical N-Quads.
pub fn to_nquads(dataset: &Dataset) -> RdfResult<String> {
    Ok(nquads::serialize_dataset(&normalize(dataset)?))
}

/// SHA-256 of the canonical N-Quads form.
pub fn canonicalize_and_hash(dataset: &Dataset) -> RdfResult<[u8; 32]> {
    Ok(Sha256::digest(to_nquads(dataset)?.as_bytes()).into())
}

/// Lowercase hex SHA-256 of the canonical N-Quads form.
pub fn hash_hex(dataset: &Dataset) -> RdfResult<String> {
    Ok(hex_encode(canonicalize_and_hash(dataset)?))
}

/// State shared by the hashing steps of one normalization run.
pub(crate) struct Canonicalizer<'a> {
    quads: Vec<&'a Quad>,
    blank_to_quads: HashMap<&'a str, Vec<&'a Quad>>,
    first_degree: HashMap<&'a str, String>,
    canonical: IdentifierIssuer,
    permutation_limit: Option<usize>,
    permutations: Cell<usize>,
}

impl<'a> Canonicalizer<'a> {
    fn new(dataset: &'a Dataset, permutation_limit: Option<usize>) -> Self {
        let quads: Vec<&'a Quad> = dataset.iter().collect();

        // Step 2: blank node to quads map.
        let mut blank_to_quads: HashMap<&'a str, Vec<&'a Quad>> = HashMap::new();
        for &quad in &quads {
            let mut ids: Vec<&'a str> = quad.blank_node_ids().collect();
            ids.sort_unstable();
            ids.dedup();
            for id in ids {
                blank_to_quads.entry(id).or_default().push(quad);
            }
        }

        let first_degree = blank_to_quads
            .iter()
            .map(|(&id, quads)| (id, hash_first_degree_quads(id, quads)))
            .collect();

        Self {
            quads,
            blank_to_quads,
            first_degree,
            canonical: IdentifierIssuer::new("_:c14n"),
            permutation_limit,
            permutations: Cell::new(0),
        }
    }

    pub(crate) fn quads_for(&self, id: &str) -> impl Iterator<Item = &'a Quad> + '_ {
        self.blank_to_quads
            .get(id)
            .into_iter()
            .flat_map(|quads| quads.iter().copied())
    }

    fn run(mut self) -> RdfResult<Dataset> {
        let mut non_normalized: Vec<&'a str> = self.blank_to_quads.keys().copied().collect();
        non_normalized.sort_unstable();

        // Step 3-5: issue identifiers for unique first-degree hashes until none remain.
        let mut hash_to_blank: BTreeMap<String, Vec<&'a str>>;
        loop {
            hash_to_blank = BTreeMap::new();
            for &id in &non_normalized {
                if let Some(hash) = self.first_degree.get(id) {
                    hash_to_blank.entry(hash.clone()).or_default().push(id);
                }
            }

            let mut issued = Vec::new();
            hash_to_blank.retain(|hash, ids| {
                if ids.len() == 1 {
                    tracing::trace!(%hash, blank_node = ids[0], "unique first-degree hash");
                    issued.push(ids[0]);
                    false
                } else {
                    true
                }
            });
            if issued.is_empty() {
                break;
            }
            for id in issued {
                self.canonical.issue(id);
                non_normalized.retain(|&n| n != id);
            }
        }

        // Step 6: N-degree hashing for the shared hashes, in hash order.
        for ids in hash_to_blank.values() {
            let mut hash_path_list = Vec::new();
            for &id in ids {
                if self.canonical.is_issued(id) {
                    continue;
                }
                let mut temporary = IdentifierIssuer::new("_:b");
                temporary.issue(id);
                hash_path_list.push(self.hash_ndegree_quads(id, temporary)?);
            }

            hash_path_list.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, issuer) in hash_path_list {
                for existing in issuer.issued_order() {
                    self.canonical.issue(existing);
                }
            }
        }

        tracing::debug!(
            quads = self.quads.len(),
            blank_nodes = self.canonical.len(),
            permutations = self.permutations.get(),
            "normalized dataset"
        );

        // Step 7: relabel and order by serialized form.
        let mut relabeled: Vec<(String, Quad)> = self
            .quads
            .iter()
            .map(|q| {
                let quad = self.relabel(q);
                (nquads::serialize_quad(&quad), quad)
            })
            .collect();
        relabeled.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(relabeled.into_iter().map(|(_, q)| q).collect())
    }

    fn canonical_node(&self, node: &BlankNode) -> BlankNode {
        match self.canonical.get(&node.id) {
            Some(id) => BlankNode::from_identifier(id),
            None => node.clone(),
        }
    }

    fn relabel(&self, quad: &Quad) -> Quad {
        let subject = match &quad.subject {
            Resource::Blank(b) => Resource::Blank(self.canonical_node(b)),
            other => other.clone(),
        };
        let object = match &quad.object {
            Object::Blank(b) => Object::Blank(self.canonical_node(b)),
            other => other.clone(),
        };
        let graph = match &quad.graph {
            GraphLabel::Blank(b) => GraphLabel::Blank(self.canonical_node(b)),
            other => other.clone(),
        };
        Quad {
            subject,
            predicate: quad.predicate.clone(),
            object,
            graph,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn p(name: &str) -> NamedNode {
        NamedNode::new(format!("http://example.org/{name}"))
    }

    #[test]
    fn no_blank_nodes_sorted() {
        let mut ds = Dataset::new();
        ds.add(Quad::new(p("s2"), p("p"), p("o2"), GraphLabel::Default));
        ds.add(Quad::new(p("s1"), p("p"), p("o1"), GraphLabel::Default));

        let out = to_nquads(&ds).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0] < lines[1]);
    }

    #[test]
    fn single_blank_node() {
        let mut ds = Dataset::new();
        ds.add(Quad::new(BlankNode::new("x"), p("p"), Literal::new("v"), GraphLabel::Default));
        assert_eq!(
            to_nquads(&ds).unwrap(),
            "_:c14n0 <http://example.org/p> \"v\" .\n"
        );
    }

    #[test]
    fn algorithm_name_checked() {
        let ds = Dataset::new();
        assert!(normalize_with_algorithm(&ds, "urdna2015").is_ok());
        assert!(matches!(
            normalize_with_algorithm(&ds, "URGNA2012"),
            Err(RdfError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn permutation_limit_enforced() {
        // A ring of indistinguishable blank nodes forces n-degree hashing.
        let mut ds = Dataset::new();
        for (a, b) in [("a", "b"), ("b", "c"), ("c", "a")] {
            ds.add(Quad::new(BlankNode::new(a), p("next"), BlankNode::new(b), GraphLabel::Default));
        }
        assert!(matches!(
            normalize_with_limit(&ds, Some(1)),
            Err(RdfError::PermutationLimitExceeded(1))
        ));
        assert!(normalize_with_limit(&ds, None).is_ok());
    }
}
