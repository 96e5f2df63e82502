use std::collections::BTreeMap;

use super::Canonicalizer;
use super::hash_first_degree::sha256_hex;
use super::hash_related::related_blank_nodes;
use super::identifier_issuer::IdentifierIssuer;
use crate::error::{RdfError, RdfResult};

impl<'a> Canonicalizer<'a> {
    /// Hash N-Degree Quads.
    ///
    /// Explores every ordering of each group of equally-hashed related blank
    /// nodes and keeps the lexicographically smallest path. Returns the hash and
    /// the issuer extended with the identifiers chosen along that path.
    pub(crate) fn hash_ndegree_quads(
        &self,
        id: &str,
        mut issuer: IdentifierIssuer,
    ) -> RdfResult<(String, IdentifierIssuer)> {
        // Step 1-3: group related blank nodes by their related hash.
        let mut hash_to_related: BTreeMap<String, Vec<&'a str>> = BTreeMap::new();
        for quad in self.quads_for(id) {
            for (related, position) in related_blank_nodes(quad, id) {
                let hash = self.hash_related_blank_node(related, quad, &issuer, position);
                let group = hash_to_related.entry(hash).or_default();
                if !group.contains(&related) {
                    group.push(related);
                }
            }
        }

        // Step 4-5
        let mut data_to_hash = String::new();
        for (hash, mut related) in hash_to_related {
            data_to_hash.push_str(&hash);

            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<IdentifierIssuer> = None;

            related.sort_unstable();
            loop {
                self.count_permutation()?;
                if let Some((path, issuer_copy)) =
                    self.try_permutation(&related, &issuer, &chosen_path)?
                    && (chosen_path.is_empty() || path < chosen_path)
                {
                    chosen_path = path;
                    chosen_issuer = Some(issuer_copy);
                }
                if !next_permutation(&mut related) {
                    break;
                }
            }

            data_to_hash.push_str(&chosen_path);
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((sha256_hex(&data_to_hash), issuer))
    }

    /// Builds the path for one ordering of related nodes. Returns `None` as soon
    /// as the path can no longer beat `chosen_path`.
    fn try_permutation(
        &self,
        permutation: &[&'a str],
        issuer: &IdentifierIssuer,
        chosen_path: &str,
    ) -> RdfResult<Option<(String, IdentifierIssuer)>> {
        let mut issuer_copy = issuer.clone();
        let mut path = String::new();
        let mut recursion_list: Vec<&'a str> = Vec::new();

        for &related in permutation {
            if let Some(canonical) = self.canonical.get(related) {
                path.push_str(canonical);
            } else {
                if !issuer_copy.is_issued(related) {
                    recursion_list.push(related);
                }
                path.push_str(&issuer_copy.issue(related));
            }
            if !chosen_path.is_empty() && path.as_str() > chosen_path {
                return Ok(None);
            }
        }

        for related in recursion_list {
            let (hash, result_issuer) = self.hash_ndegree_quads(related, issuer_copy.clone())?;
            path.push_str(&issuer_copy.issue(related));
            path.push('<');
            path.push_str(&hash);
            path.push('>');
            issuer_copy = result_issuer;
            if !chosen_path.is_empty() && path.as_str() > chosen_path {
                return Ok(None);
            }
        }

        Ok(Some((path, issuer_copy)))
    }

    fn count_permutation(&self) -> RdfResult<()> {
        let count = self.permutations.get() + 1;
        self.permutations.set(count);
        match self.permutation_limit {
            Some(limit) if count > limit => Err(RdfError::PermutationLimitExceeded(limit)),
            _ => Ok(()),
        }
    }
}

/// Advances `items` to the next lexicographic permutation. Returns false once
/// the last permutation has been produced.
pub(crate) fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    let n = items.len();
    if n <= 1 {
        return false;
    }

    let mut i = n - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let pivot = i - 1;

    let mut j = n - 1;
    while items[j] <= items[pivot] {
        j -= 1;
    }

    items.swap(pivot, j);
    items[pivot + 1..].reverse();
    true
}
