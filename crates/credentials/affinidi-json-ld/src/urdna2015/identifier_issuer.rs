use indexmap::IndexMap;

/// Issues sequential blank node identifiers (`_:c14n0`, `_:c14n1`...).
///
/// Keys are the existing labels without `_:`; issued identifiers carry the
/// prefix verbatim, so an issuer built with `"_:c14n"` hands out `_:c14n0`.
/// Issuance order is preserved because it decides canonical labels when one
/// issuer is replayed into another.
#[derive(Clone, Debug)]
pub struct IdentifierIssuer {
    prefix: String,
    counter: usize,
    issued: IndexMap<String, String>,
}

impl IdentifierIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: IndexMap::new(),
        }
    }

    /// Returns the identifier for `existing`, issuing a new one on first use.
    pub fn issue(&mut self, existing: &str) -> String {
        if let Some(id) = self.issued.get(existing) {
            return id.clone();
        }
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.issued.insert(existing.to_string(), id.clone());
        id
    }

    /// Issues an identifier that is not bound to any existing label.
    pub fn fresh(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        id
    }

    pub fn is_issued(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }

    pub fn get(&self, existing: &str) -> Option<&str> {
        self.issued.get(existing).map(String::as_str)
    }

    /// Existing labels in the order identifiers were issued for them.
    pub fn issued_order(&self) -> impl Iterator<Item = &str> {
        self.issued.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
