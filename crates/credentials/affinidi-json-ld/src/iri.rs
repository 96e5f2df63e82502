//! IRI classification, reference resolution and relativization.

use iref::{Iri, IriRef};
use tracing::debug;

/// True for strings of the form `scheme:...`, where the scheme is
/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
pub fn is_absolute(iri: &str) -> bool {
    scheme_len(iri).is_some()
}

fn scheme_len(iri: &str) -> Option<usize> {
    let colon = iri.find(':')?;
    let scheme = &iri[..colon];
    let mut bytes = scheme.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() => {}
        _ => return None,
    }
    if bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.')) {
        Some(colon)
    } else {
        None
    }
}

pub fn is_blank_node_id(s: &str) -> bool {
    s.starts_with("_:")
}

/// Absolute IRI or blank node identifier.
pub fn is_absolute_or_blank(s: &str) -> bool {
    is_blank_node_id(s) || is_absolute(s)
}

/// True when the IRI ends with an RFC 3986 gen-delim character.
pub fn ends_with_gen_delim(s: &str) -> bool {
    s.ends_with([':', '/', '?', '#', '[', ']', '@'])
}

/// Resolves `reference` against `base`. Without a usable base, or when the
/// reference is not an IRI reference, it is returned as is.
pub fn resolve(base: Option<&str>, reference: &str) -> String {
    let Some(base) = base.and_then(|b| Iri::new(b).ok()) else {
        return reference.to_string();
    };
    match IriRef::new(reference) {
        Ok(iri_ref) => iri_ref.resolved(base).as_str().to_string(),
        Err(_) => {
            debug!(reference, "not an IRI reference, left unresolved");
            reference.to_string()
        }
    }
}

/// Expresses `iri` relative to `base` where they share scheme and authority.
pub fn relativize(base: Option<&str>, iri: &str) -> String {
    let (Some(base), Ok(target)) = (base.and_then(|b| Iri::new(b).ok()), Iri::new(iri)) else {
        return iri.to_string();
    };
    if base.scheme() != target.scheme() || base.authority() != target.authority() {
        return iri.to_string();
    }
    let relative = target.as_iri_ref().relative_to(base.as_iri_ref());
    if relative.as_str().is_empty() {
        return "./".to_string();
    }
    relative.as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_detection() {
        assert!(is_absolute("http://example.org/"));
        assert!(is_absolute("urn:uuid:1234"));
        assert!(is_absolute("did:example:123"));
        assert!(!is_absolute("relative/path"));
        assert!(!is_absolute("_x:y"));
        assert!(!is_absolute("1http:foo"));
        assert!(is_absolute_or_blank("_:b0"));
    }

    #[test]
    fn rfc3986_normal_examples() {
        let base = Some("http://a/b/c/d;p?q");
        let cases = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../g", "http://a/g"),
            ("../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("g/../h", "http://a/b/c/h"),
        ];
        for (reference, expected) in cases {
            assert_eq!(resolve(base, reference), expected, "resolving {reference}");
        }
    }

    #[test]
    fn resolve_without_base() {
        assert_eq!(resolve(None, "relative"), "relative");
    }

    #[test]
    fn relativize_against_base() {
        let base = Some("http://example.com/a/b/c");
        assert_eq!(relativize(base, "http://example.com/a/b/d"), "d");
        assert_eq!(relativize(base, "http://example.com/a/x"), "../x");
        assert_eq!(relativize(base, "http://other.org/"), "http://other.org/");
        assert_eq!(relativize(Some("https://example.com/a/"), "http://example.com/a/b"), "http://example.com/a/b");
        assert_eq!(relativize(None, "http://example.com/a"), "http://example.com/a");
    }

    #[test]
    fn gen_delims() {
        assert!(ends_with_gen_delim("http://example.org/"));
        assert!(ends_with_gen_delim("http://example.org#"));
        assert!(!ends_with_gen_delim("http://example.org/x"));
    }
}
