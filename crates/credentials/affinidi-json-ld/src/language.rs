//! BCP47 language tag checks.
//!
//! Only the shape is validated: `[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*`.
//! Malformed tags are kept but reported, since processors must not reject them.

/// Returns true for well-formed language tags.
pub fn is_well_formed(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let Some(primary) = subtags.next() else {
        return false;
    };
    let valid = |s: &str, f: fn(&u8) -> bool| (1..=8).contains(&s.len()) && s.as_bytes().iter().all(f);
    valid(primary, u8::is_ascii_alphabetic) && subtags.all(|s| valid(s, u8::is_ascii_alphanumeric))
}

/// Emits a warning for malformed tags. Returns whether the tag was well formed.
pub fn check(tag: &str) -> bool {
    let ok = is_well_formed(tag);
    if !ok {
        tracing::warn!(language = tag, "malformed BCP47 language tag");
    }
    ok
}
