//! JSON-LD keyword strings and keyword tests.

pub const BASE: &str = "@base";
pub const CONTAINER: &str = "@container";
pub const CONTEXT: &str = "@context";
pub const DEFAULT: &str = "@default";
pub const DIRECTION: &str = "@direction";
pub const EMBED: &str = "@embed";
pub const EXPLICIT: &str = "@explicit";
pub const GRAPH: &str = "@graph";
pub const ID: &str = "@id";
pub const IMPORT: &str = "@import";
pub const INCLUDED: &str = "@included";
pub const INDEX: &str = "@index";
pub const JSON: &str = "@json";
pub const LANGUAGE: &str = "@language";
pub const LIST: &str = "@list";
pub const NEST: &str = "@nest";
pub const NONE: &str = "@none";
pub const NULL: &str = "@null";
pub const OMIT_DEFAULT: &str = "@omitDefault";
pub const PREFIX: &str = "@prefix";
pub const PRESERVE: &str = "@preserve";
pub const PROPAGATE: &str = "@propagate";
pub const PROTECTED: &str = "@protected";
pub const REQUIRE_ALL: &str = "@requireAll";
pub const REVERSE: &str = "@reverse";
pub const SET: &str = "@set";
pub const TYPE: &str = "@type";
pub const VALUE: &str = "@value";
pub const VERSION: &str = "@version";
pub const VOCAB: &str = "@vocab";
pub const ANY: &str = "@any";

const ALL: &[&str] = &[
    BASE,
    CONTAINER,
    CONTEXT,
    DEFAULT,
    DIRECTION,
    EMBED,
    EXPLICIT,
    GRAPH,
    ID,
    IMPORT,
    INCLUDED,
    INDEX,
    JSON,
    LANGUAGE,
    LIST,
    NEST,
    NONE,
    NULL,
    OMIT_DEFAULT,
    PREFIX,
    PRESERVE,
    PROPAGATE,
    PROTECTED,
    REQUIRE_ALL,
    REVERSE,
    SET,
    TYPE,
    VALUE,
    VERSION,
    VOCAB,
];

/// Framing keywords, only meaningful inside a frame.
pub const FRAMING: &[&str] = &[DEFAULT, EMBED, EXPLICIT, OMIT_DEFAULT, REQUIRE_ALL];

pub fn is_keyword(s: &str) -> bool {
    ALL.contains(&s)
}

/// Matches the reserved keyword shape `@` followed by one or more ASCII letters.
///
/// Terms of this shape that are not keywords are ignored with a warning.
pub fn is_keyword_form(s: &str) -> bool {
    s.len() > 1 && s.starts_with('@') && s[1..].bytes().all(|b| b.is_ascii_alphabetic())
}
