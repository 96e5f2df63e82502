//! Inverse context and term selection, used by compaction to pick the best
//! term for an IRI given the shape of the value being compacted.

use std::collections::HashMap;

use super::{ActiveContext, Direction};
use crate::keywords as kw;

/// Term tables for one container key of one IRI.
#[derive(Clone, Debug, Default)]
pub struct TypeLanguageMap {
    pub language: HashMap<String, String>,
    pub type_map: HashMap<String, String>,
    pub any: HashMap<String, String>,
}

impl TypeLanguageMap {
    fn select(&self, type_language: &str) -> &HashMap<String, String> {
        match type_language {
            kw::TYPE => &self.type_map,
            kw::LANGUAGE => &self.language,
            _ => &self.any,
        }
    }
}

/// IRI → container key → `@language`/`@type`/`@any` → value → term.
#[derive(Clone, Debug, Default)]
pub struct InverseContext {
    entries: HashMap<String, HashMap<String, TypeLanguageMap>>,
}

fn insert_absent(map: &mut HashMap<String, String>, key: impl Into<String>, term: &str) {
    map.entry(key.into()).or_insert_with(|| term.to_string());
}

fn lang_dir(language: Option<&str>, direction: Option<Direction>) -> String {
    match (language, direction) {
        (Some(lang), Some(dir)) => format!("{}_{dir}", lang.to_lowercase()),
        (Some(lang), None) => lang.to_lowercase(),
        (None, Some(dir)) => format!("_{dir}"),
        (None, None) => kw::NULL.to_string(),
    }
}

impl InverseContext {
    /// Inverse Context Creation.
    pub fn new(active: &ActiveContext) -> Self {
        let mut inverse = InverseContext::default();

        let default_language = active.default_language.as_deref().map(str::to_lowercase);
        let default_direction = active.default_direction;

        // Step 3: shortest term first, ties broken lexicographically
        let mut terms: Vec<_> = active.terms().collect();
        terms.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        for (term, definition) in terms {
            let Some(iri) = &definition.iri else {
                continue;
            };
            let container = definition.container_key();
            let entry = inverse
                .entries
                .entry(iri.clone())
                .or_default()
                .entry(container)
                .or_insert_with(|| {
                    let mut entry = TypeLanguageMap::default();
                    insert_absent(&mut entry.any, kw::NONE, term);
                    entry
                });

            if definition.reverse {
                insert_absent(&mut entry.type_map, kw::REVERSE, term);
            } else if definition.type_mapping.as_deref() == Some(kw::NONE) {
                insert_absent(&mut entry.language, kw::ANY, term);
                insert_absent(&mut entry.type_map, kw::ANY, term);
            } else if let Some(type_mapping) = &definition.type_mapping {
                insert_absent(&mut entry.type_map, type_mapping.clone(), term);
            } else if let (Some(language), Some(direction)) = (&definition.language, &definition.direction) {
                insert_absent(&mut entry.language, lang_dir(language.as_deref(), *direction), term);
            } else if let Some(language) = &definition.language {
                let key = language.as_deref().map_or_else(|| kw::NULL.to_string(), str::to_lowercase);
                insert_absent(&mut entry.language, key, term);
            } else if let Some(direction) = &definition.direction {
                let key = direction.map_or_else(|| kw::NONE.to_string(), |d| format!("_{d}"));
                insert_absent(&mut entry.language, key, term);
            } else if default_direction.is_some() {
                insert_absent(&mut entry.language, lang_dir(default_language.as_deref(), default_direction), term);
                insert_absent(&mut entry.language, kw::NONE, term);
                insert_absent(&mut entry.type_map, kw::NONE, term);
            } else {
                let key = default_language.clone().unwrap_or_else(|| kw::NONE.to_string());
                insert_absent(&mut entry.language, key, term);
                insert_absent(&mut entry.language, kw::NONE, term);
                insert_absent(&mut entry.type_map, kw::NONE, term);
            }
        }
        inverse
    }

    pub fn contains(&self, iri: &str) -> bool {
        self.entries.contains_key(iri)
    }

    /// Term Selection: the first term registered for `iri` under any of
    /// `containers` whose `type_language` table has one of `preferred_values`.
    pub fn select_term(
        &self,
        iri: &str,
        containers: &[&str],
        type_language: &str,
        preferred_values: &[String],
    ) -> Option<&str> {
        let container_map = self.entries.get(iri)?;
        for container in containers {
            let Some(entry) = container_map.get(*container) else {
                continue;
            };
            let table = entry.select(type_language);
            for value in preferred_values {
                if let Some(term) = table.get(value) {
                    return Some(term.as_str());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Container, TermDefinition};
    use crate::options::ProcessingMode;

    fn context() -> ActiveContext {
        let mut ctx = ActiveContext::new(None, ProcessingMode::JsonLd11);
        ctx.default_language = Some("EN".into());
        ctx.set_term(
            "name",
            TermDefinition {
                iri: Some("http://schema.org/name".into()),
                ..Default::default()
            },
        );
        ctx.set_term(
            "nameDe",
            TermDefinition {
                iri: Some("http://schema.org/name".into()),
                language: Some(Some("de".into())),
                ..Default::default()
            },
        );
        ctx.set_term(
            "knows",
            TermDefinition {
                iri: Some("http://schema.org/knows".into()),
                type_mapping: Some("@id".into()),
                container: [Container::Set].into_iter().collect(),
                ..Default::default()
            },
        );
        ctx
    }

    #[test]
    fn language_selection() {
        let inverse = InverseContext::new(&context());
        let pick = |lang: &str| {
            inverse
                .select_term("http://schema.org/name", &["@none"], "@language", &[lang.to_string(), "@none".to_string()])
                .map(str::to_string)
        };
        assert_eq!(pick("de").as_deref(), Some("nameDe"));
        assert_eq!(pick("en").as_deref(), Some("name"));
        assert_eq!(pick("fr").as_deref(), Some("name"));
    }

    #[test]
    fn type_and_container_selection() {
        let inverse = InverseContext::new(&context());
        assert_eq!(
            inverse.select_term("http://schema.org/knows", &["@set", "@none"], "@type", &["@id".to_string()]),
            Some("knows")
        );
        assert_eq!(
            inverse.select_term("http://schema.org/knows", &["@list"], "@type", &["@id".to_string()]),
            None
        );
        assert!(!inverse.contains("http://schema.org/other"));
    }

    #[test]
    fn shortest_term_wins() {
        let mut ctx = ActiveContext::new(None, ProcessingMode::JsonLd11);
        for term in ["longer", "b", "a"] {
            ctx.set_term(
                term,
                TermDefinition {
                    iri: Some("http://example.org/p".into()),
                    ..Default::default()
                },
            );
        }
        let inverse = ctx.inverse();
        assert_eq!(
            inverse.select_term("http://example.org/p", &["@none"], "@language", &["@none".to_string()]),
            Some("a")
        );
    }
}
