//! Controlled fencing vocabulary and the term index built from it.
//!
//! A glossary file is a YAML mapping of entry key to entry:
//!
//! ```yaml
//! guardia_di_testa:
//!   term: Guardia di testa
//!   type: Garde
//!   definition: { fr: ..., en: ... }
//! ```
//!
//! Only `term` and `type` drive matching. Everything else is carried through
//! untouched when the glossary is written back.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Markers in an entry `type` that classify it as a technique.
const TECHNIQUE_MARKERS: [&str; 5] = ["Attaque", "Frappe", "Coup", "Technique", "Mouvement"];
const GUARD_MARKER: &str = "Garde";

#[derive(Debug, Error)]
pub enum GlossaryError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Glossary root must be a mapping of entry key to entry")]
    NotAMapping,
    #[error("Failed to compile the term matcher: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Guard,
    Technique,
    None,
}

impl Category {
    /// Classify an entry from its `type` field. Matching is case-sensitive.
    pub fn from_type(kind: &str) -> Self {
        if kind.contains(GUARD_MARKER) {
            Category::Guard
        } else if TECHNIQUE_MARKERS.iter().any(|m| kind.contains(m)) {
            Category::Technique
        } else {
            Category::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Guard => "guard",
            Category::Technique => "technique",
            Category::None => "none",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEntry {
    #[serde(default)]
    term: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlossaryEntry {
    pub key: String,
    /// Trimmed term; `None` when the entry has no usable term.
    pub term: Option<String>,
    pub kind: String,
    pub category: Category,
}

/// A loaded glossary, in file order.
#[derive(Debug, Clone, Default)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
    malformed: Vec<String>,
    source: Mapping,
}

impl Glossary {
    /// Parse a glossary. Entries without a term are kept but reported by
    /// [`Glossary::malformed`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, GlossaryError> {
        let source = match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => return Err(GlossaryError::NotAMapping),
        };

        let mut entries = Vec::with_capacity(source.len());
        let mut malformed = Vec::new();
        for (key, value) in &source {
            let key = match key {
                Value::String(key) => key.clone(),
                other => match serde_yaml::to_string(other) {
                    Ok(key) => key.trim().to_string(),
                    Err(_) => continue,
                },
            };

            let raw: RawEntry = serde_yaml::from_value(value.clone()).unwrap_or_default();
            let term = raw
                .term
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());
            if term.is_none() {
                malformed.push(key.clone());
            }
            let kind = raw.kind.unwrap_or_default();
            entries.push(GlossaryEntry {
                category: Category::from_type(&kind),
                key,
                term,
                kind,
            });
        }

        Ok(Glossary {
            entries,
            malformed,
            source,
        })
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    /// Keys of entries that contribute no term to the matcher.
    pub fn malformed(&self) -> &[String] {
        &self.malformed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the glossary back to YAML with a `category` field on every
    /// entry that lacks one. Existing categories and all other fields are
    /// left as they were.
    pub fn categorized_yaml(&self) -> Result<String, GlossaryError> {
        let mut output = self.source.clone();
        for (_, value) in output.iter_mut() {
            let Value::Mapping(entry) = value else {
                continue;
            };
            if entry.contains_key("category") {
                continue;
            }
            let kind = entry
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let category = Category::from_type(kind);
            entry.insert(
                Value::String("category".to_string()),
                Value::String(category.as_str().to_string()),
            );
        }
        Ok(serde_yaml::to_string(&output)?)
    }
}

/// Lookup tables and the compiled term matcher for one glossary.
#[derive(Debug, Clone)]
pub struct GlossaryIndex {
    term_to_key: HashMap<String, String>,
    categories: HashMap<String, Category>,
    display_terms: HashMap<String, String>,
    matcher: Option<Regex>,
}

impl GlossaryIndex {
    pub fn new(glossary: &Glossary) -> Result<Self, GlossaryError> {
        let mut term_to_key = HashMap::new();
        let mut categories = HashMap::new();
        let mut display_terms = HashMap::new();

        for entry in glossary.entries() {
            categories.insert(entry.key.clone(), entry.category);
            if let Some(term) = &entry.term {
                // Later entries win on a lower-cased collision.
                term_to_key.insert(term.to_lowercase(), entry.key.clone());
                display_terms.insert(entry.key.clone(), term.clone());
            }
        }

        let matcher = build_matcher(term_to_key.keys())?;
        Ok(GlossaryIndex {
            term_to_key,
            categories,
            display_terms,
            matcher,
        })
    }

    /// Key for a term, matched case-insensitively.
    pub fn key_for(&self, term: &str) -> Option<&str> {
        self.term_to_key.get(&term.to_lowercase()).map(String::as_str)
    }

    pub fn category(&self, key: &str) -> Category {
        self.categories.get(key).copied().unwrap_or(Category::None)
    }

    /// Term as written in the glossary, falling back to the key itself.
    pub fn display_term<'a>(&'a self, key: &'a str) -> &'a str {
        self.display_terms
            .get(key)
            .map(String::as_str)
            .unwrap_or(key)
    }

    /// Whole-word, case-insensitive matcher over every term, or `None` for
    /// an empty glossary.
    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    pub fn term_count(&self) -> usize {
        self.term_to_key.len()
    }
}

fn build_matcher<'a>(
    terms: impl Iterator<Item = &'a String>,
) -> Result<Option<Regex>, GlossaryError> {
    let mut terms: Vec<&String> = terms.collect();
    if terms.is_empty() {
        return Ok(None);
    }
    // Longest first so multi-word terms win over the words they contain.
    terms.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.cmp(b))
    });

    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let matcher = RegexBuilder::new(&format!(r"\b({alternation})\b"))
        .case_insensitive(true)
        .size_limit(64 * (1 << 20))
        .build()?;
    Ok(Some(matcher))
}

/// Sorted, de-duplicated display terms for `keys` in `category`.
pub fn display_terms_in(
    index: &GlossaryIndex,
    keys: &[String],
    category: Category,
) -> Vec<String> {
    keys.iter()
        .filter(|key| index.category(key) == category)
        .map(|key| index.display_term(key).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Count of entries per derived category.
pub fn category_counts(glossary: &Glossary) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for entry in glossary.entries() {
        *counts.entry(entry.category.as_str()).or_insert(0) += 1;
    }
    counts
}
