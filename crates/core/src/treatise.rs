//! Treatise section records and their YAML representation.
//!
//! Sections are the unit persisted and exchanged between the extraction and
//! annotation passes. Keys this crate does not model are kept in `extra`
//! maps so a load, annotate, save cycle never drops data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreatiseError {
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("YAML root is not a list of sections")]
    NotASectionList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub metadata: SectionMetadata,
    pub content: SectionContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMetadata {
    pub master: String,
    pub work: String,
    pub book: u32,
    pub chapter: u32,
    pub year: i32,
}

/// Section text, keyed by language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en_versions: Option<Vec<EnglishVersion>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnglishVersion {
    #[serde(default)]
    pub translator: String,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub weapons: Option<Vec<String>>,
    #[serde(default)]
    pub weapon_type: Option<String>,
    #[serde(default)]
    pub guards_mentioned: Option<Vec<String>>,
    #[serde(default)]
    pub techniques: Option<Vec<String>>,
    #[serde(default)]
    pub measures: Option<Vec<String>>,
    #[serde(default)]
    pub strategy: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Annotation {
    /// An annotation with every list empty and every scalar unset.
    pub fn stub(section_id: &str) -> Self {
        Annotation {
            id: format!("{section_id}_ann"),
            note: None,
            weapons: Some(Vec::new()),
            weapon_type: None,
            guards_mentioned: Some(Vec::new()),
            techniques: Some(Vec::new()),
            measures: Some(Vec::new()),
            strategy: Some(Vec::new()),
            extra: BTreeMap::new(),
        }
    }
}

/// Parse a YAML document whose root is a list of sections.
pub fn sections_from_yaml(yaml: &str) -> Result<Vec<Section>, TreatiseError> {
    let value: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    if !value.is_sequence() {
        return Err(TreatiseError::NotASectionList);
    }
    Ok(serde_yaml::from_value(value)?)
}

/// Serialize sections to YAML. Multi-line text is written as literal blocks.
pub fn sections_to_yaml(sections: &[Section]) -> Result<String, TreatiseError> {
    Ok(serde_yaml::to_string(sections)?)
}
