//! Known treatise documents, keyed by a short selector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown document '{selector}'. Known documents: {}", .known.join(", "))]
    UnknownSelector { selector: String, known: Vec<String> },
    #[error("Invalid catalog file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Where a treatise lives and how its sections are identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// PDF path, relative to the data directory's parent.
    pub pdf: String,
    pub master: String,
    pub master_id: String,
    pub work: String,
    pub book: u32,
    pub year: i32,
}

impl DocumentConfig {
    pub fn output_file_name(&self) -> String {
        format!("{}_opera_nova_livre{}.yaml", self.master_id, self.book)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    documents: BTreeMap<String, DocumentConfig>,
}

impl Catalog {
    /// The treatises shipped with the project.
    pub fn builtin() -> Self {
        let mut documents = BTreeMap::new();
        documents.insert(
            "marozzo".to_string(),
            DocumentConfig {
                pdf: "data/treatises/Achille Marozzo - opéra nova.pdf".to_string(),
                master: "Achille Marozzo".to_string(),
                master_id: "achille_marozzo".to_string(),
                work: "Opera Nova".to_string(),
                book: 1,
                year: 1536,
            },
        );
        documents.insert(
            "marozzo_l2".to_string(),
            DocumentConfig {
                pdf: "data/treatises/Achille Marozzo - opéra nova - livre 2.pdf".to_string(),
                master: "Achille Marozzo".to_string(),
                master_id: "achille_marozzo".to_string(),
                work: "Opera Nova".to_string(),
                book: 2,
                year: 1536,
            },
        );
        documents.insert(
            "manciolino".to_string(),
            DocumentConfig {
                pdf: "data/treatises/Antonio Manciolino - opéra nova.pdf".to_string(),
                master: "Antonio Manciolino".to_string(),
                master_id: "antonio_manciolino".to_string(),
                work: "Opera Nova".to_string(),
                book: 1,
                year: 1531,
            },
        );
        Catalog { documents }
    }

    /// Parse a TOML catalog of `[documents.<selector>]` tables.
    ///
    /// Entries are layered over the built-in ones, replacing any selector
    /// they share.
    pub fn from_toml_str(input: &str) -> Result<Self, CatalogError> {
        let overrides: Catalog = toml::from_str(input)?;
        let mut catalog = Self::builtin();
        catalog.documents.extend(overrides.documents);
        Ok(catalog)
    }

    pub fn get(&self, selector: &str) -> Result<&DocumentConfig, CatalogError> {
        self.documents
            .get(selector)
            .ok_or_else(|| CatalogError::UnknownSelector {
                selector: selector.to_string(),
                known: self.selectors(),
            })
    }

    pub fn selectors(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }
}
