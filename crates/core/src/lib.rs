//! Core library for spada
//!
//! This crate implements the **Functional Core** of the spada treatise tools,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`spada_core`** (this crate): Pure transformation functions with zero I/O
//! - **`pdf`**: Word stream extraction from PDF files
//! - **`spada`**: File I/O, persistence and orchestration (the Imperative Shell)
//!
//! Every function here takes its input as values or strings and returns values
//! or strings. Reading PDFs, YAML files and databases happens in the shell.
//!
//! # Module Organization
//!
//! Extraction pass, in pipeline order:
//!
//! - [`page_range`]: Page selector parsing
//! - [`hierarchy`]: Font-size state machine building the title/chapter tree
//! - [`paragraph`]: Paragraph segmentation of body text
//! - [`sections`]: Flattening the tree into section records
//! - [`catalog`]: Known documents and their identifiers
//!
//! Annotation pass, over already extracted sections:
//!
//! - [`treatise`]: Section records and their YAML form
//! - [`glossary`]: Controlled vocabulary and the term index
//! - [`enrich`]: Term tagging of free text
//! - [`annotate`]: Per-section annotation population
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use spada_core::catalog::Catalog;
//! use spada_core::hierarchy::{build_hierarchy, HierarchyConfig, Word};
//! use spada_core::sections::map_sections;
//!
//! let words = vec![
//!     Word::new("Chap. 94", 20.0, 0.0),
//!     Word::new("Étant en garde haute, tu feras.", 14.0, 30.0),
//! ];
//! let tree = build_hierarchy(&words, &HierarchyConfig::default());
//! let catalog = Catalog::builtin();
//! let sections = map_sections(&tree, catalog.get("marozzo")?);
//!
//! assert_eq!(sections[0].id, "achille_marozzo_l1_c94");
//! ```

pub mod annotate;
pub mod catalog;
pub mod enrich;
pub mod glossary;
pub mod hierarchy;
pub mod page_range;
pub mod paragraph;
pub mod sections;
pub mod treatise;
