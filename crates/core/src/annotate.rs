//! Annotation pass over treatise sections.
//!
//! Each section gets an annotation stub if it has none, its text fields are
//! enriched with glossary references, and the guards and techniques found in
//! those references are recomputed from scratch.

use std::collections::BTreeSet;

use crate::enrich::TextEnricher;
use crate::glossary::{display_terms_in, Category};
use crate::treatise::{Annotation, Section};

/// Counts of what an annotation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationReport {
    pub stubs_added: usize,
    pub fields_enriched: usize,
}

pub fn annotate_sections(sections: &mut [Section], enricher: &TextEnricher) -> AnnotationReport {
    let mut report = AnnotationReport::default();
    for section in sections.iter_mut() {
        annotate_section(section, enricher, &mut report);
    }
    report
}

fn annotate_section(section: &mut Section, enricher: &TextEnricher, report: &mut AnnotationReport) {
    if section.annotation.is_none() {
        section.annotation = Some(Annotation::stub(&section.id));
        report.stubs_added += 1;
    }

    let mut found = BTreeSet::new();
    let content = &mut section.content;
    if let Some(it) = content.it.as_mut() {
        enrich_field(it, enricher, &mut found, report);
    }
    if let Some(fr) = content.fr.as_mut() {
        enrich_field(fr, enricher, &mut found, report);
    }
    for version in content.en_versions.iter_mut().flatten() {
        enrich_field(&mut version.text, enricher, &mut found, report);
    }

    let keys: Vec<String> = found.into_iter().collect();
    let index = enricher.index();
    if let Some(annotation) = section.annotation.as_mut() {
        annotation.guards_mentioned = Some(display_terms_in(index, &keys, Category::Guard));
        annotation.techniques = Some(display_terms_in(index, &keys, Category::Technique));
    }
}

fn enrich_field(
    field: &mut String,
    enricher: &TextEnricher,
    found: &mut BTreeSet<String>,
    report: &mut AnnotationReport,
) {
    let enriched = enricher.enrich(field);
    found.extend(
        TextEnricher::tagged_keys(&enriched)
            .into_iter()
            .filter(|key| enricher.index().category(key) != Category::None),
    );
    if enriched != *field {
        *field = enriched;
        report.fields_enriched += 1;
    }
}
