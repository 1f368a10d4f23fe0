use std::path::{Path, PathBuf};

use colored::Colorize;
use spada_core::annotate::{annotate_sections, AnnotationReport};
use spada_core::enrich::TextEnricher;
use spada_core::glossary::{Glossary, GlossaryIndex};
use spada_core::treatise::{sections_from_yaml, sections_to_yaml};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct AnnotateOptions {
    /// Treatise YAML file to annotate in place
    input: PathBuf,

    /// Glossary YAML file
    #[arg(long, env = "SPADA_GLOSSARY", default_value = "data/glossary.yaml")]
    glossary: PathBuf,
}

/// Read and parse a glossary file. Entries without a term are logged.
pub fn load_glossary(path: &Path) -> Result<Glossary> {
    if !path.exists() {
        return Err(eyre!(Error::GlossaryNotFound(path.display().to_string())));
    }
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| f!("Failed to read glossary {}", path.display()))?;
    let glossary = Glossary::from_yaml_str(&contents)
        .wrap_err_with(|| f!("Invalid glossary {}", path.display()))?;
    for key in glossary.malformed() {
        log::warn!("glossary entry '{}' has no term and is never matched", key);
    }
    Ok(glossary)
}

/// Annotate the treatise file at `input` in place.
///
/// Nothing is written unless every section was processed.
fn annotate_file(input: &Path, enricher: &TextEnricher) -> Result<AnnotationReport> {
    let contents = std::fs::read_to_string(input)
        .wrap_err_with(|| f!("Failed to read {}", input.display()))?;
    let mut sections = sections_from_yaml(&contents)
        .wrap_err_with(|| f!("Failed to load {}", input.display()))?;

    let report = annotate_sections(&mut sections, enricher);

    let yaml = sections_to_yaml(&sections).map_err(|e| eyre!(e))?;
    std::fs::write(input, yaml).wrap_err_with(|| f!("Failed to write {}", input.display()))?;
    Ok(report)
}

pub fn run(options: AnnotateOptions, global: crate::Global) -> Result<()> {
    if !options.input.exists() {
        return Err(eyre!(Error::InputNotFound(
            options.input.display().to_string()
        )));
    }

    println!("Processing {}...", options.input.display());

    let glossary = load_glossary(&options.glossary)?;
    println!("Loaded {} terms from glossary.", glossary.len());
    if global.verbose && !glossary.malformed().is_empty() {
        println!(
            "{} {}",
            "Entries without a term:".yellow(),
            glossary.malformed().join(", ")
        );
    }

    let index = GlossaryIndex::new(&glossary).map_err(|e| eyre!(e))?;
    let enricher = TextEnricher::new(index);

    let report = annotate_file(&options.input, &enricher)?;
    println!(
        "Completed. Added annotations to {} sections. Enriched {} text fields.",
        report.stubs_added.to_string().bright_yellow(),
        report.fields_enriched.to_string().bright_yellow()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLOSSARY: &str = r#"
guardia_alta:
  term: Guardia alta
  type: Garde Haute
mandritto:
  term: mandritto
  type: Coup de taille
senza_termine:
  type: Garde
"#;

    const TREATISE: &str = r#"
- id: achille_marozzo_l1_c1
  title: Chap. 1
  metadata:
    master: achille_marozzo
    work: Opera Nova
    book: 1
    chapter: 1
    year: 1536
  content:
    fr: "De la guardia alta tu tireras un mandritto."
"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_glossary_counts_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "glossary.yaml", GLOSSARY);
        let glossary = load_glossary(&path).unwrap();
        assert_eq!(glossary.len(), 3);
        assert_eq!(glossary.malformed(), &["senza_termine".to_string()]);
    }

    #[test]
    fn test_load_glossary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_glossary(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_annotate_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let glossary = load_glossary(&write(dir.path(), "glossary.yaml", GLOSSARY)).unwrap();
        let enricher = TextEnricher::new(GlossaryIndex::new(&glossary).unwrap());
        let input = write(dir.path(), "treatise.yaml", TREATISE);

        let report = annotate_file(&input, &enricher).unwrap();
        assert_eq!(report.stubs_added, 1);
        assert_eq!(report.fields_enriched, 1);

        let sections = sections_from_yaml(&std::fs::read_to_string(&input).unwrap()).unwrap();
        assert_eq!(
            sections[0].content.fr.as_deref(),
            Some("De la {guardia_alta} tu tireras un {mandritto}.")
        );
        let annotation = sections[0].annotation.as_ref().unwrap();
        assert_eq!(annotation.id, "achille_marozzo_l1_c1_ann");
        assert_eq!(
            annotation.guards_mentioned,
            Some(vec!["Guardia alta".to_string()])
        );
    }

    #[test]
    fn test_annotate_file_rejects_non_list_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let glossary = load_glossary(&write(dir.path(), "glossary.yaml", GLOSSARY)).unwrap();
        let enricher = TextEnricher::new(GlossaryIndex::new(&glossary).unwrap());
        let input = write(dir.path(), "treatise.yaml", "title: not a list\n");

        assert!(annotate_file(&input, &enricher).is_err());
        assert_eq!(
            std::fs::read_to_string(&input).unwrap(),
            "title: not a list\n"
        );
    }
}
