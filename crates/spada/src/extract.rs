use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use spada_core::catalog::Catalog;
use spada_core::hierarchy::{build_hierarchy, HierarchyConfig};
use spada_core::page_range::parse_page_range_lenient;
use spada_core::sections::map_sections;
use spada_core::treatise::{sections_to_yaml, Section};

use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct ExtractOptions {
    /// Document to extract (e.g., "marozzo", "marozzo_l2", "manciolino")
    #[clap(env = "SPADA_DOCUMENT")]
    selector: String,

    /// Pages to read: "N", "A,B,C" or "A-B" (1-indexed)
    #[arg(short, long, env = "SPADA_PAGES")]
    pages: String,

    /// Print the title/chapter/paragraph tree before writing
    #[arg(long)]
    debug: bool,

    /// Output YAML file (defaults to <data-dir>/treatises/<master_id>_opera_nova_livre<book>.yaml)
    #[arg(short, long, env = "SPADA_OUTPUT")]
    output: Option<PathBuf>,

    /// TOML file with additional [documents.<selector>] entries
    #[arg(long, env = "SPADA_CATALOG")]
    catalog: Option<PathBuf>,

    /// Data directory. Relative document paths resolve against its parent.
    #[arg(long, env = "SPADA_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[clap(flatten)]
    sizes: SizeOptions,
}

/// Font sizes that mark headings, and the body line-break gap.
#[derive(Debug, clap::Args, Clone)]
pub struct SizeOptions {
    /// Rounded font size of titles
    #[arg(long, env = "SPADA_TITLE_SIZE", default_value = "80")]
    title_size: u32,

    /// Rounded font size of subtitles
    #[arg(long, env = "SPADA_SUBTITLE_SIZE", default_value = "25")]
    subtitle_size: u32,

    /// Rounded font size of chapter headings
    #[arg(long, env = "SPADA_CHAPTER_SIZE", default_value = "20")]
    chapter_size: u32,

    /// Vertical gap between body words above which a line break is kept
    #[arg(long, env = "SPADA_LINE_BREAK_GAP", default_value = "20")]
    line_break_gap: f32,
}

impl From<&SizeOptions> for HierarchyConfig {
    fn from(sizes: &SizeOptions) -> Self {
        HierarchyConfig {
            title_size: sizes.title_size,
            subtitle_size: sizes.subtitle_size,
            chapter_size: sizes.chapter_size,
            line_break_gap: sizes.line_break_gap,
        }
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        None => Ok(Catalog::builtin()),
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .wrap_err_with(|| f!("Failed to read catalog {}", path.display()))?;
            Catalog::from_toml_str(&contents).map_err(|e| eyre!(e))
        }
    }
}

/// Resolve a catalog path against the parent of the data directory.
fn resolve_document_path(data_dir: &Path, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    data_dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(path)
}

fn write_sections(path: &Path, sections: &[Section]) -> Result<()> {
    let yaml = sections_to_yaml(sections).map_err(|e| eyre!(e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| f!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, yaml).wrap_err_with(|| f!("Failed to write {}", path.display()))
}

pub fn run(options: ExtractOptions, global: crate::Global) -> Result<()> {
    let catalog = load_catalog(options.catalog.as_deref())?;
    let document = catalog.get(&options.selector).map_err(|e| eyre!(e))?;

    // The parse diagnostic is logged at warn level.
    let range = parse_page_range_lenient(&options.pages);
    if range.is_empty() {
        println!("{}", Error::InvalidRange(options.pages.clone()));
        return Ok(());
    }

    let pdf_path = resolve_document_path(&options.data_dir, &document.pdf);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner.set_message(f!("Opening {}", pdf_path.display()));

    let words = pdf::PdfDocument::open(&pdf_path)
        .and_then(|doc| {
            if global.verbose {
                spinner.suspend(|| {
                    println!(
                        "{} {} ({} pages)",
                        "Document:".bold().cyan(),
                        pdf_path.display(),
                        doc.page_count()
                    );
                    println!("{} {}", "Pages:".bold().cyan(), range);
                });
            }
            doc.words_with_progress(&range, |page| {
                spinner.set_message(f!("Reading page {}", page));
            })
        })
        .wrap_err_with(|| f!("Failed to read {}", pdf_path.display()));

    spinner.finish_and_clear();
    let words = words?;

    let tree = build_hierarchy(&words, &HierarchyConfig::from(&options.sizes));
    if options.debug {
        println!("{}", tree.outline());
    }

    let sections = map_sections(&tree, document);
    let output = options.output.clone().unwrap_or_else(|| {
        options
            .data_dir
            .join("treatises")
            .join(document.output_file_name())
    });
    write_sections(&output, &sections)?;

    println!("YAML file written: {}", output.display().to_string().green());
    println!("Sections: {}", sections.len().to_string().bright_yellow());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spada_core::treatise::sections_from_yaml;

    #[test]
    fn test_resolve_document_path_relative() {
        let path = resolve_document_path(Path::new("data"), "data/treatises/marozzo.pdf");
        assert_eq!(path, PathBuf::from("data/treatises/marozzo.pdf"));

        let path = resolve_document_path(Path::new("/srv/spada/data"), "data/treatises/m.pdf");
        assert_eq!(path, PathBuf::from("/srv/spada/data/treatises/m.pdf"));
    }

    #[test]
    fn test_resolve_document_path_absolute() {
        let path = resolve_document_path(Path::new("data"), "/scans/m.pdf");
        assert_eq!(path, PathBuf::from("/scans/m.pdf"));
    }

    #[test]
    fn test_load_catalog_builtin_and_file() {
        assert!(load_catalog(None).unwrap().get("marozzo").is_ok());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
[documents.viggiani]
pdf = "data/treatises/viggiani.pdf"
master = "Angelo Viggiani"
master_id = "angelo_viggiani"
work = "Lo Schermo"
book = 1
year = 1575
"#,
        )
        .unwrap();
        let catalog = load_catalog(Some(path.as_path())).unwrap();
        assert_eq!(catalog.get("viggiani").unwrap().year, 1575);
        assert!(catalog.get("manciolino").is_ok());
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_catalog(Some(dir.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn test_write_sections_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treatises").join("out.yaml");
        write_sections(&path, &[]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(sections_from_yaml(&written).unwrap().is_empty());
    }

    #[test]
    fn test_size_options_into_config() {
        let sizes = SizeOptions {
            title_size: 80,
            subtitle_size: 25,
            chapter_size: 18,
            line_break_gap: 12.0,
        };
        let config = HierarchyConfig::from(&sizes);
        assert_eq!(config.chapter_size, 18);
        assert_eq!(config.line_break_gap, 12.0);
    }
}
