use std::path::PathBuf;

use colored::Colorize;
use spada_core::treatise::sections_from_yaml;

use crate::prelude::{println, *};
use crate::store::{Entry, Store};

#[derive(Debug, clap::Parser)]
#[command(name = "db")]
#[command(about = "SQLite store of treatise entries")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file
    #[arg(long, env = "SPADA_DB", global = true, default_value = "database.db")]
    db: PathBuf,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Import a treatise YAML file as chapter and paragraph entries
    #[clap(name = "import")]
    Import(ImportOptions),

    /// Search entries whose content matches a regular expression
    #[clap(name = "search")]
    Search(SearchOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ImportOptions {
    /// Treatise YAML file
    input: PathBuf,
}

#[derive(Debug, clap::Args, Clone)]
pub struct SearchOptions {
    /// Regular expression matched against entry content
    pattern: String,

    /// Language to search ("fr", "it", "en"); empty for all languages
    #[arg(short, long, env = "SPADA_LANGUAGE", default_value = "fr")]
    language: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

fn search_table(store: &Store, entries: &[Entry]) -> Result<prettytable::Table> {
    let mut table = new_table();
    table.set_titles(prettytable::row![
        "ID".bold().cyan(),
        "Type".bold().cyan(),
        "Chapter".bold().cyan(),
        "Content".bold().cyan()
    ]);
    for entry in entries {
        let chapter = store
            .parent_content(entry)
            .wrap_err_with(|| f!("Failed to look up parent of entry {}", entry.id))?
            .unwrap_or_default();
        table.add_row(prettytable::row![
            entry.id.to_string().bright_yellow(),
            entry.entry_type,
            chapter.bright_magenta(),
            entry.content
        ]);
    }
    Ok(table)
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Import(options) => {
            if !options.input.exists() {
                return Err(eyre!(Error::InputNotFound(
                    options.input.display().to_string()
                )));
            }
            let contents = std::fs::read_to_string(&options.input)
                .wrap_err_with(|| f!("Failed to read {}", options.input.display()))?;
            let sections = sections_from_yaml(&contents)
                .wrap_err_with(|| f!("Failed to load {}", options.input.display()))?;

            let mut store = Store::open(&app.db)
                .wrap_err_with(|| f!("Failed to open database {}", app.db.display()))?;
            let report = store
                .import_sections(&sections)
                .wrap_err("Failed to import sections")?;

            println!(
                "Imported {} chapters and {} paragraphs into {}",
                report.chapters.to_string().bright_yellow(),
                report.paragraphs.to_string().bright_yellow(),
                app.db.display()
            );
            Ok(())
        }
        Commands::Search(options) => {
            let store = Store::open(&app.db)
                .wrap_err_with(|| f!("Failed to open database {}", app.db.display()))?;
            let language = Some(options.language.as_str()).filter(|l| !l.is_empty());
            let entries = store
                .search_entries(&options.pattern, language)
                .wrap_err_with(|| f!("Search for '{}' failed", options.pattern))?;

            if options.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No entries match '{}'.", options.pattern);
                return Ok(());
            }

            search_table(&store, &entries)?.printstd();
            if global.verbose {
                println!("\n{} {}", "Matches:".bold().cyan(), entries.len());
            }
            Ok(())
        }
    }
}
