use std::path::{Path, PathBuf};

use colored::Colorize;
use spada_core::glossary::{category_counts, Glossary};

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "glossary")]
#[command(about = "Glossary maintenance")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Persist a derived category (guard, technique, none) on every entry lacking one
    #[clap(name = "categorize")]
    Categorize(CategorizeOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct CategorizeOptions {
    /// Glossary YAML file
    glossary: PathBuf,

    /// Where to write the result (defaults to rewriting the glossary in place)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn categorize(glossary: &Glossary, output: &Path) -> Result<()> {
    let yaml = glossary.categorized_yaml().map_err(|e| eyre!(e))?;
    std::fs::write(output, yaml).wrap_err_with(|| f!("Failed to write {}", output.display()))
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    match app.command {
        Commands::Categorize(options) => {
            let glossary = crate::annotate::load_glossary(&options.glossary)?;
            let output = options.output.unwrap_or_else(|| options.glossary.clone());
            categorize(&glossary, &output)?;

            let mut table = new_table();
            for (category, count) in category_counts(&glossary) {
                table.add_row(prettytable::row![
                    category.bold().cyan(),
                    count.to_string().bright_yellow()
                ]);
            }
            println!("Categorized glossary written to {}", output.display());
            table.printstd();
            Ok(())
        }
    }
}
