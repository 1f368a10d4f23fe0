#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod annotate;
mod db;
mod error;
mod extract;
mod glossary;
mod prelude;
mod store;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract fencing treatises from PDF scans into YAML sections, tag them against the glossary and index them in SQLite"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "SPADA_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract a treatise from its PDF into a YAML section list
    Extract(crate::extract::ExtractOptions),

    /// Tag glossary terms in a treatise YAML file and fill its annotations
    Annotate(crate::annotate::AnnotateOptions),

    /// Glossary maintenance
    Glossary(crate::glossary::App),

    /// SQLite store of treatise entries
    Db(crate::db::App),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global),
        SubCommands::Annotate(options) => crate::annotate::run(options, app.global),
        SubCommands::Glossary(sub_app) => crate::glossary::run(sub_app, app.global),
        SubCommands::Db(sub_app) => crate::db::run(sub_app, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
