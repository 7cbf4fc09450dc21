//! Bindery CLI
//!
//! Inspect the binds described by a settings file

use std::path::PathBuf;

use bindery_core::logging_facility::{self, Profile};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "bindery")]
#[command(about = "Bindery - inspect configured database binds", long_about = None)]
struct Cli {
    /// TOML settings file (BINDERY_* keys); environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log engine and schema operations
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List configured binds and their (redacted) URIs
    Binds,
    /// List tables present in each bind's store
    Tables(commands::tables::TablesArgs),
    /// Open every bind and run a trivial query
    Ping,
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        logging_facility::init(Profile::Development);
    }

    let result = commands::open(cli.config.as_deref()).and_then(|db| match cli.command {
        Commands::Binds => commands::binds::execute(&db),
        Commands::Tables(args) => commands::tables::execute(&db, args),
        Commands::Ping => commands::ping::execute(&db),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
