//! Tables command
//!
//! Usage: bindery tables [--bind <NAME>]

use bindery_store::errors::label;
use bindery_store::Database;
use clap::Args;

use super::{configured_binds, CommandResult};

#[derive(Debug, Args)]
pub struct TablesArgs {
    /// Only this bind (default: every configured bind)
    #[arg(short, long)]
    pub bind: Option<String>,
}

pub fn execute(db: &Database, args: TablesArgs) -> CommandResult {
    let binds = match args.bind {
        Some(name) => vec![Some(name)],
        None => configured_binds(db),
    };

    for bind in binds {
        let engine = db.get_engine(bind.as_deref())?;
        for table in engine.table_names()? {
            println!("{}\t{}", label(bind.as_deref()), table);
        }
    }
    Ok(())
}
