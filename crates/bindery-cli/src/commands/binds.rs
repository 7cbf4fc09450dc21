//! Binds command
//!
//! Usage: bindery binds

use bindery_core::core_types::mask_uri;
use bindery_store::Database;

use super::CommandResult;

pub fn execute(db: &Database) -> CommandResult {
    let Some(config) = db.config() else {
        return Ok(());
    };

    println!("{}\t{}", bindery_store::errors::label(None), mask_uri(&config.uri));
    for (name, uri) in &config.binds {
        println!("{}\t{}", name, mask_uri(uri));
    }
    Ok(())
}
