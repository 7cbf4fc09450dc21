pub mod binds;
pub mod ping;
pub mod tables;

use std::path::Path;

use bindery_core::AppSettings;
use bindery_store::Database;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Build a database from the settings file (if any) plus `BINDERY_*` variables
pub fn open(config: Option<&Path>) -> Result<Database, Box<dyn std::error::Error>> {
    let settings = match config {
        Some(path) => AppSettings::from_toml_file(path)?,
        None => AppSettings::new(),
    }
    .with_env_overrides();

    let db = Database::new();
    db.init_app(&settings)?;
    Ok(db)
}

/// Default bind first, then named binds in name order
pub fn configured_binds(db: &Database) -> Vec<Option<String>> {
    let mut binds = vec![None];
    if let Some(config) = db.config() {
        binds.extend(config.binds.into_keys().map(Some));
    }
    binds
}
