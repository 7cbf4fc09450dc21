//! Ping command
//!
//! Usage: bindery ping

use std::time::Instant;

use bindery_store::Database;

use super::{configured_binds, CommandResult};

pub fn execute(db: &Database) -> CommandResult {
    let mut failed = 0;
    for bind in configured_binds(db) {
        let start = Instant::now();
        let result = db.get_engine(bind.as_deref()).and_then(|engine| engine.ping());
        let name = bindery_store::errors::label(bind.as_deref());
        match result {
            Ok(()) => println!("✓ {} ({} ms)", name, start.elapsed().as_millis()),
            Err(e) => {
                println!("✗ {}: {}", name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} bind(s) unreachable", failed).into());
    }
    Ok(())
}
