//! Zero one play window across the catalog.
//!
//! Meant to be run from a scheduler, e.g. `rollover weekly` every Monday:
//!
//! ```text
//! rollover <weekly|monthly|yearly> [db_path]
//! ```
use std::env;
use std::path::PathBuf;

use catalog::Catalog;
use common::PlayWindow;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let window: PlayWindow = args
        .next()
        .ok_or("usage: rollover <weekly|monthly|yearly> [db_path]")?
        .parse()?;
    let db_path = args
        .next()
        .or_else(|| env::var("PLAYSTATS_DB").ok())
        .unwrap_or_else(|| "catalog.redb".to_string());

    let catalog = Catalog::open(&PathBuf::from(&db_path))?;
    let outcome = catalog.reset_window(window)?;
    info!("Rolled over {} plays in {}", window, db_path);

    println!(
        "Reset {} plays: {} songs matched, {} modified",
        outcome.window, outcome.matched, outcome.modified
    );

    Ok(())
}
