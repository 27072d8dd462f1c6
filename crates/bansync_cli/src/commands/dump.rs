//! Dump command implementation.

use bansync_core::IdentityRecord;
use bansync_engine::SyncConfig;
use std::path::Path;

/// Runs the dump command.
pub fn run(config_path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = SyncConfig::load_or_init(config_path)?;
    let connector = config.store.connector();
    let mut table = connector.connect()?;

    let rows = if table.table_exists()? {
        let mut rows = table.fetch_all()?;
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Some(rows)
    } else {
        None
    };
    table.close()?;

    match format {
        "json" => {
            let rows = rows.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => print_text(connector.name(), rows.as_deref()),
    }
    Ok(())
}

fn print_text(backend: &str, rows: Option<&[IdentityRecord]>) {
    println!("Shared ban table ({backend})");
    let Some(rows) = rows else {
        println!("  (table does not exist yet)");
        return;
    };

    println!("  Rows: {}", rows.len());
    println!();
    for row in rows {
        if row.reason.is_empty() {
            println!("  {:<20} {}", row.id.to_string(), row.name);
        } else {
            println!("  {:<20} {} ({})", row.id.to_string(), row.name, row.reason);
        }
    }
}
