use anyhow::{Context, Result};
use rusqlite::Connection;
use std::env;

use course_import::{count_categories, count_courses, count_links, import_file, setup_database, ImportConfig};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    // Optional first argument replaces the default sheet path
    let csv_override = env::args().nth(1);
    let config = ImportConfig::from_env(csv_override)?;

    run_import(&config)
}

fn run_import(config: &ImportConfig) -> Result<()> {
    println!("🗄️  Course Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Sheet: {}", config.csv_path.display());
    println!("   Batch: {} {}", config.batch.semester, config.batch.year);

    // 1. Open database
    let db_path = config.sqlite_path()?;
    let mut conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path))?;
    setup_database(&conn)?;

    // 2. Import rows, one transaction each
    println!("\n💾 Importing courses...");
    let report = import_file(&mut conn, &config.csv_path, &config.batch)?;

    // 3. Summary
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Imported: {} rows", report.imported);
    println!("✓ Skipped:  {} rows", report.skipped);
    println!("✓ Failed:   {} rows", report.failed);
    println!("✓ New category links: {}", report.categories_linked);
    println!(
        "✓ Database contains {} courses, {} categories, {} links",
        count_courses(&conn)?,
        count_categories(&conn)?,
        count_links(&conn)?
    );
    println!("Done!");

    Ok(())
}
