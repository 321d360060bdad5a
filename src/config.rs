// ⚙️ Import configuration - database target, input file, batch stamp

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

/// Sheet exported from the program & concentration course list
pub const DEFAULT_CSV_PATH: &str =
    "Jacobs Courses and Electives - Program & Concentration Courses.csv";

pub const DEFAULT_SEMESTER: &str = "Fall";
pub const DEFAULT_YEAR: i64 = 2024;

/// Semester and year stamped on every course of one run.
/// Not read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch {
    pub semester: String,
    pub year: i64,
}

impl ImportBatch {
    pub fn new(semester: &str, year: i64) -> Self {
        ImportBatch {
            semester: semester.to_string(),
            year,
        }
    }
}

impl Default for ImportBatch {
    fn default() -> Self {
        ImportBatch::new(DEFAULT_SEMESTER, DEFAULT_YEAR)
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database_url: String,
    pub csv_path: PathBuf,
    pub batch: ImportBatch,
}

impl ImportConfig {
    /// Read `DATABASE_URL` (required), `IMPORT_SEMESTER` and `IMPORT_YEAR`.
    /// `csv_override` replaces the default sheet path when given.
    pub fn from_env(csv_override: Option<String>) -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is not set")?;

        let mut batch = ImportBatch::default();
        if let Ok(semester) = env::var("IMPORT_SEMESTER") {
            batch.semester = semester;
        }
        if let Ok(year) = env::var("IMPORT_YEAR") {
            batch.year = year
                .trim()
                .parse()
                .with_context(|| format!("IMPORT_YEAR is not a year: '{}'", year))?;
        }

        Ok(ImportConfig {
            database_url,
            csv_path: PathBuf::from(csv_override.unwrap_or_else(|| DEFAULT_CSV_PATH.to_string())),
            batch,
        })
    }

    pub fn sqlite_path(&self) -> Result<String> {
        sqlite_path(&self.database_url)
    }
}

/// Strip the URL scheme off a SQLite connection string.
///
/// Accepts `sqlite://path`, `sqlite:path`, `file:path`, a bare path or `:memory:`.
pub fn sqlite_path(url: &str) -> Result<String> {
    let url = url.trim();

    let path = ["sqlite://", "sqlite:", "file:"]
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .unwrap_or(url);

    // Drop query parameters such as ?mode=rwc
    let path = path.split('?').next().unwrap_or_default();

    if path.is_empty() {
        return Err(anyhow!("DATABASE_URL does not name a database: '{}'", url));
    }

    Ok(path.to_string())
}
