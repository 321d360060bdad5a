// 📥 Course Importer - CSV sheet → courses, categories, junction
//
// Each sheet row is its own unit of work: the course upsert, the category
// upsert and the link commit together or not at all. A bad row is reported
// and skipped, it never stops the run.

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::ImportBatch;
use crate::db::{link_course_category, upsert_category, upsert_course, CourseRow};
use crate::error::ImportError;
use crate::normalize::{infer_department, parse_credits};

/// Columns the sheet must have. Concentration columns are optional.
pub const REQUIRED_COLUMNS: [&str; 3] = ["Course Code", "Course Description", "Credit Hours"];

// ============================================================================
// LOADING
// ============================================================================

/// Rows that survived loading, in sheet order
#[derive(Debug, Clone, Default)]
pub struct CourseSheet {
    pub rows: Vec<CourseRow>,

    /// Rows dropped because their course code was blank
    pub blank_codes: usize,
}

pub fn load_csv(csv_path: &Path) -> Result<CourseSheet> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    read_sheet(file)
}

/// Parse a course sheet: one note line, then the header row, then data.
///
/// The note is dropped as a physical line before the CSV reader sees it,
/// so a blank note line does not swallow the header.
pub fn read_sheet<R: Read>(reader: R) -> Result<CourseSheet> {
    let mut reader = BufReader::new(reader);

    let mut note = String::new();
    reader
        .read_line(&mut note)
        .context("Failed to read leading note line")?;

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = rdr.records();

    let headers: csv::StringRecord = records
        .next()
        .transpose()
        .context("Failed to read header row")?
        .ok_or_else(|| anyhow!("Course sheet has no header row"))?
        .iter()
        .map(str::trim)
        .collect();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("Course sheet is missing required column '{}'", column);
        }
    }

    let mut sheet = CourseSheet::default();

    for (index, result) in records.enumerate() {
        // +3: 1-based, plus the note and header lines
        let line = index + 3;
        let record = result.with_context(|| format!("Failed to read row {}", line))?;
        let row: CourseRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Failed to deserialize row {}", line))?;

        if row.code().is_none() {
            sheet.blank_codes += 1;
            continue;
        }

        sheet.rows.push(row);
    }

    Ok(sheet)
}

// ============================================================================
// IMPORT REPORT
// ============================================================================

/// What happened to one row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Imported { code: String, course_id: String },
    Skipped { code: String, reason: String },
    Failed { code: String, error: String },
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,

    /// Course-category links created by this run (existing links not counted)
    pub categories_linked: usize,

    pub outcomes: Vec<RowOutcome>,
}

impl ImportReport {
    fn record(&mut self, outcome: RowOutcome) {
        match &outcome {
            RowOutcome::Imported { .. } => self.imported += 1,
            RowOutcome::Skipped { .. } => self.skipped += 1,
            RowOutcome::Failed { .. } => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

// ============================================================================
// DRIVER
// ============================================================================

struct RowImport {
    course_id: String,
    linked: bool,
}

/// Upsert one row inside its own transaction.
///
/// The transaction rolls back on drop, so every `?` below undoes the row.
fn import_row(
    conn: &mut Connection,
    row: &CourseRow,
    batch: &ImportBatch,
) -> std::result::Result<RowImport, ImportError> {
    let tx = conn.transaction()?;

    let course_id = upsert_course(&tx, row, batch)?;

    let mut linked = false;
    if let Some(department) = infer_department(row.course_code.as_deref()) {
        let category_id = upsert_category(&tx, &department, &department)?;
        linked = link_course_category(&tx, &course_id, &category_id)?;
    }

    tx.commit()?;

    Ok(RowImport { course_id, linked })
}

/// Log a row's result and add it to the report
fn record_row_result(
    report: &mut ImportReport,
    code: String,
    result: std::result::Result<RowImport, ImportError>,
) {
    match result {
        Ok(imported) => {
            if imported.linked {
                report.categories_linked += 1;
            }
            report.record(RowOutcome::Imported {
                code,
                course_id: imported.course_id,
            });
        }
        Err(err) if err.is_invalid_input() => {
            warn!("Skipping {}: {}", code, err);
            report.record(RowOutcome::Skipped {
                code,
                reason: err.to_string(),
            });
        }
        Err(err) => {
            error!("Error processing {}: {}", code, err);
            report.record(RowOutcome::Failed {
                code,
                error: err.to_string(),
            });
        }
    }
}

/// Import rows in order. Row failures are logged and counted, never returned.
pub fn import_rows(conn: &mut Connection, rows: &[CourseRow], batch: &ImportBatch) -> ImportReport {
    let mut report = ImportReport::default();

    for row in rows {
        let code = row.display_code().to_string();
        let credit_field = row.credit_field();

        if parse_credits(&credit_field).is_none() {
            let raw = credit_field.raw();
            warn!("Skipping {}: invalid or missing credits '{}'", code, raw);
            report.record(RowOutcome::Skipped {
                code,
                reason: format!("invalid or missing credits '{}'", raw),
            });
            continue;
        }

        let result = import_row(conn, row, batch);
        record_row_result(&mut report, code, result);
    }

    info!(
        imported = report.imported,
        skipped = report.skipped,
        failed = report.failed,
        "course import finished"
    );

    report
}

/// Load the sheet at `csv_path` and import it
pub fn import_file(conn: &mut Connection, csv_path: &Path, batch: &ImportBatch) -> Result<ImportReport> {
    let sheet = load_csv(csv_path)?;

    info!(
        rows = sheet.rows.len(),
        blank_codes = sheet.blank_codes,
        semester = %batch.semester,
        year = batch.year,
        "loaded course sheet"
    );

    Ok(import_rows(conn, &sheet.rows, batch))
}
