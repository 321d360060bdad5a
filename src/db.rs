use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::config::ImportBatch;
use crate::error::ImportError;
use crate::normalize::{classify_credits, compact_code, infer_department, CreditField};

/// One row of the course sheet, exactly as exported.
/// Every column is optional so a blank cell never fails deserialization.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CourseRow {
    #[serde(rename = "Course Code", default)]
    pub course_code: Option<String>,

    #[serde(rename = "Course Description", default)]
    pub course_description: Option<String>,

    #[serde(rename = "Credit Hours", default)]
    pub credit_hours: Option<String>,

    #[serde(rename = "Concentration Core", default)]
    pub concentration_core: Option<String>,

    #[serde(rename = "Concentration Elective", default)]
    pub concentration_elective: Option<String>,
}

impl CourseRow {
    /// Course code as written in the sheet, None when blank
    pub fn code(&self) -> Option<&str> {
        self.course_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    pub fn credit_field(&self) -> CreditField {
        CreditField::from_cell(self.credit_hours.as_deref())
    }

    /// Code for log messages
    pub fn display_code(&self) -> &str {
        self.course_code.as_deref().unwrap_or_default()
    }
}

/// Stored course record
#[derive(Debug, Clone)]
pub struct Course {
    pub id: String,
    pub code: String,
    pub full_code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub credits: f64,
    pub department: Option<String>,
    pub concentration_core: Option<String>,
    pub concentration_elective: Option<String>,
    pub semester: String,
    pub year: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // ==========================================================================
    // Courses Table - one row per (code, semester, year)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            full_code TEXT,
            name TEXT,
            description TEXT,
            credits REAL NOT NULL,
            department TEXT,
            concentration_core TEXT,
            concentration_elective TEXT,
            semester TEXT NOT NULL,
            year INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (code, semester, year)
        )",
        [],
    )?;

    // ==========================================================================
    // Categories Table - one row per department slug
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS course_categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Junction Table (course <-> category)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS course_category_junction (
            course_id TEXT NOT NULL REFERENCES courses(id),
            category_id TEXT NOT NULL REFERENCES course_categories(id),
            PRIMARY KEY (course_id, category_id)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_department ON courses(department)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_junction_category ON course_category_junction(category_id)",
        [],
    )?;

    Ok(())
}

/// Insert a category for `slug`, or return the id of the one already there.
///
/// The no-op `DO UPDATE` makes `RETURNING` hand back the existing row, so the
/// lookup happens in the same statement as the insert. Existing names are kept.
pub fn upsert_category(conn: &Connection, name: &str, slug: &str) -> rusqlite::Result<String> {
    conn.query_row(
        "INSERT INTO course_categories (id, name, slug)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (slug) DO UPDATE SET slug = excluded.slug
         RETURNING id",
        params![uuid::Uuid::new_v4().to_string(), name.to_uppercase(), slug],
        |row| row.get(0),
    )
}

/// Insert or refresh a course keyed on (code, semester, year).
///
/// On conflict only the descriptive fields change; id, key and created_at stay.
/// Fails with `ImportError::InvalidInput` when the row has no usable credits.
pub fn upsert_course(
    conn: &Connection,
    row: &CourseRow,
    batch: &ImportBatch,
) -> std::result::Result<String, ImportError> {
    let full_code = row.display_code();
    let credit_field = row.credit_field();

    let credits = classify_credits(&credit_field).map_err(|reason| ImportError::InvalidInput {
        code: full_code.to_string(),
        raw: credit_field.raw(),
        reason,
    })?;

    let now = Utc::now().to_rfc3339();

    let course_id = conn.query_row(
        "INSERT INTO courses (
            id, code, full_code, name, description, credits, department,
            concentration_core, concentration_elective, semester, year,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT (code, semester, year) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            credits = excluded.credits,
            department = excluded.department,
            concentration_core = excluded.concentration_core,
            concentration_elective = excluded.concentration_elective,
            updated_at = excluded.updated_at
        RETURNING id",
        params![
            uuid::Uuid::new_v4().to_string(),
            compact_code(full_code),
            full_code,
            // The sheet has no title column, so the description doubles as name
            row.course_description,
            row.course_description,
            credits,
            infer_department(row.course_code.as_deref()),
            row.concentration_core,
            row.concentration_elective,
            batch.semester,
            batch.year,
            now,
            now,
        ],
        |r| r.get(0),
    )?;

    Ok(course_id)
}

/// Link a course to a category. Returns false when the link already existed.
pub fn link_course_category(
    conn: &Connection,
    course_id: &str,
    category_id: &str,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO course_category_junction (course_id, category_id)
         VALUES (?1, ?2)
         ON CONFLICT DO NOTHING",
        params![course_id, category_id],
    )?;

    Ok(inserted > 0)
}

pub fn find_course(
    conn: &Connection,
    code: &str,
    semester: &str,
    year: i64,
) -> Result<Option<Course>> {
    let course = conn
        .query_row(
            "SELECT id, code, full_code, name, description, credits, department,
                    concentration_core, concentration_elective, semester, year,
                    created_at, updated_at
             FROM courses
             WHERE code = ?1 AND semester = ?2 AND year = ?3",
            params![code, semester, year],
            |row| {
                let created_at: String = row.get(11)?;
                let updated_at: String = row.get(12)?;

                Ok(Course {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    full_code: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    name: row.get(3)?,
                    description: row.get(4)?,
                    credits: row.get(5)?,
                    department: row.get(6)?,
                    concentration_core: row.get(7)?,
                    concentration_elective: row.get(8)?,
                    semester: row.get(9)?,
                    year: row.get(10)?,
                    created_at: parse_timestamp(&created_at),
                    updated_at: parse_timestamp(&updated_at),
                })
            },
        )
        .optional()?;

    Ok(course)
}

/// Category ids linked to a course
pub fn categories_for_course(conn: &Connection, course_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT category_id FROM course_category_junction
         WHERE course_id = ?1
         ORDER BY category_id",
    )?;

    let ids = stmt
        .query_map([course_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    Ok(ids)
}

pub fn find_category_id(conn: &Connection, slug: &str) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM course_categories WHERE slug = ?1",
            [slug],
            |row| row.get(0),
        )
        .optional()?;

    Ok(id)
}

pub fn count_courses(conn: &Connection) -> Result<i64> {
    count_rows(conn, "courses")
}

pub fn count_categories(conn: &Connection) -> Result<i64> {
    count_rows(conn, "course_categories")
}

pub fn count_links(conn: &Connection) -> Result<i64> {
    count_rows(conn, "course_category_junction")
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
