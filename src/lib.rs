// Course Import - Core Library
// Loads the course sheet into courses, course_categories and the junction table

pub mod config;
pub mod db;
pub mod error;
pub mod importer;
pub mod normalize;

// Re-export commonly used types
pub use config::{sqlite_path, ImportBatch, ImportConfig, DEFAULT_CSV_PATH};
pub use db::{
    Course, CourseRow,
    setup_database, upsert_category, upsert_course, link_course_category,
    find_course, find_category_id, categories_for_course,
    count_courses, count_categories, count_links,
};
pub use error::ImportError;
pub use importer::{
    CourseSheet, ImportReport, RowOutcome,
    load_csv, read_sheet, import_rows, import_file,
};
pub use normalize::{
    CreditError, CreditField,
    classify_credits, parse_credits, infer_department, compact_code,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
