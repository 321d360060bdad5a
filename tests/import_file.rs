use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

use course_import::{
    count_categories, count_courses, count_links, find_course, import_file, load_csv,
    setup_database, ImportBatch,
};

fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_sheet(dir: &PathBuf, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

const FIRST_EXPORT: &str = "\
\"Program & concentration courses, updated by the registrar\"
Course Code,Course Description,Credit Hours,Concentration Core,Concentration Elective
CO 520-101,Programming in C and C++,5,Computer Science,
CO 520-102,Algorithms and Data Structures,7.5,Computer Science,
MA 120-101,Calculus and Elements of Linear Algebra,5/7.5,,Mathematics
MA 120-102,Probability,N/A,,
,,,,
PH 110-101,Classical Physics,,,
";

#[test]
fn import_file_end_to_end_and_rerun() {
    let dir = temp_dir("course-import");
    let sheet = write_sheet(&dir, "courses.csv", FIRST_EXPORT);
    let batch = ImportBatch::default();

    let mut conn = Connection::open(dir.join("courses.db")).unwrap();
    setup_database(&conn).unwrap();

    let loaded = load_csv(&sheet).unwrap();
    assert_eq!(loaded.rows.len(), 5);
    assert_eq!(loaded.blank_codes, 1);

    let first = import_file(&mut conn, &sheet, &batch).unwrap();
    assert_eq!(first.imported, 3);
    assert_eq!(first.skipped, 2);
    assert_eq!(first.failed, 0);

    assert_eq!(count_courses(&conn).unwrap(), 3);
    assert_eq!(count_categories(&conn).unwrap(), 2);
    assert_eq!(count_links(&conn).unwrap(), 3);

    let calculus = find_course(&conn, "MA120-101", "Fall", 2024).unwrap().unwrap();
    assert_eq!(calculus.credits, 5.0);
    assert_eq!(calculus.full_code, "MA 120-101");
    assert_eq!(calculus.department.as_deref(), Some("ma"));
    assert_eq!(calculus.concentration_elective.as_deref(), Some("Mathematics"));

    // Same sheet again: nothing new anywhere
    let second = import_file(&mut conn, &sheet, &batch).unwrap();
    assert_eq!(second.imported, 3);
    assert_eq!(second.categories_linked, 0);
    assert_eq!(count_courses(&conn).unwrap(), 3);
    assert_eq!(count_categories(&conn).unwrap(), 2);
    assert_eq!(count_links(&conn).unwrap(), 3);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn reimport_with_changes_updates_course_in_place() {
    let dir = temp_dir("course-import-update");
    let batch = ImportBatch::default();

    let mut conn = Connection::open(dir.join("courses.db")).unwrap();
    setup_database(&conn).unwrap();

    let before = write_sheet(&dir, "before.csv", FIRST_EXPORT);
    import_file(&mut conn, &before, &batch).unwrap();
    let original = find_course(&conn, "CO520-101", "Fall", 2024).unwrap().unwrap();

    let after = write_sheet(
        &dir,
        "after.csv",
        "note\n\
         Course Code,Course Description,Credit Hours\n\
         CO 520-101,Programming in C,7.5\n",
    );
    let report = import_file(&mut conn, &after, &batch).unwrap();
    assert_eq!(report.imported, 1);

    let updated = find_course(&conn, "CO520-101", "Fall", 2024).unwrap().unwrap();
    assert_eq!(updated.id, original.id);
    assert_eq!(updated.description.as_deref(), Some("Programming in C"));
    assert_eq!(updated.name.as_deref(), Some("Programming in C"));
    assert_eq!(updated.credits, 7.5);
    assert_eq!(updated.created_at, original.created_at);
    // Concentration columns absent from the new sheet clear the flags
    assert_eq!(updated.concentration_core, None);
    assert_eq!(count_courses(&conn).unwrap(), 3);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn import_file_missing_sheet_is_an_error() {
    let dir = temp_dir("course-import-missing");
    let mut conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();

    let result = import_file(&mut conn, &dir.join("nope.csv"), &ImportBatch::default());
    assert!(result.is_err());

    fs::remove_dir_all(&dir).ok();
}
