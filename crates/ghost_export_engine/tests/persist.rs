use std::fs;

use ghost_export_engine::{ensure_output_dir, prepare_output_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("site");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn prepare_empties_previous_output_and_creates_image_tree() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("site");
    fs::create_dir_all(out.join("content/images/old")).unwrap();
    fs::write(out.join("content/images/old/stale.png"), "x").unwrap();
    fs::write(out.join("stale.md"), "x").unwrap();

    let images = prepare_output_dir(&out).unwrap();

    assert_eq!(images, out.join("content/images"));
    assert!(images.is_dir());
    assert!(!out.join("stale.md").exists());
    assert_eq!(fs::read_dir(&images).unwrap().count(), 0);
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("about.html", "hello").unwrap();
    assert_eq!(first.file_name().unwrap(), "about.html");
    assert_eq!(fs::read_to_string(&first).unwrap(), "hello");

    let second = writer.write("about.html", "world").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "world");
}

#[test]
fn no_partial_file_on_error() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let result = writer.write("about.md", "data");
    assert!(result.is_err());
    assert!(!file_path.with_file_name("about.md").exists());
}

#[test]
fn file_names_cannot_leave_the_directory() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().join("site"));
    for bad in ["../x.md", "a/b.md", "", ".hidden"] {
        assert!(
            matches!(writer.write(bad, "x"), Err(PersistError::InvalidName(_))),
            "{bad}"
        );
    }
}
