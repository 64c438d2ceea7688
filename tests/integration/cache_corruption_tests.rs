use hashkeep::cache::{store, LoadOutcome, CACHE_FILE_NAME};
use hashkeep::fingerprint::Fingerprinter;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_garbage_cache_is_rebuilt() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"0123456789").unwrap();
    fs::write(dir.path().join("b.txt"), b"01234567890123456789").unwrap();
    fs::write(
        dir.path().join(CACHE_FILE_NAME),
        b"\x00\x01not a table at all\xff\xfe",
    )
    .unwrap();

    let report = Fingerprinter::with_defaults().scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 2);
    assert_eq!(report.totals.bytes_hashed, 30);
    let (cache, outcome) = store::load(dir.path());
    assert!(outcome.is_clean());
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_empty_cache_file_is_rebuilt() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"abc").unwrap();
    fs::write(dir.path().join(CACHE_FILE_NAME), b"").unwrap();

    let (_, outcome) = store::load(dir.path());
    assert!(matches!(outcome, LoadOutcome::Corrupt(_)));

    let report = Fingerprinter::with_defaults().scan(dir.path()).unwrap();
    assert_eq!(report.totals.files_hashed, 1);
    assert!(store::load(dir.path()).1.is_clean());
}

#[test]
fn test_single_bad_row_only_rehashes_that_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
    fs::write(dir.path().join("b.txt"), b"bbb").unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();

    let path = store::cache_path(dir.path());
    let text = fs::read_to_string(&path).unwrap();
    let damaged: Vec<String> = text
        .lines()
        .map(|line| {
            if line.starts_with("b.txt,") {
                line.replacen(",3,", ",three,", 1)
            } else {
                line.to_string()
            }
        })
        .collect();
    fs::write(&path, damaged.join("\n") + "\n").unwrap();

    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 1);
    assert_eq!(report.totals.files_reused, 1);
    let (cache, outcome) = store::load(dir.path());
    assert!(outcome.is_clean());
    assert_eq!(cache.get("b.txt").unwrap().size, 3);
}

#[test]
fn test_unknown_columns_are_tolerated() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();

    let path = store::cache_path(dir.path());
    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    let mut widened = format!("{},note\n", lines.next().unwrap());
    for line in lines {
        widened.push_str(line);
        widened.push_str(",keep me\n");
    }
    fs::write(&path, &widened).unwrap();

    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 0);
    assert_eq!(report.totals.files_reused, 1);
    // Nothing changed, so the file is left as it was.
    assert_eq!(fs::read_to_string(&path).unwrap(), widened);
}

#[test]
fn test_leftover_temp_file_is_ignored_and_replaced() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
    let temp = dir.path().join(format!("{CACHE_FILE_NAME}.tmp"));
    fs::write(&temp, b"half written").unwrap();

    let report = Fingerprinter::with_defaults().scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_seen, 1);
    assert!(!temp.exists());
    assert_eq!(store::load(dir.path()).0.len(), 1);
}

#[test]
fn test_corrupt_cache_in_one_directory_does_not_affect_others() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
    fs::write(sub.join("b.txt"), b"bbb").unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();
    fs::write(store::cache_path(&sub), b"garbage").unwrap();

    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 1);
    assert_eq!(report.totals.files_reused, 1);
}
