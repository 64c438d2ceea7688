use filetime::{set_file_mtime, FileTime};
use hashkeep::cache::store;
use hashkeep::fingerprint::Fingerprinter;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_size_change_triggers_rehash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, b"hello").unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();

    fs::write(&path, b"hello world").unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 1);
    assert_eq!(report.totals.bytes_hashed, 11);
    let (cache, _) = store::load(dir.path());
    assert_eq!(cache.get("a.txt").unwrap().size, 11);
}

#[test]
fn test_mtime_only_change_triggers_rehash() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, b"hello").unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();
    let (before, _) = store::load(dir.path());

    set_file_mtime(&path, FileTime::from_unix_time(1_600_000_001, 0)).unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 1);
    let (after, _) = store::load(dir.path());
    let old = before.get("a.txt").unwrap();
    let new = after.get("a.txt").unwrap();
    assert_eq!(new.hash, old.hash);
    assert_eq!(new.mtime.timestamp(), 1_600_000_001);
}

#[test]
fn test_sub_microsecond_mtime_change_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, b"hello").unwrap();
    set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 123_456_100)).unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();

    // Same microsecond, different nanoseconds.
    set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 123_456_900)).unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 0);
    assert_eq!(report.totals.files_reused, 1);
}

#[test]
fn test_content_change_with_same_size_and_mtime_is_not_detected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.txt");
    fs::write(&path, b"aaaa").unwrap();
    let mtime = FileTime::from_unix_time(1_600_000_000, 0);
    set_file_mtime(&path, mtime).unwrap();

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();
    let (before, _) = store::load(dir.path());

    fs::write(&path, b"bbbb").unwrap();
    set_file_mtime(&path, mtime).unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 0);
    let (after, _) = store::load(dir.path());
    assert_eq!(after.get("a.txt"), before.get("a.txt"));
}

#[test]
fn test_only_stale_files_are_rehashed() {
    let dir = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        fs::write(dir.path().join(name), name.as_bytes()).unwrap();
        set_file_mtime(
            dir.path().join(name),
            FileTime::from_unix_time(1_600_000_000, 0),
        )
        .unwrap();
    }

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();

    set_file_mtime(
        dir.path().join("b.txt"),
        FileTime::from_unix_time(1_700_000_000, 0),
    )
    .unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 1);
    assert_eq!(report.totals.files_reused, 2);
    assert_eq!(report.totals.bytes_hashed, 5);
}

#[test]
fn test_content_and_mtime_changes_in_one_run() {
    let dir = tempdir().unwrap();
    let old_mtime = FileTime::from_unix_time(1_600_000_000, 0);
    for (name, content) in [("a.txt", "alpha"), ("b.txt", "bravo"), ("c.txt", "charlie")] {
        fs::write(dir.path().join(name), content).unwrap();
        set_file_mtime(dir.path().join(name), old_mtime).unwrap();
    }

    let fingerprinter = Fingerprinter::with_defaults();
    fingerprinter.scan(dir.path()).unwrap();
    let (before, _) = store::load(dir.path());

    // a.txt: new content; b.txt: touched only; c.txt: unchanged.
    fs::write(dir.path().join("a.txt"), "ALPHA").unwrap();
    set_file_mtime(
        dir.path().join("a.txt"),
        FileTime::from_unix_time(1_700_000_000, 0),
    )
    .unwrap();
    set_file_mtime(
        dir.path().join("b.txt"),
        FileTime::from_unix_time(1_700_000_000, 500_000),
    )
    .unwrap();
    let report = fingerprinter.scan(dir.path()).unwrap();

    assert_eq!(report.totals.files_hashed, 2);
    assert_eq!(report.totals.files_reused, 1);
    assert_eq!(report.totals.bytes_hashed, 10);

    let (after, _) = store::load(dir.path());
    let a = after.get("a.txt").unwrap();
    assert_ne!(a.hash, before.get("a.txt").unwrap().hash);
    assert_eq!(a.mtime.timestamp(), 1_700_000_000);

    let b = after.get("b.txt").unwrap();
    assert_eq!(b.hash, before.get("b.txt").unwrap().hash);
    assert_eq!(b.mtime.timestamp_subsec_micros(), 500);
    assert!(b.hashed_at >= before.get("b.txt").unwrap().hashed_at);

    assert_eq!(after.get("c.txt"), before.get("c.txt"));
}
