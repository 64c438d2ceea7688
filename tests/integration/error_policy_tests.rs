use hashkeep::cache::store;
use hashkeep::fingerprint::{ErrorPolicy, FingerprintConfig, FingerprintError, Fingerprinter};
use hashkeep::scanner::{DirectoryListing, ScanError, Walker, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Two directories, each with two files; `sub/b2.txt` disappears between
/// listing and fingerprinting.
fn vanishing_file_listings(root: &Path) -> Vec<Result<DirectoryListing, ScanError>> {
    let sub = root.join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(root.join("a1.txt"), b"a1").unwrap();
    fs::write(root.join("a2.txt"), b"a2").unwrap();
    fs::write(sub.join("b1.txt"), b"b1").unwrap();
    fs::write(sub.join("b2.txt"), b"b2").unwrap();

    let listings: Vec<_> = Walker::new(root, WalkerConfig::default()).walk().collect();
    fs::remove_file(sub.join("b2.txt")).unwrap();
    listings
}

#[test]
fn test_fail_fast_aborts_and_keeps_completed_directories() {
    let dir = tempdir().unwrap();
    let listings = vanishing_file_listings(dir.path());

    let err = Fingerprinter::with_defaults()
        .scan_listings(listings)
        .unwrap_err();

    match &err {
        FingerprintError::Metadata {
            directory, name, ..
        } => {
            assert_eq!(directory, &dir.path().join("sub"));
            assert_eq!(name, "b2.txt");
        }
        other => panic!("Expected metadata error, got {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("b2.txt"));
    assert!(message.contains("sub"));

    // The root was completed before the failure; the failing directory was not saved.
    assert_eq!(store::load(dir.path()).0.len(), 2);
    assert!(!store::cache_path(&dir.path().join("sub")).exists());
}

#[test]
fn test_continue_records_error_and_finishes() {
    let dir = tempdir().unwrap();
    let listings = vanishing_file_listings(dir.path());

    let config = FingerprintConfig::default().with_error_policy(ErrorPolicy::Continue);
    let report = Fingerprinter::new(config).scan_listings(listings).unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].file_name(), Some("b2.txt"));
    assert!(!report.is_complete());
    assert_eq!(report.totals.directories, 2);
    assert_eq!(report.totals.files_hashed, 3);

    let (sub_cache, _) = store::load(&dir.path().join("sub"));
    assert!(sub_cache.get("b1.txt").is_some());
    assert!(sub_cache.get("b2.txt").is_none());
}

#[test]
fn test_continue_drops_stale_row_of_failed_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
    fs::write(dir.path().join("b.txt"), b"bbb").unwrap();
    Fingerprinter::with_defaults().scan(dir.path()).unwrap();

    let listings: Vec<_> = Walker::new(dir.path(), WalkerConfig::default())
        .walk()
        .collect();
    fs::remove_file(dir.path().join("b.txt")).unwrap();

    let config = FingerprintConfig::default()
        .with_error_policy(ErrorPolicy::Continue)
        .with_prune_missing(false);
    let report = Fingerprinter::new(config).scan_listings(listings).unwrap();

    assert_eq!(report.errors.len(), 1);
    let (cache, _) = store::load(dir.path());
    assert!(cache.get("a.txt").is_some());
    assert!(cache.get("b.txt").is_none());
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_policy() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.bin");
    fs::write(dir.path().join("open.txt"), b"open").unwrap();
    fs::write(&locked, b"secret").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read anything; nothing to test then.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let err = Fingerprinter::with_defaults().scan(dir.path()).unwrap_err();
    assert!(matches!(err, FingerprintError::Hash { ref name, .. } if name == "locked.bin"));

    let config = FingerprintConfig::default().with_error_policy(ErrorPolicy::Continue);
    let report = Fingerprinter::new(config).scan(dir.path()).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.totals.files_hashed, 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_read_only_directory_is_fatal_even_when_continuing() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let ro = dir.path().join("ro");
    fs::create_dir(&ro).unwrap();
    fs::write(ro.join("a.txt"), b"aaa").unwrap();
    fs::set_permissions(&ro, fs::Permissions::from_mode(0o555)).unwrap();

    if fs::File::create(ro.join("writable")).is_ok() {
        fs::set_permissions(&ro, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let config = FingerprintConfig::default().with_error_policy(ErrorPolicy::Continue);
    let result = Fingerprinter::new(config).scan(&ro);
    fs::set_permissions(&ro, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(FingerprintError::Cache(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_reported_once() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner.txt"), b"inner").unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let config = FingerprintConfig::default().with_error_policy(ErrorPolicy::Continue);
    let result = Fingerprinter::new(config).scan(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let report = result.unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], FingerprintError::Walk(_)));
    assert_eq!(report.errors[0].directory(), Some(locked.as_path()));
    assert_eq!(report.totals.files_hashed, 1);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_file_name_goes_through_error_policy() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let odd = dir.path().join(OsStr::from_bytes(b"odd\xfe.bin"));
    fs::write(&odd, b"bytes").unwrap();
    fs::write(dir.path().join("a.txt"), b"aaa").unwrap();

    let err = Fingerprinter::with_defaults().scan(dir.path()).unwrap_err();
    match &err {
        FingerprintError::InvalidFileName { directory, path } => {
            assert_eq!(directory, dir.path());
            assert_eq!(path, &odd);
        }
        other => panic!("Expected invalid file name error, got {other:?}"),
    }
    assert!(!store::cache_path(dir.path()).exists());

    let config = FingerprintConfig::default().with_error_policy(ErrorPolicy::Continue);
    let report = Fingerprinter::new(config).scan(dir.path()).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], FingerprintError::InvalidFileName { .. }));
    let (cache, _) = store::load(dir.path());
    assert_eq!(cache.len(), 1);
    assert!(cache.get("a.txt").is_some());
}
