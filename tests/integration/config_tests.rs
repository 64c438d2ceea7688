use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use hashkeep::config::{Config, ENV_PREFIX};
use hashkeep::fingerprint::ErrorPolicy;
use hashkeep::scanner::HashAlgorithm;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_load_defaults() {
    // No Env provider, so concurrently set variables cannot interfere.
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_env() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    std::env::set_var("HASHKEEP_IO_THREADS", "16");
    std::env::set_var("HASHKEEP_ALGORITHM", "blake3");
    std::env::set_var("HASHKEEP_ERROR_POLICY", "continue");

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX));
    let result: Result<Config, _> = figment.extract();

    std::env::remove_var("HASHKEEP_IO_THREADS");
    std::env::remove_var("HASHKEEP_ALGORITHM");
    std::env::remove_var("HASHKEEP_ERROR_POLICY");

    let config = result.unwrap();
    assert_eq!(config.io_threads, 16);
    assert_eq!(config.algorithm, HashAlgorithm::Blake3);
    assert_eq!(config.error_policy, ErrorPolicy::Continue);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
hash_enabled = false
algorithm = "sha256"
io_threads = 8
error_policy = "continue"
prune_missing = false
skip_hidden = true
ignore_patterns = ["*.tmp", "node_modules"]
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config: Config = figment.extract().unwrap();

    assert!(!config.hash_enabled);
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.io_threads, 8);
    assert_eq!(config.error_policy, ErrorPolicy::Continue);
    assert!(!config.prune_missing);
    assert!(config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["*.tmp", "node_modules"]);
    // Keys absent from the file keep their defaults.
    assert!(!config.force_rehash);
}

#[test]
fn test_env_overrides_explicit_file() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("hashkeep.toml");
    fs::write(&config_path, "io_threads = 2\nforce_rehash = true\n").unwrap();

    std::env::set_var("HASHKEEP_IO_THREADS", "6");
    let result = Config::load(Some(&config_path));
    std::env::remove_var("HASHKEEP_IO_THREADS");

    let config = result.unwrap();
    assert_eq!(config.io_threads, 6);
    assert!(config.force_rehash);
}

#[test]
fn test_config_invalid_value_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "algorithm = \"md5\"\n").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_malformed_toml_is_an_error() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = = 4").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_saved_as_toml_loads_back() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let config = Config {
        io_threads: 3,
        print_tables: true,
        ..Default::default()
    };
    fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let loaded: Config = figment.extract().unwrap();
    assert_eq!(loaded, config);
}
