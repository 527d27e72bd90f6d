//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Loading and validating real config files on disk
//! - Resolution order (CLI > MTBF_CONFIG > MTBF_CONFIG_DIR > XDG > defaults)
//! - Snapshot provenance

use mtbf_config::resolve::{resolve_config, ConfigSource};
use mtbf_config::{load_config, EngineConfig, ValidationError};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["MTBF_CONFIG", "MTBF_CONFIG_DIR", "XDG_CONFIG_HOME"];

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_config(path: &Path, shape: f64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    let json = format!(
        r#"{{ "schema_version": "1.0.0", "distribution": {{ "shape": {shape} }} }}"#
    );
    fs::write(path, json).expect("write config");
}

#[test]
fn test_defaults_when_nothing_found() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let xdg = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", xdg.path());

        let loaded = load_config(None).expect("defaults load");
        assert_eq!(loaded.config, EngineConfig::default());
        assert_eq!(loaded.snapshot.source, "builtin default");
    });
}

#[test]
fn test_resolution_order() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let root = TempDir::new().unwrap();
        let xdg_home = root.path().join("xdg");
        let config_dir = root.path().join("dir");
        let env_file = root.path().join("env.json");
        let cli_file = root.path().join("cli.json");
        write_config(&xdg_home.join("mtbf").join("config.json"), 1.1);
        write_config(&config_dir.join("config.json"), 1.2);
        write_config(&env_file, 1.3);
        write_config(&cli_file, 1.4);

        env::set_var("XDG_CONFIG_HOME", &xdg_home);
        let paths = resolve_config(None);
        assert_eq!(paths.source, ConfigSource::XdgConfig);
        assert_eq!(load_config(None).unwrap().config.distribution.shape, 1.1);

        env::set_var("MTBF_CONFIG_DIR", &config_dir);
        assert_eq!(load_config(None).unwrap().config.distribution.shape, 1.2);
        assert_eq!(resolve_config(None).source, ConfigSource::Environment);

        env::set_var("MTBF_CONFIG", &env_file);
        assert_eq!(load_config(None).unwrap().config.distribution.shape, 1.3);

        let loaded = load_config(Some(&cli_file)).unwrap();
        assert_eq!(loaded.config.distribution.shape, 1.4);
        assert_eq!(loaded.snapshot.source, "CLI argument");
        assert_eq!(
            loaded.snapshot.config_path.as_deref(),
            Some(cli_file.display().to_string().as_str())
        );
    });
}

#[test]
fn test_missing_env_path_falls_through() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let root = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", root.path());
        env::set_var("MTBF_CONFIG", root.path().join("nope.json"));
        let paths = resolve_config(None);
        assert_eq!(paths.source, ConfigSource::BuiltinDefault);
        assert!(paths.config.is_none());
    });
}

#[test]
fn test_missing_cli_path_is_io_error() {
    let root = TempDir::new().unwrap();
    let err = load_config(Some(&root.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, ValidationError::IoError(_)));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("bad.json");
    fs::write(
        &path,
        r#"{ "schema_version": "1.0.0", "sequential": { "discrimination_ratio": 0.8 } }"#,
    )
    .unwrap();
    let err = load_config(Some(&path)).unwrap_err();
    assert_eq!(err.field(), Some("sequential.discrimination_ratio"));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let root = TempDir::new().unwrap();
    let path = root.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        EngineConfig::from_file(&path),
        Err(ValidationError::ParseError(_))
    ));
}

#[test]
fn test_snapshot_hash_tracks_content() {
    let root = TempDir::new().unwrap();
    let a = root.path().join("a.json");
    let b = root.path().join("b.json");
    write_config(&a, 2.0);
    write_config(&b, 2.5);
    let sa = load_config(Some(&a)).unwrap().snapshot;
    let sa2 = load_config(Some(&a)).unwrap().snapshot;
    let sb = load_config(Some(&b)).unwrap().snapshot;
    assert_eq!(sa.config_hash, sa2.config_hash);
    assert_ne!(sa.config_hash, sb.config_hash);
    assert_eq!(sb.summary.shape, 2.5);
}
