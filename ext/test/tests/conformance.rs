//! Conformance tests that run YAML fixtures against lognorm
//!
//! Run with: cargo test -p lognorm-test --test conformance

#![cfg(feature = "fixtures")]

use lognorm_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

fn init_tracing() {
    // Already set by an earlier test in this binary.
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    init_tracing();
    if !dir.exists() {
        panic!("Fixtures directory does not exist: {}", dir.display());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures in {}", dir.display());

    for path in paths {
        println!("Running fixture: {}", path.display());

        let yaml = fs::read_to_string(&path).expect("read yaml");

        // Parse potentially multiple fixtures (separated by ---)
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

#[test]
fn test_matching() {
    run_fixtures_in_dir(&fixtures_dir().join("01_matching"));
}

#[test]
fn test_rule_order() {
    run_fixtures_in_dir(&fixtures_dir().join("02_rule_order"));
}

#[test]
fn test_sequences() {
    run_fixtures_in_dir(&fixtures_dir().join("03_sequences"));
}

#[test]
fn test_cache_and_templates() {
    run_fixtures_in_dir(&fixtures_dir().join("04_cache_and_templates"));
}

#[test]
fn test_config_errors() {
    run_fixtures_in_dir(&fixtures_dir().join("05_config_errors"));
}
