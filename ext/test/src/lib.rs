//! lognorm-test: conformance fixtures for lognorm
//!
//! Fixtures are YAML documents under `fixtures/`, each describing a rules
//! file, input lines, the expected output (lines and sequence blocks) and
//! the expected counters. `tests/conformance.rs` runs every fixture.
//!
//! # Example
//!
//! ```
//! use lognorm_test::fixture::Fixture;
//!
//! let fixture = Fixture::from_yaml(r#"
//! name: passthrough
//! description: Lines no rule matches come out unchanged
//! rules:
//!   rules: []
//! cases:
//!   - name: unchanged
//!     input: ["anything"]
//!     expect: ["anything"]
//!     stats: {lines_matched: 0}
//! "#).unwrap();
//!
//! fixture.run_and_assert();
//! ```

#[cfg(feature = "fixtures")]
pub mod fixture;
