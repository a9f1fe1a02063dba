//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the lognorm processor.
//!
//! ```yaml
//! name: info_rule
//! description: A literal prefix and a trailing field
//! rules:
//!   rules:
//!     - name: info
//!       pattern: [{text: "[INFO] "}, {field: message}]
//!       output: "[info:{message}]"
//! cases:
//!   - name: matches
//!     input: ["[INFO] hello"]
//!     expect: ["[info:hello]"]
//!     stats: {lines_matched: 1}
//! ```
//!
//! A string in `expect` is a single output line; a list is a sequence block.
//! A fixture with `expect_error` instead asserts that its rules fail to load
//! with a message containing that text.

use lognorm::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    pub description: String,
    pub rules: RulesConfig,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Test case: input lines run through a fresh processor
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub input: Vec<String>,
    pub expect: Vec<ExpectedOutput>,
    #[serde(default)]
    pub stats: ExpectedStats,
}

/// One expected output: a line or a block
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExpectedOutput {
    Line(String),
    Block(Vec<String>),
}

impl From<Output> for ExpectedOutput {
    fn from(output: Output) -> Self {
        match output {
            Output::Line(line) => Self::Line(line),
            Output::Block(lines) => Self::Block(lines),
        }
    }
}

/// Counters to check; absent counters are not checked
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedStats {
    pub lines_processed: Option<u64>,
    pub lines_matched: Option<u64>,
    pub cache_hits: Option<u64>,
    pub cache_misses: Option<u64>,
    pub template_errors: Option<u64>,
    pub sequences_started: Option<u64>,
    pub sequences_flushed: Option<u64>,
}

impl ExpectedStats {
    /// Names of counters that differ, with expected and actual values
    pub fn mismatches(&self, actual: &Stats) -> Vec<(&'static str, u64, u64)> {
        let checks = [
            ("lines_processed", self.lines_processed, actual.lines_processed),
            ("lines_matched", self.lines_matched, actual.lines_matched),
            ("cache_hits", self.cache_hits, actual.cache_hits),
            ("cache_misses", self.cache_misses, actual.cache_misses),
            ("template_errors", self.template_errors, actual.template_errors),
            ("sequences_started", self.sequences_started, actual.sequences_started),
            ("sequences_flushed", self.sequences_flushed, actual.sequences_flushed),
        ];
        checks
            .into_iter()
            .filter_map(|(name, expected, actual)| {
                expected
                    .filter(|e| *e != actual)
                    .map(|e| (name, e, actual))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: Vec<ExpectedOutput>,
    pub actual: Vec<ExpectedOutput>,
    pub stats_mismatches: Vec<(&'static str, u64, u64)>,
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Run all test cases and return results
    ///
    /// Fails if the rules do not load.
    pub fn run(&self) -> Result<Vec<CaseResult>, ConfigError> {
        let rules = Arc::new(self.rules.build()?);
        Ok(self
            .cases
            .iter()
            .map(|case| {
                let mut processor =
                    Processor::with_config(Arc::clone(&rules), self.rules.options.clone());
                let actual: Vec<ExpectedOutput> = processor
                    .normalize(&case.input)
                    .map(ExpectedOutput::from)
                    .collect();
                let stats_mismatches = case.stats.mismatches(&processor.stats());
                CaseResult {
                    case_name: case.name.clone(),
                    passed: actual == case.expect && stats_mismatches.is_empty(),
                    expected: case.expect.clone(),
                    actual,
                    stats_mismatches,
                }
            })
            .collect())
    }

    /// Run all test cases (or the load-error check) and panic on first failure
    pub fn run_and_assert(&self) {
        if let Some(expected) = &self.expect_error {
            match self.rules.build() {
                Ok(_) => panic!(
                    "Fixture '{}': expected load error containing {:?}, but rules loaded",
                    self.name, expected
                ),
                Err(err) => assert!(
                    err.to_string().contains(expected.as_str()),
                    "Fixture '{}': error {:?} does not contain {:?}",
                    self.name,
                    err.to_string(),
                    expected
                ),
            }
            return;
        }

        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}': rules failed to load: {e}", self.name));
        for result in results {
            pretty_assertions::assert_eq!(
                result.expected,
                result.actual,
                "Fixture '{}' case '{}' output",
                self.name,
                result.case_name
            );
            assert!(
                result.passed,
                "Fixture '{}' case '{}' stats differ (name, expected, actual): {:?}",
                self.name, result.case_name, result.stats_mismatches
            );
        }
    }
}
