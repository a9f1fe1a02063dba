//! lognorm - pattern-driven log line normalization
//!
//! Rewrites each input line into a canonical form using ordered, declarative
//! rules, so that two logs differing only in timestamps, ids or other noise
//! normalize to the same output and can be diffed.
//!
//! # Architecture
//!
//! - [`Component`] - One element of a rule pattern (literal, special
//!   character, named field, alternatives)
//! - [`Rule`] - Pattern + output [`Template`], optionally leading a sequence
//! - [`match_line`] - Whole-line match of one rule, yielding field bindings
//! - [`RuleSet`] - Ordered rules with first-match-wins semantics
//! - [`LineCache`] - Bounded LRU memo from raw line to normalized output
//! - [`SequenceProcessor`] - Idle/Buffering state machine for multi-line blocks
//! - [`Processor`] - Drives lines through all of the above, with [`Stats`]
//!   and an optional [`ExplainSink`]
//!
//! # Key Design Insights
//!
//! 1. **Rules are validated once**: every structural problem (empty pattern,
//!    adjacent greedy fields, unknown placeholder) is a [`ConfigError`] at load
//!    time. Matching itself never fails; a line either matches or passes
//!    through.
//!
//! 2. **Shared rules, owned state**: a [`RuleSet`] is immutable and
//!    `Send + Sync`. Each [`Processor`] owns its cache, sequence buffer and
//!    counters, so independent streams never share mutable state.
//!
//! 3. **No backtracking**: greedy fields stop at the leftmost next delimiter
//!    and alternatives commit to the first branch that matches.
//!
//! # Example
//!
//! ```
//! use lognorm::prelude::*;
//! use std::sync::Arc;
//!
//! let rules = RuleSet::new(vec![Rule::new(
//!     "info",
//!     vec![Component::literal("[INFO] "), Component::field("message")],
//!     "[info:{message}]",
//! )
//! .unwrap()])
//! .unwrap();
//!
//! let mut processor = Processor::new(Arc::new(rules));
//! let out: Vec<String> = processor
//!     .normalize(["[INFO] started", "[DEBUG] noise"])
//!     .flat_map(Output::into_lines)
//!     .collect();
//!
//! assert_eq!(out, vec!["[info:started]", "[DEBUG] noise"]);
//! assert_eq!(processor.stats().lines_matched, 1);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod ansi;
mod cache;
mod component;
mod engine;
mod explain;
mod line_matcher;
mod processor;
mod rule;
mod sequence;
mod stats;
mod template;
mod trace;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Pattern model
pub use component::{Component, FieldParser, SpecialClass};
pub use rule::{Rule, SequenceSpec};
pub use template::{MissingField, Template, TemplateCheck, TemplateError};

// Matching
pub use engine::RuleSet;
pub use line_matcher::{match_line, MatchResult};

// Processing
pub use ansi::strip as strip_ansi;
pub use cache::LineCache;
pub use processor::{Normalize, Output, Processor, ProcessorConfig};
pub use sequence::{Flushed, SequenceProcessor};

// Observability
pub use explain::{ExplainBuffer, ExplainKind, ExplainRecord, ExplainSink};
pub use stats::{Stats, StatsSnapshot};
pub use trace::{EvalStep, EvalTrace};

// Config (feature-gated)
#[cfg(feature = "config")]
pub use config::{
    ComponentConfig, FollowerConfig, LoadError, RuleConfig, RulesConfig, SequenceConfig,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use lognorm::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Pattern model
        Component,
        // Errors
        ConfigError,
        // Observability
        ExplainBuffer,
        ExplainKind,
        ExplainRecord,
        ExplainSink,
        FieldParser,
        MatchResult,
        // Processing
        Output,
        Processor,
        ProcessorConfig,
        Rule,
        // Matching
        RuleSet,
        SpecialClass,
        Stats,
        Template,
        TemplateCheck,
    };

    #[cfg(feature = "config")]
    pub use crate::{LoadError, RulesConfig};
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum nesting depth of a rule pattern.
///
/// Alternatives nest; matching recurses once per level. Checked when a
/// [`Rule`] is built.
pub const MAX_DEPTH: usize = 16;

/// Default number of distinct lines kept by a [`Processor`]'s cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Match rate under which a run is considered poorly covered by its rules.
///
/// See [`StatsSnapshot::below_threshold`].
pub const DEFAULT_MATCH_RATE_THRESHOLD: f64 = 0.95;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule construction and validation.
///
/// Every variant names the offending rule. These are raised while rules are
/// loaded, never while lines are processed. Fix the rules and load again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Two rules (leaders or followers) share a name.
    #[error("rule \"{rule}\" is defined more than once")]
    DuplicateRule {
        /// The repeated name.
        rule: String,
    },

    /// A rule has no pattern components.
    #[error("rule \"{rule}\" has an empty pattern")]
    EmptyPattern {
        /// Offending rule.
        rule: String,
    },

    /// A text literal is the empty string.
    #[error("rule \"{rule}\": empty text literal at {at}")]
    EmptyLiteral {
        /// Offending rule.
        rule: String,
        /// Path of the component, e.g. `pattern[1].alternatives[0][0]`.
        at: String,
    },

    /// An alternatives component lists no branches.
    #[error("rule \"{rule}\": alternatives with no branches at {at}")]
    EmptyAlternatives {
        /// Offending rule.
        rule: String,
        /// Path of the component.
        at: String,
    },

    /// A greedy field is followed by something that cannot bound it.
    #[error(
        "rule \"{rule}\": field \"{field}\" at {at} is followed by {next}, \
         which is not a delimiter; its extent would be ambiguous"
    )]
    AmbiguousFields {
        /// Offending rule.
        rule: String,
        /// The greedy field with no delimiter.
        field: String,
        /// Path of the field.
        at: String,
        /// The component that follows it.
        next: String,
    },

    /// Pattern nesting exceeds [`MAX_DEPTH`].
    #[error("rule \"{rule}\": pattern nesting depth is {depth}, but maximum allowed is {max}")]
    DepthExceeded {
        /// Offending rule.
        rule: String,
        /// Actual depth.
        depth: usize,
        /// Maximum allowed depth.
        max: usize,
    },

    /// The output template does not parse.
    #[error("rule \"{rule}\": malformed output template")]
    MalformedTemplate {
        /// Offending rule.
        rule: String,
        /// What is wrong with the template.
        source: TemplateError,
    },

    /// The output template names a field the pattern never binds.
    #[error("rule \"{rule}\": output references undefined field \"{field}\"")]
    UndefinedTemplateField {
        /// Offending rule.
        rule: String,
        /// The unknown placeholder.
        field: String,
    },

    /// A follower declares followers of its own.
    #[error("rule \"{rule}\": follower \"{follower}\" declares its own sequence; sequences do not nest")]
    NestedSequence {
        /// The leader.
        rule: String,
        /// The follower that is itself a leader.
        follower: String,
    },

    /// A special-character component names no known class.
    #[error("rule \"{rule}\": unknown special character class \"{name}\"")]
    UnknownSpecialClass {
        /// Offending rule.
        rule: String,
        /// The unrecognized class name.
        name: String,
    },

    /// A field names no known parser.
    #[error("rule \"{rule}\": field \"{field}\" uses unknown parser \"{parser}\"")]
    UnknownParser {
        /// Offending rule.
        rule: String,
        /// The field.
        field: String,
        /// The unrecognized parser name.
        parser: String,
    },
}
