//! Evaluation trace types for debugging rule ordering.
//!
//! [`RuleSet::evaluate_with_trace`](crate::RuleSet::evaluate_with_trace)
//! returns the same result as `evaluate()` plus every rule that was tried on
//! the way, which answers "why did this line match rule X and not rule Y?".
//!
//! # Example
//!
//! ```ignore
//! let trace = rules.evaluate_with_trace(line);
//! println!("Result: {:?}", trace.result);
//! for step in &trace.steps {
//!     println!("  rule[{}] {}: matched={}", step.index, step.rule, step.matched);
//! }
//! ```

use crate::MatchResult;

/// Trace of a full [`RuleSet`](crate::RuleSet) evaluation.
///
/// # INV: `result` == `evaluate()` result
///
/// The `result` field always equals what
/// [`RuleSet::evaluate()`](crate::RuleSet::evaluate) returns for the same line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalTrace {
    /// The final result (identical to what `evaluate()` returns).
    pub result: Option<MatchResult>,
    /// Every rule that was tried, in order.
    /// Stops after the first match (preserves first-match-wins).
    pub steps: Vec<EvalStep>,
}

impl EvalTrace {
    /// Index of the winning rule, if any.
    #[must_use]
    pub fn winner(&self) -> Option<usize> {
        self.steps.iter().find(|s| s.matched).map(|s| s.index)
    }
}

/// One rule's evaluation in a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalStep {
    /// Declaration index (0-based).
    pub index: usize,
    /// Rule name.
    pub rule: String,
    /// Did the pattern cover the whole line?
    pub matched: bool,
}
