//! Rule engine: ordered rule set with first-match-wins semantics
//!
//! A [`RuleSet`] is the validated, immutable collection of rules for a
//! session. It is `Send + Sync` and is meant to be shared between processors
//! behind an `Arc`.

use crate::line_matcher::match_line;
use crate::{ConfigError, EvalStep, EvalTrace, MatchResult, Rule, TemplateCheck};
use std::collections::HashSet;

/// Validated rules in declaration order.
///
/// # INV: First-match-wins
///
/// Rules are tried in declaration order. The first rule whose pattern
/// covers the whole line wins, even if later rules would also match.
///
/// # Example
///
/// ```
/// use lognorm::{Component, Rule, RuleSet};
///
/// let rules = RuleSet::new(vec![
///     Rule::new(
///         "error",
///         vec![Component::field("ts"), Component::literal(" ERROR "), Component::field("msg")],
///         "[error:{msg}]",
///     )
///     .unwrap(),
/// ])
/// .unwrap();
///
/// let m = rules.evaluate("10:00 ERROR disk full").unwrap();
/// assert_eq!(m.rule_name, "error");
/// assert!(rules.evaluate("10:00 INFO ok").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Assemble rules with [`TemplateCheck::Strict`].
    ///
    /// # Errors
    ///
    /// See [`RuleSet::with_template_check`].
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        Self::with_template_check(rules, TemplateCheck::Strict)
    }

    /// Assemble rules, validating what spans more than one rule.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateRule`] when two rules (leaders and followers
    ///   share one namespace) have the same name.
    /// - [`ConfigError::UndefinedTemplateField`] in strict mode, when a
    ///   template names a field its pattern never binds.
    pub fn with_template_check(
        rules: Vec<Rule>,
        check: TemplateCheck,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let all = rules.iter().flat_map(|rule| {
            std::iter::once(rule).chain(rule.sequence().into_iter().flat_map(|s| s.followers()))
        });

        for rule in all {
            if !seen.insert(rule.name()) {
                return Err(ConfigError::DuplicateRule {
                    rule: rule.name().to_string(),
                });
            }
            if let Some(field) = rule.undefined_placeholder() {
                match check {
                    TemplateCheck::Strict => {
                        return Err(ConfigError::UndefinedTemplateField {
                            rule: rule.name().to_string(),
                            field: field.to_string(),
                        });
                    }
                    TemplateCheck::Lenient => tracing::warn!(
                        rule = rule.name(),
                        field,
                        "template references a field the pattern never binds"
                    ),
                }
            }
        }

        tracing::debug!(
            rules = rules.len(),
            leaders = rules.iter().filter(|r| r.is_leader()).count(),
            "rule set loaded"
        );
        Ok(Self { rules })
    }

    /// Evaluate `line` against the rules in order.
    ///
    /// Returns the first match, or `None` if no rule covers the line.
    #[must_use]
    pub fn evaluate(&self, line: &str) -> Option<MatchResult> {
        self.evaluate_indexed(line).map(|(_, m)| m)
    }

    /// Like [`evaluate`](Self::evaluate), also returning the winning rule's
    /// declaration index.
    #[must_use]
    pub fn evaluate_indexed(&self, line: &str) -> Option<(usize, MatchResult)> {
        self.evaluate_rule(line).map(|(index, _, m)| (index, m))
    }

    /// First match together with the winning rule itself.
    pub(crate) fn evaluate_rule(&self, line: &str) -> Option<(usize, &Rule, MatchResult)> {
        self.rules
            .iter()
            .enumerate()
            .find_map(|(index, rule)| match_line(rule, line).map(|m| (index, rule, m)))
    }

    /// Evaluate with a record of every rule tried.
    #[must_use]
    pub fn evaluate_with_trace(&self, line: &str) -> EvalTrace {
        let mut steps = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let result = match_line(rule, line);
            steps.push(EvalStep {
                index,
                rule: rule.name().to_string(),
                matched: result.is_some(),
            });
            if result.is_some() {
                return EvalTrace { result, steps };
            }
        }
        EvalTrace {
            result: None,
            steps,
        }
    }

    /// The rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule at declaration index `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Rule with the given name (top-level rules only).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// Number of top-level rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if there are no rules; every line passes through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
