//! Line matcher: evaluates one line against one rule's pattern
//!
//! The matcher walks the pattern left to right with a byte cursor:
//!
//! - [`Component::Literal`] must appear exactly at the cursor.
//! - [`Component::SpecialLiteral`] consumes one character of its class.
//! - A numeric [`Component::Field`] consumes the maximal run of ASCII digits.
//! - A greedy [`Component::Field`] consumes up to the leftmost occurrence of
//!   the next concrete delimiter in the *remaining* pattern, which may lie
//!   outside the sequence the field belongs to (a field ending an alternative
//!   branch is bounded by whatever follows the alternatives). With nothing
//!   left to match it runs to end of line.
//! - [`Component::Alternatives`] commits to the first branch that matches at
//!   the cursor. There is no backtracking into other branches.
//!
//! A rule matches only if the cursor ends exactly at end of line.

use crate::{Component, FieldParser, Rule};
use std::collections::BTreeMap;

/// The outcome of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Name of the rule that matched.
    pub rule_name: String,
    /// Field name → extracted value. When a name is bound more than once the
    /// last binding wins.
    pub bindings: BTreeMap<String, String>,
}

impl MatchResult {
    /// Value bound to `field`, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.bindings.get(field).map(String::as_str)
    }
}

/// The pattern still to be matched after the current component: the rest of
/// the current sequence, then the rest of each enclosing sequence.
#[derive(Clone, Copy)]
pub(crate) struct Remaining<'r, 'a> {
    pub(crate) head: &'r [Component],
    pub(crate) outer: Option<&'a Remaining<'r, 'a>>,
}

impl<'r> Remaining<'r, '_> {
    /// The next component that will be matched, crossing sequence boundaries.
    pub(crate) fn next_component(&self) -> Option<&'r Component> {
        match self.head.first() {
            Some(component) => Some(component),
            None => self.outer.and_then(|outer| outer.next_component()),
        }
    }
}

/// Match `line` against `rule`'s pattern.
///
/// Returns `None` unless the whole line is consumed.
///
/// # Example
///
/// ```
/// use lognorm::{match_line, Component, Rule};
///
/// let rule = Rule::new(
///     "info",
///     vec![Component::literal("[INFO] "), Component::field("message")],
///     "{message}",
/// )
/// .unwrap();
///
/// let m = match_line(&rule, "[INFO] hello").unwrap();
/// assert_eq!(m.get("message"), Some("hello"));
/// assert!(match_line(&rule, "[WARN] hello").is_none());
/// ```
#[must_use]
pub fn match_line(rule: &Rule, line: &str) -> Option<MatchResult> {
    let bindings = match_components(rule.components(), line)?;
    Some(MatchResult {
        rule_name: rule.name().to_string(),
        bindings: bindings
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    })
}

/// Match a full component list against a full line.
///
/// Returns the bindings in the order they were made.
pub(crate) fn match_components<'r, 'l>(
    components: &'r [Component],
    line: &'l str,
) -> Option<Vec<(&'r str, &'l str)>> {
    let mut bindings = Vec::new();
    let end = match_sequence(components, None, line, 0, &mut bindings)?;
    // Whole-line coverage: a prefix match is not a match.
    (end == line.len()).then_some(bindings)
}

fn match_sequence<'r, 'l>(
    components: &'r [Component],
    outer: Option<&Remaining<'r, '_>>,
    line: &'l str,
    mut pos: usize,
    bindings: &mut Vec<(&'r str, &'l str)>,
) -> Option<usize> {
    for (i, component) in components.iter().enumerate() {
        let tail = &line[pos..];
        match component {
            Component::Literal(text) => {
                if !tail.starts_with(text.as_str()) {
                    return None;
                }
                pos += text.len();
            }
            Component::SpecialLiteral(class) => {
                let c = tail.chars().next().filter(|c| class.matches(*c))?;
                pos += c.len_utf8();
            }
            Component::Field {
                name,
                parser: FieldParser::Numeric,
            } => {
                let len = tail.bytes().take_while(u8::is_ascii_digit).count();
                if len == 0 {
                    return None;
                }
                bindings.push((name.as_str(), &tail[..len]));
                pos += len;
            }
            Component::Field {
                name,
                parser: FieldParser::Greedy,
            } => {
                let remaining = Remaining {
                    head: &components[i + 1..],
                    outer,
                };
                let len = match remaining.next_component() {
                    None => tail.len(),
                    Some(next) => find_delimiter(next, tail)?,
                };
                bindings.push((name.as_str(), &tail[..len]));
                pos += len;
            }
            Component::Alternatives(branches) => {
                let remaining = Remaining {
                    head: &components[i + 1..],
                    outer,
                };
                let mark = bindings.len();
                let mut matched = None;
                for branch in branches {
                    if let Some(end) =
                        match_sequence(branch, Some(&remaining), line, pos, bindings)
                    {
                        matched = Some(end);
                        break;
                    }
                    bindings.truncate(mark);
                }
                pos = matched?;
            }
        }
    }
    Some(pos)
}

/// Byte offset in `tail` of the leftmost place where `next` could begin.
///
/// Fields are never delimiters; rule validation rejects a greedy field that
/// is followed by one.
fn find_delimiter(next: &Component, tail: &str) -> Option<usize> {
    match next {
        Component::Literal(text) => tail.find(text.as_str()),
        Component::SpecialLiteral(class) => tail.find(|c| class.matches(c)),
        Component::Alternatives(branches) => branches
            .iter()
            .filter_map(|branch| branch.first().and_then(|c| find_delimiter(c, tail)))
            .min(),
        Component::Field { .. } => None,
    }
}
