//! Rule: pattern + output template, optionally leading a sequence
//!
//! A [`Rule`] is validated structurally when it is built: patterns must be
//! non-empty, literals and alternative lists non-empty, nesting bounded by
//! [`MAX_DEPTH`], and no greedy field may be left without a delimiter. Checks
//! that span rules (unique names, template placeholders) happen when rules
//! are assembled into a [`RuleSet`](crate::RuleSet).

use crate::line_matcher::Remaining;
use crate::{Component, ConfigError, FieldParser, Template, MAX_DEPTH};

/// An immutable normalization rule.
///
/// # Example
///
/// ```
/// use lognorm::{Component, Rule};
///
/// let question = Rule::new(
///     "question",
///     vec![Component::literal("Q: "), Component::field("text")],
///     "[question:{text}]",
/// )
/// .unwrap()
/// .with_followers(vec![Rule::follower(
///     "question_detail",
///     vec![Component::literal("  "), Component::field("text")],
/// )
/// .unwrap()])
/// .unwrap();
///
/// assert!(question.is_leader());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: String,
    components: Vec<Component>,
    template: Template,
    sequence: Option<SequenceSpec>,
}

/// Follower rules that extend a matched leader into a multi-line block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceSpec {
    followers: Vec<Rule>,
}

impl SequenceSpec {
    /// Followers in the order they are tried.
    #[must_use]
    pub fn followers(&self) -> &[Rule] {
        &self.followers
    }
}

impl Rule {
    /// Build a rule from its pattern and output template.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming this rule if the template does not
    /// parse or the pattern is structurally invalid.
    pub fn new(
        name: impl Into<String>,
        components: Vec<Component>,
        output: &str,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let template = Template::parse(output).map_err(|source| ConfigError::MalformedTemplate {
            rule: name.clone(),
            source,
        })?;
        Self::with_template(name, components, template)
    }

    /// Build a follower that keeps the matched line as its output.
    ///
    /// # Errors
    ///
    /// Same structural checks as [`Rule::new`].
    pub fn follower(
        name: impl Into<String>,
        components: Vec<Component>,
    ) -> Result<Self, ConfigError> {
        Self::with_template(name.into(), components, Template::identity())
    }

    fn with_template(
        name: String,
        components: Vec<Component>,
        template: Template,
    ) -> Result<Self, ConfigError> {
        let rule = Self {
            name,
            components,
            template,
            sequence: None,
        };
        rule.validate_structure()?;
        Ok(rule)
    }

    /// Make this rule a sequence leader.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NestedSequence`] if a follower is itself a
    /// leader; sequences do not nest.
    pub fn with_followers(mut self, followers: Vec<Rule>) -> Result<Self, ConfigError> {
        if let Some(nested) = followers.iter().find(|f| f.is_leader()) {
            return Err(ConfigError::NestedSequence {
                rule: self.name,
                follower: nested.name.clone(),
            });
        }
        self.sequence = Some(SequenceSpec { followers });
        Ok(self)
    }

    /// The rule's unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pattern.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The output template.
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Followers, if this rule leads a sequence.
    #[must_use]
    pub fn sequence(&self) -> Option<&SequenceSpec> {
        self.sequence.as_ref()
    }

    /// Returns `true` if matching this rule opens a sequence.
    #[must_use]
    pub fn is_leader(&self) -> bool {
        self.sequence.is_some()
    }

    /// Every field name the pattern can bind, in pattern order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for component in &self.components {
            component.collect_field_names(&mut names);
        }
        names
    }

    /// Maximum nesting depth of the pattern.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.components
            .iter()
            .map(Component::depth)
            .max()
            .unwrap_or(0)
    }

    /// The template's first placeholder that names no field of the pattern.
    pub(crate) fn undefined_placeholder(&self) -> Option<&str> {
        let names = self.field_names();
        self.template
            .placeholders()
            .find(|placeholder| !names.contains(placeholder))
    }

    fn validate_structure(&self) -> Result<(), ConfigError> {
        if self.components.is_empty() {
            return Err(ConfigError::EmptyPattern {
                rule: self.name.clone(),
            });
        }
        let depth = self.depth();
        if depth > MAX_DEPTH {
            return Err(ConfigError::DepthExceeded {
                rule: self.name.clone(),
                depth,
                max: MAX_DEPTH,
            });
        }
        self.check_components(&self.components, "pattern")?;
        self.check_delimiters(&self.components, None, "pattern")
    }

    fn check_components(&self, components: &[Component], path: &str) -> Result<(), ConfigError> {
        for (i, component) in components.iter().enumerate() {
            match component {
                Component::Literal(text) if text.is_empty() => {
                    return Err(ConfigError::EmptyLiteral {
                        rule: self.name.clone(),
                        at: format!("{path}[{i}]"),
                    });
                }
                Component::Alternatives(branches) if branches.is_empty() => {
                    return Err(ConfigError::EmptyAlternatives {
                        rule: self.name.clone(),
                        at: format!("{path}[{i}]"),
                    });
                }
                Component::Alternatives(branches) => {
                    for (b, branch) in branches.iter().enumerate() {
                        self.check_components(branch, &format!("{path}[{i}].alternatives[{b}]"))?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Reject greedy fields whose extent would be ambiguous: a greedy field
    /// must be followed by a delimiter or by nothing at all.
    fn check_delimiters(
        &self,
        components: &[Component],
        outer: Option<&Remaining<'_, '_>>,
        path: &str,
    ) -> Result<(), ConfigError> {
        for (i, component) in components.iter().enumerate() {
            let remaining = Remaining {
                head: &components[i + 1..],
                outer,
            };
            match component {
                Component::Field {
                    name,
                    parser: FieldParser::Greedy,
                } => {
                    if let Some(next) = remaining.next_component() {
                        if !next.is_delimiter() {
                            return Err(ConfigError::AmbiguousFields {
                                rule: self.name.clone(),
                                field: name.clone(),
                                at: format!("{path}[{i}]"),
                                next: next.to_string(),
                            });
                        }
                    }
                }
                Component::Alternatives(branches) => {
                    for (b, branch) in branches.iter().enumerate() {
                        self.check_delimiters(
                            branch,
                            Some(&remaining),
                            &format!("{path}[{i}].alternatives[{b}]"),
                        )?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
