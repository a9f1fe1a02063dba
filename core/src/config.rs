//! Config types for rule loading.
//!
//! These types mirror the runtime rule types but are serde-deserializable,
//! so rule files can be written in YAML or JSON and built into a
//! [`RuleSet`].
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type | Builder |
//! |-------------|-------------|---------|
//! | [`RulesConfig`] | [`RuleSet`] + [`ProcessorConfig`] | [`RulesConfig::build`] |
//! | [`RuleConfig`] | [`Rule`] | [`RuleConfig::build`] |
//! | [`FollowerConfig`] | [`Rule`] (follower) | via [`RuleConfig::build`] |
//! | [`ComponentConfig`] | [`Component`] | via [`RuleConfig::build`] |
//!
//! ```yaml
//! template_check: strict
//! options:
//!   cache_capacity: 65536
//! rules:
//!   - name: info
//!     pattern:
//!       - text: "[INFO] "
//!       - field: message
//!     output: "[info:{message}]"
//! ```

use crate::{
    Component, ConfigError, FieldParser, Processor, ProcessorConfig, Rule, RuleSet, SpecialClass,
    TemplateCheck,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors from reading and building a rules file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read rules from {}", path.display())]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document does not describe a rules file.
    #[error("invalid YAML rules: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document does not describe a rules file.
    #[error("invalid JSON rules: {0}")]
    Json(#[from] serde_json::Error),

    /// The rules deserialized but are not valid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A complete rules file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    /// How placeholders naming no pattern field are treated.
    #[serde(default)]
    pub template_check: TemplateCheck,

    /// Settings for processors built from this file.
    #[serde(default)]
    pub options: ProcessorConfig,

    /// Rules in priority order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Configuration for a [`Rule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Unique rule name.
    pub name: String,

    /// Components matched left to right.
    pub pattern: Vec<ComponentConfig>,

    /// Output template.
    pub output: String,

    /// Followers, when this rule opens a sequence.
    #[serde(default)]
    pub sequence: Option<SequenceConfig>,
}

/// The `sequence:` block of a leader rule.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceConfig {
    /// Followers tried in order.
    #[serde(default)]
    pub followers: Vec<FollowerConfig>,
}

/// Configuration for a follower rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowerConfig {
    /// Follower name. Defaults to `<leader>#<index>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Components matched left to right.
    pub pattern: Vec<ComponentConfig>,

    /// Output template. Defaults to the matched line unchanged.
    #[serde(default)]
    pub output: Option<String>,
}

/// Configuration for a pattern [`Component`].
///
/// Each variant is recognized by its key:
///
/// ```yaml
/// - text: "[INFO] "              # literal
/// - serialized: "\t"             # one special literal per character
/// - special: whitespace          # named character class
/// - field: code                  # greedy field
///   parser: NUMBER               # or numeric
/// - alternatives:                # first matching branch wins
///     - [{text: "GET"}]
///     - [{text: "POST"}]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum ComponentConfig {
    /// Literal text.
    Text {
        /// The exact text.
        text: String,
    },
    /// Characters matched one special literal each.
    Serialized {
        /// Characters, usually control or whitespace.
        serialized: String,
    },
    /// A named character class.
    Special {
        /// Class name, e.g. `tab` or `whitespace`.
        special: String,
    },
    /// A named field.
    Field {
        /// Binding name.
        field: String,
        /// Parser name; greedy when absent.
        #[serde(default)]
        parser: Option<String>,
    },
    /// Alternative component sequences.
    Alternatives {
        /// Branches in priority order.
        alternatives: Vec<Vec<ComponentConfig>>,
    },
}

impl RulesConfig {
    /// Parse a YAML rules document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Yaml`] if the document does not deserialize.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON rules document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Json`] if the document does not deserialize.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a rules file. `.json` files are parsed as JSON, anything else
    /// as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Io`] if the file cannot be read, or a parse
    /// error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Build and validate the rule set.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, in rule order.
    pub fn build(&self) -> Result<RuleSet, ConfigError> {
        let rules = self
            .rules
            .iter()
            .map(RuleConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        RuleSet::with_template_check(rules, self.template_check)
    }

    /// Build the rule set and a processor using [`options`](Self::options).
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn processor(&self) -> Result<Processor, ConfigError> {
        Ok(Processor::with_config(
            Arc::new(self.build()?),
            self.options.clone(),
        ))
    }
}

impl RuleConfig {
    /// Build the rule and its followers.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming this rule or one of its followers.
    pub fn build(&self) -> Result<Rule, ConfigError> {
        let rule = Rule::new(
            &self.name,
            build_pattern(&self.name, &self.pattern)?,
            &self.output,
        )?;
        let Some(sequence) = &self.sequence else {
            return Ok(rule);
        };
        let followers = sequence
            .followers
            .iter()
            .enumerate()
            .map(|(index, follower)| follower.build(&self.name, index))
            .collect::<Result<Vec<_>, _>>()?;
        rule.with_followers(followers)
    }
}

impl FollowerConfig {
    fn build(&self, leader: &str, index: usize) -> Result<Rule, ConfigError> {
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("{leader}#{index}"));
        let pattern = build_pattern(&name, &self.pattern)?;
        match &self.output {
            Some(output) => Rule::new(name, pattern, output),
            None => Rule::follower(name, pattern),
        }
    }
}

impl RuleSet {
    /// Build a rule set from deserialized config.
    ///
    /// # Errors
    ///
    /// See [`RulesConfig::build`].
    pub fn from_config(config: &RulesConfig) -> Result<Self, ConfigError> {
        config.build()
    }
}

fn build_pattern(rule: &str, pattern: &[ComponentConfig]) -> Result<Vec<Component>, ConfigError> {
    let mut out = Vec::with_capacity(pattern.len());
    for component in pattern {
        component.build_into(rule, &mut out)?;
    }
    Ok(out)
}

impl ComponentConfig {
    fn build_into(&self, rule: &str, out: &mut Vec<Component>) -> Result<(), ConfigError> {
        match self {
            Self::Text { text } => out.push(Component::literal(text.clone())),
            // An empty string is left to the empty-literal check.
            Self::Serialized { serialized } if serialized.is_empty() => {
                out.push(Component::literal(""));
            }
            Self::Serialized { serialized } => {
                out.extend(
                    serialized
                        .chars()
                        .map(|c| Component::special(SpecialClass::Char(c))),
                );
            }
            Self::Special { special } => {
                let class =
                    SpecialClass::from_name(special).ok_or_else(|| ConfigError::UnknownSpecialClass {
                        rule: rule.to_string(),
                        name: special.clone(),
                    })?;
                out.push(Component::special(class));
            }
            Self::Field { field, parser } => {
                let parser = match parser {
                    None => FieldParser::Greedy,
                    Some(name) => {
                        FieldParser::from_name(name).ok_or_else(|| ConfigError::UnknownParser {
                            rule: rule.to_string(),
                            field: field.clone(),
                            parser: name.clone(),
                        })?
                    }
                };
                out.push(Component::Field {
                    name: field.clone(),
                    parser,
                });
            }
            Self::Alternatives { alternatives } => {
                let branches = alternatives
                    .iter()
                    .map(|branch| build_pattern(rule, branch))
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(Component::alternatives(branches));
            }
        }
        Ok(())
    }
}

impl Processor {
    /// Build a processor straight from deserialized config.
    ///
    /// # Errors
    ///
    /// See [`RulesConfig::build`].
    pub fn from_config(config: &RulesConfig) -> Result<Self, ConfigError> {
        config.processor()
    }
}
