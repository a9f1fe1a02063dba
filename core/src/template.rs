//! Output templates
//!
//! A template is parsed once, at rule construction, into literal and
//! placeholder segments. `{name}` is replaced by the value bound to `name`;
//! `{{` and `}}` produce literal braces.

use std::collections::BTreeMap;
use std::fmt;

/// A syntax error in an output template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at byte {position}")]
pub struct TemplateError {
    /// Byte offset of the offending brace.
    pub position: usize,
    /// What is wrong.
    pub reason: &'static str,
}

/// A placeholder had no binding at render time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template references unbound field \"{field}\"")]
pub struct MissingField {
    /// The placeholder name that could not be resolved.
    pub field: String,
}

/// How rule loading treats placeholders that name no field of the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TemplateCheck {
    /// Reject the rule set at load time.
    #[default]
    Strict,
    /// Load the rule; lines it matches are passed through unchanged and
    /// counted as template errors.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(String),
}

/// A parsed output template.
///
/// # Example
///
/// ```
/// use lognorm::Template;
/// use std::collections::BTreeMap;
///
/// let template = Template::parse("[info:{message}]").unwrap();
/// let bindings = BTreeMap::from([("message".to_string(), "hello".to_string())]);
/// assert_eq!(template.render("[INFO] hello", &bindings).unwrap(), "[info:hello]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    identity: bool,
}

impl Template {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for an unclosed `{`, an empty `{}`, a nested
    /// `{`, or a lone `}`.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    text.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => {
                                return Err(TemplateError {
                                    position: inner_pos,
                                    reason: "nested '{' inside placeholder",
                                })
                            }
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError {
                            position: pos,
                            reason: "unclosed placeholder",
                        });
                    }
                    if name.is_empty() {
                        return Err(TemplateError {
                            position: pos,
                            reason: "empty placeholder",
                        });
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Field(name));
                }
                '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    text.push('}');
                }
                '}' => {
                    return Err(TemplateError {
                        position: pos,
                        reason: "unmatched '}' (write '}}' for a literal brace)",
                    })
                }
                other => text.push(other),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
            identity: false,
        })
    }

    /// A template that renders the matched line itself.
    ///
    /// Used for sequence followers declared without an output.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            source: String::new(),
            segments: Vec::new(),
            identity: true,
        }
    }

    /// The template as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` for [`Template::identity`].
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Placeholder names in order of appearance (duplicates included).
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Field(name) => Some(name.as_str()),
            Segment::Text(_) => None,
        })
    }

    /// Substitute every placeholder with its binding.
    ///
    /// `line` is only used by the identity template.
    ///
    /// # Errors
    ///
    /// Returns [`MissingField`] for the first placeholder with no binding.
    pub fn render(
        &self,
        line: &str,
        bindings: &BTreeMap<String, String>,
    ) -> Result<String, MissingField> {
        if self.identity {
            return Ok(line.to_string());
        }

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(name) => match bindings.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(MissingField {
                            field: name.clone(),
                        })
                    }
                },
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identity {
            f.write_str("<line>")
        } else {
            f.write_str(&self.source)
        }
    }
}
