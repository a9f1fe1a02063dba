//! Pattern components: the matchable units of a rule
//!
//! A rule's pattern is an ordered list of [`Component`]s. The variant set is
//! closed: literal text, a single special character, a named field, and a
//! set of alternative component sequences. Each variant has exactly one
//! matching behavior, implemented in [`line_matcher`](crate::line_matcher).

use std::fmt;

/// How a [`Component::Field`] decides where its value ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldParser {
    /// Consume up to the next concrete delimiter, or to end of line when
    /// nothing follows the field.
    #[default]
    Greedy,
    /// Consume the maximal run of ASCII digits at the cursor.
    Numeric,
}

impl FieldParser {
    /// Resolve a parser name as written in rule configuration.
    ///
    /// Accepts `GREEDY`, `ANYSTRING`, `ESTRING`, `STRING` for [`Greedy`](Self::Greedy)
    /// and `NUMERIC`, `NUMBER` for [`Numeric`](Self::Numeric), case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GREEDY" | "ANYSTRING" | "ESTRING" | "STRING" => Some(Self::Greedy),
            "NUMERIC" | "NUMBER" => Some(Self::Numeric),
            _ => None,
        }
    }
}

impl fmt::Display for FieldParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Greedy => f.write_str("GREEDY"),
            Self::Numeric => f.write_str("NUMERIC"),
        }
    }
}

/// A class of control or whitespace characters matched by
/// [`Component::SpecialLiteral`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialClass {
    /// `\t`
    Tab,
    /// A single ASCII space.
    Space,
    /// `\n`
    Newline,
    /// `\r`
    CarriageReturn,
    /// `\x1b`
    Escape,
    /// Any Unicode whitespace character.
    Whitespace,
    /// One specific character.
    Char(char),
}

impl SpecialClass {
    /// Does `c` belong to this class?
    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        match self {
            Self::Tab => c == '\t',
            Self::Space => c == ' ',
            Self::Newline => c == '\n',
            Self::CarriageReturn => c == '\r',
            Self::Escape => c == '\x1b',
            Self::Whitespace => c.is_whitespace(),
            Self::Char(expected) => c == *expected,
        }
    }

    /// Resolve a named class (`tab`, `space`, `newline`, `cr`, `escape`,
    /// `whitespace`), case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "tab" => Some(Self::Tab),
            "space" => Some(Self::Space),
            "newline" | "lf" => Some(Self::Newline),
            "cr" | "carriage_return" => Some(Self::CarriageReturn),
            "escape" | "esc" => Some(Self::Escape),
            "whitespace" | "ws" => Some(Self::Whitespace),
            _ => None,
        }
    }
}

impl fmt::Display for SpecialClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab => f.write_str("tab"),
            Self::Space => f.write_str("space"),
            Self::Newline => f.write_str("newline"),
            Self::CarriageReturn => f.write_str("cr"),
            Self::Escape => f.write_str("escape"),
            Self::Whitespace => f.write_str("whitespace"),
            Self::Char(c) => write!(f, "{:?}", c),
        }
    }
}

/// One matchable unit within a rule's pattern.
///
/// # Example
///
/// ```
/// use lognorm::{Component, FieldParser};
///
/// // "[INFO] <message>"
/// let pattern = vec![
///     Component::literal("[INFO] "),
///     Component::field("message"),
/// ];
/// assert!(matches!(
///     pattern[1],
///     Component::Field { parser: FieldParser::Greedy, .. }
/// ));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    /// Text that must appear verbatim at the cursor (case-sensitive).
    Literal(String),
    /// A single character of a control/whitespace class.
    SpecialLiteral(SpecialClass),
    /// A named capture.
    Field {
        /// Binding name, referenced as `{name}` in output templates.
        name: String,
        /// Where the captured value ends.
        parser: FieldParser,
    },
    /// Sub-sequences tried in listed order; the first that matches wins.
    Alternatives(Vec<Vec<Component>>),
}

impl Component {
    /// A [`Component::Literal`].
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// A [`Component::SpecialLiteral`].
    #[must_use]
    pub fn special(class: SpecialClass) -> Self {
        Self::SpecialLiteral(class)
    }

    /// A greedy [`Component::Field`].
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            parser: FieldParser::Greedy,
        }
    }

    /// A numeric [`Component::Field`].
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            parser: FieldParser::Numeric,
        }
    }

    /// A [`Component::Alternatives`].
    #[must_use]
    pub fn alternatives(branches: Vec<Vec<Component>>) -> Self {
        Self::Alternatives(branches)
    }

    /// Returns `true` if this component can bound a greedy field placed
    /// directly before it.
    ///
    /// Literals and special literals always can. Alternatives can only if
    /// every branch starts with a delimiter.
    #[must_use]
    pub fn is_delimiter(&self) -> bool {
        match self {
            Self::Literal(_) | Self::SpecialLiteral(_) => true,
            Self::Field { .. } => false,
            Self::Alternatives(branches) => {
                !branches.is_empty()
                    && branches
                        .iter()
                        .all(|b| b.first().is_some_and(Component::is_delimiter))
            }
        }
    }

    /// Nesting depth of this component (1 for leaves).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Alternatives(branches) => {
                1 + branches
                    .iter()
                    .flat_map(|b| b.iter().map(Component::depth))
                    .max()
                    .unwrap_or(0)
            }
            _ => 1,
        }
    }

    /// Collect the names of every field this component can bind.
    pub(crate) fn collect_field_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Field { name, .. } => out.push(name),
            Self::Alternatives(branches) => {
                for component in branches.iter().flatten() {
                    component.collect_field_names(out);
                }
            }
            Self::Literal(_) | Self::SpecialLiteral(_) => {}
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "text({text:?})"),
            Self::SpecialLiteral(class) => write!(f, "special({class})"),
            Self::Field { name, parser } => write!(f, "field({name}:{parser})"),
            Self::Alternatives(branches) => write!(f, "alternatives({})", branches.len()),
        }
    }
}
