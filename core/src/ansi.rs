//! ANSI escape stripping
//!
//! Colorized logs carry `ESC [ params letter` sequences that would otherwise
//! have to be spelled out in every pattern. They are removed before matching.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static ANSI_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("ANSI escape regex is valid"));

/// Remove ANSI CSI escape sequences from `line`.
///
/// Borrows when there is nothing to strip.
///
/// ```
/// use lognorm::strip_ansi;
///
/// assert_eq!(strip_ansi("\x1b[31mERROR\x1b[0m disk"), "ERROR disk");
/// assert_eq!(strip_ansi("plain"), "plain");
/// ```
#[must_use]
pub fn strip(line: &str) -> Cow<'_, str> {
    if !line.contains('\x1b') {
        return Cow::Borrowed(line);
    }
    ANSI_ESCAPE.replace_all(line, "")
}
