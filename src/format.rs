//! Post-processing for extracted text.
//!
//! Two modes, picked by `preserve_formatting`:
//! - preserve: keep line breaks, trim trailing line spaces, allow at most one
//!   blank line in a row.
//! - collapse: re-join words hyphenated across a line break, then squeeze
//!   every whitespace run into a single space.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_LINE_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+\n").expect("valid trailing-space pattern"));
static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line pattern"));
static BROKEN_HYPHENATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-[ \t]*\n\s*(\w)").expect("valid hyphenation pattern"));

pub fn postprocess(text: &str, preserve_formatting: bool) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = normalize_line_endings(text);
    if preserve_formatting {
        preserve_lines(&text)
    } else {
        collapse_whitespace(&join_hyphenated(&text))
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\x0c', "\n")
}

fn preserve_lines(text: &str) -> String {
    let text = TRAILING_LINE_SPACE.replace_all(text, "\n");
    let text = EXCESS_BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

fn join_hyphenated(text: &str) -> String {
    BROKEN_HYPHENATION.replace_all(text, "$1$2").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins the non-empty parts with a blank line.
pub fn join_blocks<'a, I>(parts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
