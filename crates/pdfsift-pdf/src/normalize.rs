use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}\u{000B}\u{000C}]+").unwrap());
static SPACE_AROUND_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Expand common typographic ligatures found in PDFs.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Final cleanup applied by a strategy before handing text to the validator.
///
/// - `\r\n` and `\r` become `\n`; other control characters are dropped
/// - runs of horizontal whitespace collapse to one space, lines are trimmed
/// - three or more consecutive newlines collapse to a blank line
pub fn normalize_text(text: &str) -> String {
    let expanded = expand_ligatures(text);
    let unified = expanded.replace("\r\n", "\n").replace('\r', "\n");
    let cleaned: String = unified
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect();

    let collapsed = HORIZONTAL_WS.replace_all(&cleaned, " ");
    let trimmed_lines = SPACE_AROUND_NEWLINE.replace_all(&collapsed, "\n");
    let squeezed = EXCESS_NEWLINES.replace_all(&trimmed_lines, "\n\n");
    squeezed.trim().to_string()
}
