//! Rank 3: pull parenthesized string literals straight out of the file bytes.
//!
//! Needs no structure at all, so it works on truncated or hand-assembled
//! files, but it cannot see inside compressed streams and knows nothing
//! about pages.

use once_cell::sync::Lazy;
use pdfsift_core::{DocumentBuffer, ExtractionCandidate, StrategyId};
use regex::bytes::Regex;

use crate::StrategyError;

static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s-u)\((?:[^()\\]|\\.)*\)").unwrap());

/// Literals this many characters or fewer are dropped.
const MIN_RUN_LEN: usize = 2;

pub fn extract(buffer: &DocumentBuffer) -> Result<ExtractionCandidate, StrategyError> {
    let runs: Vec<String> = STRING_LITERAL
        .find_iter(buffer.as_bytes())
        .map(|m| {
            let bytes = m.as_bytes();
            unescape(&bytes[1..bytes.len() - 1])
        })
        .filter(|run| {
            run.chars().count() > MIN_RUN_LEN && run.bytes().any(|b| b.is_ascii_alphabetic())
        })
        .collect();

    let joined = runs.join(" ");
    let printable: String = joined
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    let text = printable.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.is_empty() {
        return Err(StrategyError::NoText);
    }

    Ok(ExtractionCandidate {
        text,
        page_count: 0,
        strategy: StrategyId::BytePattern,
        extracted_page_count: 0,
    })
}

/// Resolve the backslash escapes of a literal string body.
///
/// Line-break escapes become spaces; unknown escapes keep the escaped byte.
fn unescape(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if b != b'\\' || i + 1 == raw.len() {
            out.push(b as char);
            i += 1;
            continue;
        }
        let next = raw[i + 1];
        i += 2;
        match next {
            b'n' | b'r' | b't' | b'f' | b'b' => out.push(' '),
            b'\r' | b'\n' => {}
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 && i < raw.len() && (b'0'..=b'7').contains(&raw[i]) {
                    value = value * 8 + u32::from(raw[i] - b'0');
                    i += 1;
                    digits += 1;
                }
                out.push(char::from((value & 0xFF) as u8));
            }
            other => out.push(other as char),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(data: &[u8]) -> Result<ExtractionCandidate, StrategyError> {
        extract(&DocumentBuffer::from(data.to_vec()))
    }

    #[test]
    fn joins_literal_runs() {
        let candidate = run(b"%PDF-1.4\n(Hello World)(Another Chunk)\n%%EOF").unwrap();
        assert_eq!(candidate.text, "Hello World Another Chunk");
        assert_eq!(candidate.strategy, StrategyId::BytePattern);
        assert_eq!(candidate.page_count, 0);
        assert_eq!(candidate.extracted_page_count, 0);
    }

    #[test]
    fn drops_short_and_non_alphabetic_runs() {
        let candidate = run(b"(ab) (12345) (--) (kept text)").unwrap();
        assert_eq!(candidate.text, "kept text");
    }

    #[test]
    fn run_length_counts_characters_not_bytes() {
        // "a\351" decodes to two characters but three UTF-8 bytes.
        let candidate = run(br"(a\351) (x\351y)").unwrap();
        assert_eq!(candidate.text, "xy");
    }

    #[test]
    fn resolves_escapes() {
        assert_eq!(unescape(br"a\(b\)c\\d"), "a(b)c\\d");
        assert_eq!(unescape(br"line\nbreak"), "line break");
        assert_eq!(unescape(br"caf\351"), "caf\u{e9}");
        assert_eq!(unescape(b"joined\\\nline"), "joinedline");
    }

    #[test]
    fn escaped_parens_stay_inside_one_literal() {
        let candidate = run(br"(see \(note\) below)").unwrap();
        assert_eq!(candidate.text, "see (note) below");
    }

    #[test]
    fn non_ascii_is_dropped_from_output() {
        let candidate = run(br"(na\357ve words)").unwrap();
        assert_eq!(candidate.text, "nave words");
    }

    #[test]
    fn nothing_to_find() {
        assert_eq!(run(b"%PDF-1.4\n%%EOF"), Err(StrategyError::NoText));
        assert_eq!(run(b""), Err(StrategyError::NoText));
    }
}
