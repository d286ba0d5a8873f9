//! Turning content-stream operators into lines of text.
//!
//! Shared by the text-layer strategy (operators from the page tree) and the
//! stream-decoder strategy (operators from raw inflated streams). Only the
//! text-showing and text-positioning operators matter here; glyph widths and
//! font encodings are not consulted.

use lopdf::Object;
use lopdf::content::Operation;

/// Accumulates text from a sequence of content-stream operators.
#[derive(Debug)]
pub(crate) struct TextCollector {
    lines: Vec<String>,
    line: String,
    word_gap: f64,
    in_text_object: bool,
    shown_in_object: bool,
}

impl TextCollector {
    /// `word_gap` is the `TJ` adjustment, in thousandths of an em, beyond
    /// which a space is inserted.
    pub(crate) fn new(word_gap: f64) -> Self {
        Self {
            lines: Vec::new(),
            line: String::new(),
            word_gap,
            in_text_object: false,
            shown_in_object: false,
        }
    }

    pub(crate) fn push_operations(&mut self, operations: &[Operation]) {
        for op in operations {
            self.push(op);
        }
    }

    fn push(&mut self, op: &Operation) {
        match op.operator.as_str() {
            "BT" => {
                self.in_text_object = true;
                self.shown_in_object = false;
            }
            "ET" => {
                self.in_text_object = false;
                if self.shown_in_object {
                    self.break_line();
                }
            }
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(string_operand) {
                    self.show(&text);
                }
            }
            "'" => {
                self.break_line();
                if let Some(text) = op.operands.last().and_then(string_operand) {
                    self.show(&text);
                }
            }
            "\"" => {
                self.break_line();
                if let Some(text) = op.operands.get(2).and_then(string_operand) {
                    self.show(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    let text = self.join_tj_items(items);
                    self.show(&text);
                }
            }
            "T*" => self.break_line(),
            "Td" | "TD" => {
                let ty = op.operands.get(1).and_then(number).unwrap_or(0.0);
                if ty.abs() > f64::EPSILON {
                    self.break_line();
                } else {
                    self.separate();
                }
            }
            _ => {}
        }
    }

    fn join_tj_items(&self, items: &[Object]) -> String {
        let mut text = String::new();
        for item in items {
            if let Some(s) = string_operand(item) {
                text.push_str(&s);
            } else if let Some(adjust) = number(item)
                && -adjust > self.word_gap
                && !text.ends_with(' ')
            {
                text.push(' ');
            }
        }
        text
    }

    /// Append one shown string, separated from the previous item by a space.
    fn show(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.in_text_object {
            self.shown_in_object = true;
        }
        self.separate();
        self.line.push_str(text);
    }

    fn separate(&mut self) {
        if !self.line.is_empty() && !self.line.ends_with(char::is_whitespace) {
            self.line.push(' ');
        }
    }

    fn break_line(&mut self) {
        if !self.line.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.line));
        } else {
            self.line.clear();
        }
    }

    /// Lines collected so far, joined with newlines.
    pub(crate) fn finish(mut self) -> String {
        self.break_line();
        self.lines.join("\n")
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn string_operand(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Decode the bytes of a PDF string object.
///
/// UTF-16BE when it carries a byte-order mark, UTF-8 when it carries one,
/// otherwise single-byte text read as Windows-1252 (which agrees with
/// Latin-1 and PDFDocEncoding for letters).
pub(crate) fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| windows_1252(b)).collect()
}

fn windows_1252(b: u8) -> char {
    match b {
        0x80 => '€',
        0x85 => '…',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '•',
        0x96 => '–',
        0x97 => '—',
        0x99 => '™',
        _ => b as char,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operator: &str, operands: Vec<Object>) -> Operation {
        Operation::new(operator, operands)
    }

    fn collect(ops: Vec<Operation>) -> String {
        let mut collector = TextCollector::new(200.0);
        collector.push_operations(&ops);
        collector.finish()
    }

    #[test]
    fn separate_show_operators_get_spaces() {
        let text = collect(vec![
            op("BT", vec![]),
            op("Tj", vec![Object::string_literal("Hello")]),
            op("Tj", vec![Object::string_literal("world")]),
            op("ET", vec![]),
        ]);
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn line_operators_break_lines() {
        let text = collect(vec![
            op("BT", vec![]),
            op("Tj", vec![Object::string_literal("first line")]),
            op("T*", vec![]),
            op("Tj", vec![Object::string_literal("second line")]),
            op("Td", vec![Object::Integer(0), Object::Real(-14.0)]),
            op("Tj", vec![Object::string_literal("third line")]),
            op("ET", vec![]),
            op("BT", vec![]),
            op("'", vec![Object::string_literal("fourth line")]),
            op("ET", vec![]),
        ]);
        assert_eq!(text, "first line\nsecond line\nthird line\nfourth line");
    }

    #[test]
    fn horizontal_td_only_separates() {
        let text = collect(vec![
            op("BT", vec![]),
            op("Tj", vec![Object::string_literal("left")]),
            op("Td", vec![Object::Integer(120), Object::Integer(0)]),
            op("Tj", vec![Object::string_literal("right")]),
            op("ET", vec![]),
        ]);
        assert_eq!(text, "left right");
    }

    #[test]
    fn tj_array_kerning_inserts_word_spaces() {
        let text = collect(vec![
            op("BT", vec![]),
            op(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Ker"),
                    Object::Integer(-15),
                    Object::string_literal("ning"),
                    Object::Integer(-450),
                    Object::string_literal("works"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(text, "Kerning works");
    }

    #[test]
    fn double_quote_operator_uses_third_operand() {
        let text = collect(vec![
            op("BT", vec![]),
            op(
                "\"",
                vec![Object::Integer(1), Object::Integer(2), Object::string_literal("spaced out")],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(text, "spaced out");
    }

    #[test]
    fn non_text_operators_are_ignored() {
        let text = collect(vec![
            op("q", vec![]),
            op("re", vec![Object::Integer(0), Object::Integer(0), Object::Integer(10), Object::Integer(10)]),
            op("f", vec![]),
            op("Q", vec![]),
        ]);
        assert_eq!(text, "");
    }

    #[test]
    fn decodes_utf16_and_single_byte_strings() {
        assert_eq!(
            decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9, 0x20, 0x14]),
            "Hé—"
        );
        assert_eq!(decode_pdf_string(b"caf\xe9 \x93ok\x94"), "café \u{201C}ok\u{201D}");
        assert_eq!(decode_pdf_string(&[0xEF, 0xBB, 0xBF, b'h', b'i']), "hi");
    }
}
