//! Rank 2: find raw `stream ... endstream` bodies without trusting the
//! cross-reference table, inflate them and scan their text objects.
//!
//! This recovers text from files whose object structure is too damaged for
//! the text-layer strategy but whose content streams are intact.

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use lopdf::content::Content;
use once_cell::sync::Lazy;
use pdfsift_core::{DocumentBuffer, ExtractConfig, ExtractionCandidate, StrategyId};
use regex::bytes::Regex;

use crate::StrategyError;
use crate::normalize::normalize_text;
use crate::text_ops::TextCollector;

/// Upper bound on the inflated size of a single stream.
const MAX_INFLATED_BYTES: u64 = 32 * 1024 * 1024;

/// How far back from a `stream` keyword to look for its dictionary.
const DICT_LOOKBACK: usize = 4096;

static STREAM_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)\bstream(?:\r\n|\r|\n)").unwrap());
static STREAM_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)endstream").unwrap());
static OBJ_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)\d+\s+\d+\s+obj\b").unwrap());

static NON_TEXT_DICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?-u)/Subtype\s*/(?:Image|XML|Type1C|CIDFontType0C|OpenType)\b|/Length[123]\b|/Type\s*/(?:XRef|Metadata|EmbeddedFile)\b",
    )
    .unwrap()
});
static OBJECT_STREAM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Type\s*/ObjStm\b").unwrap());
static FLATE_FILTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u)/Filter\s*\[?\s*/(?:FlateDecode|Fl)\b").unwrap());
static ANY_FILTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Filter\b").unwrap());
static PAGE_LEAF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?-u)/Type\s*/Page\b").unwrap());
/// `/Count N` of a page tree node, with the keys in either order.
static PAGES_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?-u)/Type\s*/Pages\b[^>]*?/Count\s+(\d+)|/Count\s+(\d+)[^>]*?/Type\s*/Pages\b",
    )
    .unwrap()
});

/// A located stream: the dictionary bytes preceding it and its raw body.
struct RawStream<'a> {
    dict: &'a [u8],
    body: &'a [u8],
}

pub fn extract(
    buffer: &DocumentBuffer,
    config: &ExtractConfig,
) -> Result<ExtractionCandidate, StrategyError> {
    let data = buffer.as_bytes();

    let mut decoded_streams = 0usize;
    let mut pages = PageCounter::default();
    pages.scan(data);
    let mut texts = Vec::new();

    for stream in find_streams(data) {
        if NON_TEXT_DICT.is_match(stream.dict) {
            continue;
        }
        let Some(decoded) = decode_body(&stream) else {
            continue;
        };
        decoded_streams += 1;

        if OBJECT_STREAM.is_match(stream.dict) {
            pages.scan(&decoded);
            continue;
        }
        if !contains(&decoded, b"BT") {
            continue;
        }

        match Content::decode(&decoded) {
            Ok(content) => {
                let mut collector = TextCollector::new(config.tj_word_gap);
                collector.push_operations(&content.operations);
                let text = collector.finish();
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            Err(e) => tracing::debug!(error = %e, "content stream did not tokenize"),
        }
    }

    if decoded_streams == 0 {
        return Err(StrategyError::NoStreams);
    }

    let text = normalize_text(&texts.join("\n\n"));
    if text.is_empty() {
        return Err(StrategyError::NoText);
    }

    let page_count = pages.total();
    Ok(ExtractionCandidate {
        text,
        page_count,
        strategy: StrategyId::StreamDecoder,
        extracted_page_count: page_count,
    })
}

fn find_streams(data: &[u8]) -> Vec<RawStream<'_>> {
    let mut streams = Vec::new();
    let mut pos = 0;
    while let Some(start) = STREAM_START.find_at(data, pos) {
        let body_start = start.end();
        let Some(end) = STREAM_END.find_at(data, body_start) else {
            break;
        };
        let lookback = start.start().saturating_sub(DICT_LOOKBACK);
        let window = &data[lookback..start.start()];
        let dict_start = OBJ_KEYWORD
            .find_iter(window)
            .last()
            .map(|m| lookback + m.end())
            .unwrap_or(lookback);

        streams.push(RawStream {
            dict: &data[dict_start..start.start()],
            body: trim_eol(&data[body_start..end.start()]),
        });
        pos = end.end();
    }
    streams
}

fn decode_body(stream: &RawStream<'_>) -> Option<Vec<u8>> {
    if FLATE_FILTER.is_match(stream.dict) {
        let inflated = inflate(stream.body);
        return (!inflated.is_empty()).then_some(inflated);
    }
    if ANY_FILTER.is_match(stream.dict) || stream.body.is_empty() {
        return None;
    }
    Some(stream.body.to_vec())
}

/// Inflate a Flate body, keeping whatever decodes before any corruption.
fn inflate(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = ZlibDecoder::new(body)
        .take(MAX_INFLATED_BYTES)
        .read_to_end(&mut out);
    if out.is_empty() {
        let _ = DeflateDecoder::new(body)
            .take(MAX_INFLATED_BYTES)
            .read_to_end(&mut out);
    }
    out
}

fn trim_eol(body: &[u8]) -> &[u8] {
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    body.strip_suffix(b"\r").unwrap_or(body)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// The document's own page counter, read without walking the page tree.
#[derive(Debug, Default)]
struct PageCounter {
    /// Largest `/Count` seen on a `/Type /Pages` node; the root holds the total.
    declared: Option<usize>,
    /// `/Type /Page` dictionaries. Incremental updates that rewrite a page
    /// object are counted once per revision.
    leaves: usize,
}

impl PageCounter {
    fn scan(&mut self, data: &[u8]) {
        for caps in PAGES_COUNT.captures_iter(data) {
            let count = caps
                .get(1)
                .or_else(|| caps.get(2))
                .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
                .and_then(|digits| digits.parse::<usize>().ok());
            if let Some(count) = count {
                self.declared = Some(self.declared.map_or(count, |seen| seen.max(count)));
            }
        }
        self.leaves += PAGE_LEAF.find_iter(data).count();
    }

    fn total(&self) -> usize {
        self.declared.unwrap_or(self.leaves)
    }
}
