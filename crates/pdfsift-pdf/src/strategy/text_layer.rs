//! Rank 1: parse the document structure and walk each page's content stream.

use lopdf::{Document, Object, ObjectId};
use lopdf::content::Content;
use pdfsift_core::{DocumentBuffer, ExtractConfig, ExtractionCandidate, StrategyId};

use crate::StrategyError;
use crate::normalize::normalize_text;
use crate::text_ops::TextCollector;

pub fn extract(
    buffer: &DocumentBuffer,
    config: &ExtractConfig,
) -> Result<ExtractionCandidate, StrategyError> {
    let doc =
        Document::load_mem(buffer.as_bytes()).map_err(|e| StrategyError::Parse(e.to_string()))?;

    let pages = doc.get_pages();
    let page_count = pages.len();
    if page_count == 0 {
        return Err(StrategyError::NoPages);
    }

    let walked: Vec<_> = pages.into_iter().take(config.page_cap).collect();
    let extracted_page_count = walked.len();

    let mut page_texts = Vec::with_capacity(extracted_page_count);
    let mut failed = 0usize;
    for (page_number, page_id) in walked {
        match page_text(&doc, page_id, config.tj_word_gap) {
            Ok(text) => {
                tracing::trace!(page = page_number, chars = text.len(), "page extracted");
                page_texts.push(text);
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(page = page_number, error = %e, "skipping page");
            }
        }
    }

    if failed == extracted_page_count {
        return Err(StrategyError::AllPagesFailed(failed));
    }

    let text = normalize_text(&page_texts.join("\n\n"));
    if text.is_empty() {
        return Err(StrategyError::NoText);
    }

    Ok(ExtractionCandidate {
        text,
        page_count,
        strategy: StrategyId::TextLayer,
        extracted_page_count,
    })
}

/// A page whose `/Contents` points at something other than a readable
/// stream fails; a page with no `/Contents` is blank.
fn page_text(doc: &Document, page_id: ObjectId, word_gap: f64) -> lopdf::Result<String> {
    let page = doc.get_dictionary(page_id)?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(String::new());
    };

    let mut data = Vec::new();
    for id in content_ids(doc, contents)? {
        let stream = doc.get_object(id)?.as_stream()?;
        if stream.dict.has(b"Filter") {
            data.extend_from_slice(&stream.decompressed_content()?);
        } else {
            data.extend_from_slice(&stream.content);
        }
        data.push(b'\n');
    }

    let content = Content::decode(&data)?;
    let mut collector = TextCollector::new(word_gap);
    collector.push_operations(&content.operations);
    Ok(collector.finish())
}

/// `/Contents` is a stream reference or an array of them, possibly itself
/// behind a reference.
fn content_ids(doc: &Document, contents: &Object) -> lopdf::Result<Vec<ObjectId>> {
    let items = match contents.as_reference() {
        Ok(id) => match doc.get_object(id)?.as_array() {
            Ok(items) => items,
            Err(_) => return Ok(vec![id]),
        },
        Err(_) => contents.as_array()?,
    };
    items.iter().map(Object::as_reference).collect()
}
