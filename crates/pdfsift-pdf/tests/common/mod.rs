//! In-memory PDF fixtures shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdfsift_core::{DocumentBuffer, PipelineConfig, ValidatorConfigBuilder};

/// A well-formed PDF with one page per entry; `\n` in an entry starts a new
/// line on that page.
pub fn text_pdf(pages: &[&str]) -> DocumentBuffer {
    let pages: Vec<_> = pages.iter().copied().map(Some).collect();
    build_pdf(&pages, false)
}

/// Same as [`text_pdf`] but with Flate-compressed content streams.
pub fn compressed_text_pdf(pages: &[&str]) -> DocumentBuffer {
    let pages: Vec<_> = pages.iter().copied().map(Some).collect();
    build_pdf(&pages, true)
}

/// Like [`text_pdf`], except that a `None` page has a `/Contents` entry
/// pointing at an integer instead of a content stream.
pub fn pdf_with_unreadable_pages(pages: &[Option<&str>]) -> DocumentBuffer {
    build_pdf(pages, false)
}

fn build_pdf(pages: &[Option<&str>], compress: bool) -> DocumentBuffer {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for page in pages {
        let content_id = match page {
            Some(text) => {
                let content = page_content(text).encode().unwrap();
                let stream = if compress {
                    Stream::new(dictionary! { "Filter" => "FlateDecode" }, zlib(&content))
                } else {
                    Stream::new(dictionary! {}, content)
                };
                doc.add_object(stream)
            }
            None => doc.add_object(Object::Integer(0)),
        };
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    DocumentBuffer::from(bytes)
}

fn page_content(text: &str) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
    ];
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A file with a compressed content stream and a page object but no
/// cross-reference table, trailer or catalog.
pub fn damaged_pdf(text: &str) -> DocumentBuffer {
    let body = zlib(format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET").as_bytes());
    let mut data = b"%PDF-1.5\n1 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 3 0 R >>\nendobj\n"
        .to_vec();
    data.extend_from_slice(
        format!("3 0 obj\n<< /Filter /FlateDecode /Length {} >>\nstream\n", body.len()).as_bytes(),
    );
    data.extend_from_slice(&body);
    data.extend_from_slice(b"\nendstream\nendobj\n%%EOF\n");
    DocumentBuffer::from(data)
}

/// Thresholds low enough for the three- and four-word documents in the
/// scenario tests.
pub fn relaxed_config() -> PipelineConfig {
    let validator = ValidatorConfigBuilder::new()
        .min_chars(10)
        .min_words(3)
        .build()
        .unwrap();
    PipelineConfig::default().with_validator(validator)
}
