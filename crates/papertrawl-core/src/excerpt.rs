use std::path::Path;

use crate::error::{Result, TrawlError};

// Relevance sampling only needs the opening pages
const MAX_PAGES: usize = 5;
const MAX_CHARS: usize = 5000;

/// Pulls a bounded excerpt out of a downloaded PDF for relevance checking.
/// Unreadable files (corrupt, encrypted, not a PDF at all) come back as an
/// empty string; callers treat that as "extraction failed".
pub fn excerpt_from_path(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => excerpt_from_bytes(&bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read PDF");
            String::new()
        }
    }
}

/// See [`excerpt_from_path`].
pub fn excerpt_from_bytes(bytes: &[u8]) -> String {
    match try_excerpt(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "PDF text extraction failed");
            String::new()
        }
    }
}

fn try_excerpt(bytes: &[u8]) -> Result<String> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| TrawlError::PdfExtraction(e.to_string()))?;

    let mut pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    pages.sort();

    let mut text = String::new();
    for page_num in pages.iter().take(MAX_PAGES) {
        // A page that fails to decode contributes nothing, not an error
        let page_text = doc.extract_text(&[*page_num]).unwrap_or_default();
        text.push_str(&page_text);
        text.push('\n');
    }

    Ok(truncate_chars(text, MAX_CHARS))
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max) {
        text.truncate(idx);
    }
    text
}

/// Minimal real PDF for tests that need extractable text.
#[cfg(test)]
pub(crate) fn sample_pdf(page_texts: &[&str]) -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for text in page_texts {
        let content = format!(
            "BT /F1 12 Tf 100 700 Td ({}) Tj ET",
            text.replace('\\', "\\\\")
                .replace('(', "\\(")
                .replace(')', "\\)")
        );
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_texts.len() as i64),
    });
    for page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
            dict.set("Parent", pages_id);
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
