// src/pdf_text.rs

use crate::error::{Error, Result};
use lopdf::Document;
use std::path::Path;
use tracing::{info, warn};

/// Minimum number of non-whitespace characters we expect from a
/// "real" text PDF. Below this threshold it is probably scanned.
const MIN_TEXT_CHARS: usize = 30;

/// Text of every page, in page order. Pages without text come back as `""`.
pub fn extract_pages(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    // --- Phase 1: structural check with lopdf ---
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| Error::Extraction(format!("Failed to parse PDF: {e}")))?;

    if looks_like_scanned(&doc) {
        warn!("PDF structural check: likely scanned / image-only, expect no items");
    }

    // --- Phase 2: per-page text extraction ---
    let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
        .map_err(|e| Error::Extraction(e.to_string()))?;

    let meaningful = pages
        .iter()
        .flat_map(|p| p.chars())
        .filter(|c| !c.is_whitespace())
        .count();
    if meaningful < MIN_TEXT_CHARS {
        warn!(chars = meaningful, "Extracted text too short, may be scanned");
    } else {
        info!(pages = pages.len(), chars = meaningful, "Text extracted");
    }

    Ok(pages)
}

/// Pages joined into one text blob.
pub fn document_text(pages: &[String]) -> String {
    pages.join("\n")
}

pub fn extract_text_from_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(document_text(&extract_pages(&bytes)?))
}

/// Heuristic: inspect the PDF object tree for signs that every page
/// is just a single image with no text operators.
///
/// We look at each page's `Resources` dictionary. If a page has
/// XObject images but **no** Font resources, it's almost certainly
/// a scanned page.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // Can't tell — let text extraction try
    }

    let mut image_only_pages = 0;

    for object_id in pages.values() {
        let Ok(page_obj) = doc.get_object(*object_id) else {
            continue;
        };
        let Ok(page_dict) = page_obj.as_dict() else {
            continue;
        };

        let resource_entry = |name: &[u8]| {
            page_dict
                .get(b"Resources")
                .ok()
                .and_then(|r| doc.dereference(r).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .and_then(|res| res.get(name).ok())
                .and_then(|f| doc.dereference(f).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok())
                .is_some_and(|entries| !entries.is_empty())
        };

        if resource_entry(b"XObject") && !resource_entry(b"Font") {
            image_only_pages += 1;
        }
    }

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    // If ≥80% of pages are image-only, treat the whole PDF as scanned
    ratio >= 0.8
}
