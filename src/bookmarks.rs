//! Document outline for the numbered report sections, injected with `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use thiserror::Error;

/// Failures while adding the outline to rendered bytes.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("failed to parse rendered PDF: {0}")]
    Parse(#[from] lopdf::Error),
    #[error("rendered PDF has no catalog")]
    MissingCatalog,
    #[error("rendered PDF catalog is not a dictionary")]
    InvalidCatalog,
    #[error("section `{heading}` points at missing page {page_number}")]
    MissingPage { heading: String, page_number: usize },
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

/// Adds one top-level outline entry per headed section.
///
/// `section_pages` pairs each heading with its first page (1-based). Entries
/// without a page are skipped; when nothing remains the bytes are returned
/// as they are.
pub fn apply_section_bookmarks(
    pdf_bytes: &[u8],
    section_pages: &[(String, Option<usize>)],
) -> Result<Vec<u8>, BookmarkError> {
    let mut document = Document::load_mem(pdf_bytes)?;

    let pages = document.get_pages();
    let entries = collect_entries(&mut document, section_pages, &pages)?;
    if entries.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let outlines_id = document.new_object_id();
    link_entries(outlines_id, &mut document, &entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    log::debug!("added {} outline entries", entries.len());
    Ok(buffer)
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn collect_entries(
    document: &mut Document,
    section_pages: &[(String, Option<usize>)],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, BookmarkError> {
    let mut entries = Vec::new();

    for (heading, page) in section_pages {
        let Some(page_number) = *page else {
            continue;
        };
        let page_ref = u32::try_from(page_number)
            .ok()
            .and_then(|number| pages.get(&number))
            .copied()
            .ok_or_else(|| BookmarkError::MissingPage {
                heading: heading.clone(),
                page_number,
            })?;

        entries.push(OutlineEntry {
            object_id: document.new_object_id(),
            page_ref,
            title: heading.clone(),
        });
    }

    Ok(entries)
}

fn link_entries(outlines_id: ObjectId, document: &mut Document, entries: &[OutlineEntry]) {
    for (index, entry) in entries.iter().enumerate() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(entry.title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entry.page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if index > 0 {
            dictionary.set("Prev", Object::Reference(entries[index - 1].object_id));
        }
        if index + 1 < entries.len() {
            dictionary.set("Next", Object::Reference(entries[index + 1].object_id));
        }

        document
            .objects
            .insert(entry.object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        dictionary.set("First", Object::Reference(first.object_id));
        dictionary.set("Last", Object::Reference(last.object_id));
    }
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;
    catalog.set("Outlines", Object::Reference(outlines_id));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bytes_that_are_not_pdf() {
        let err = apply_section_bookmarks(b"not a pdf", &[]).unwrap_err();
        assert!(matches!(err, BookmarkError::Parse(_)));
    }

    #[test]
    fn skips_sections_without_pages() {
        let mut document = Document::with_version("1.5");
        let pages = BTreeMap::new();
        let entries = collect_entries(
            &mut document,
            &[("1. INFORMASI KEJADIAN".to_string(), None)],
            &pages,
        )
        .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn reports_missing_page() {
        let mut document = Document::with_version("1.5");
        let pages = BTreeMap::new();
        let result = collect_entries(
            &mut document,
            &[("4. TINDAKAN".to_string(), Some(3))],
            &pages,
        );
        assert!(matches!(
            result,
            Err(BookmarkError::MissingPage { page_number: 3, .. })
        ));
    }
}
