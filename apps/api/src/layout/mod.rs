//! Layout reconstruction engine.
//!
//! Turns the flat bag of OCR blocks for a document into an ordered,
//! string-keyed mapping of section index → row texts, rebuilding reading
//! order from geometry: lines are normalized and sorted, clustered into
//! visual rows per page, then partitioned into heading-delimited sections
//! numbered globally across pages.

pub mod geometry;
pub mod rows;
pub mod sections;

use std::collections::BTreeMap;

use anyhow::Result;

pub use geometry::RawTextFragment;

/// Reconstructs sections for a whole document.
///
/// Keys are 1-based section indices, monotonic across pages in page order;
/// keying by integer keeps map iteration in reading order past section 9,
/// where string keys would interleave ("1", "10", "11", "2", ...). Empty
/// input — or input where no valid line survives extraction — yields an
/// empty map, not an error: a blank or unreadable scan is a legitimate
/// outcome the caller must handle.
pub fn group(raw: &[RawTextFragment]) -> BTreeMap<u32, Vec<String>> {
    let lines = geometry::extract_lines(raw);
    if lines.is_empty() {
        return BTreeMap::new();
    }

    let mut pages: BTreeMap<u32, Vec<geometry::NormalizedLine>> = BTreeMap::new();
    for line in lines {
        pages.entry(line.page).or_default().push(line);
    }

    let mut merged: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut group_index: u32 = 1;
    for page_lines in pages.values() {
        let page_rows = rows::rows_from_lines(page_lines);
        for texts in sections::group_rows(&page_rows) {
            merged.insert(group_index, texts);
            group_index += 1;
        }
    }
    merged
}

/// Renders the section mapping with string keys — the shape the profile
/// normalization document uses, where keys must be numeric strings. String
/// maps iterate lexicographically, so consumers re-sort by integer value.
pub fn string_keyed(sections: &BTreeMap<u32, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    sections
        .iter()
        .map(|(index, texts)| (index.to_string(), texts.clone()))
        .collect()
}

/// `group` is CPU-bound; this wrapper keeps it off the async scheduler so
/// long documents do not stall concurrent I/O.
pub async fn group_blocking(raw: Vec<RawTextFragment>) -> Result<BTreeMap<u32, Vec<String>>> {
    let grouped = tokio::task::spawn_blocking(move || group(&raw)).await?;
    Ok(grouped)
}
