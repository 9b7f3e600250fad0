//! Section grouping: partitions a page's rows into heading-delimited groups.

use super::rows::Row;

/// Section titles that count as headings even without the all-caps signal.
const HEADING_KEYWORDS: [&str; 10] = [
    "education",
    "skills",
    "projects",
    "experience",
    "work experience",
    "certifications",
    "summary",
    "objective",
    "profile",
    "contact",
];

/// Heading heuristic: mostly-uppercase short text, or an exact section
/// keyword. Rows without any alphabetic content are never headings.
pub fn is_heading(text: &str) -> bool {
    let txt = text.trim();
    if txt.is_empty() {
        return false;
    }

    let letters: Vec<char> = txt.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }

    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    let char_len = txt.chars().count();
    if upper as f64 / letters.len() as f64 >= 0.7 && (3..=64).contains(&char_len) {
        return true;
    }

    HEADING_KEYWORDS.contains(&txt.to_lowercase().as_str())
}

/// Groups one page's rows, in order, into sections. The first row always
/// opens a group — even when it is not a heading — so no row is ever
/// dropped for lack of one. Each later heading opens a new group; other
/// rows append to the open group.
pub fn group_rows(rows: &[Row]) -> Vec<Vec<String>> {
    let mut groups: Vec<Vec<String>> = Vec::new();
    for row in rows {
        if is_heading(&row.text) || groups.is_empty() {
            groups.push(vec![row.text.clone()]);
        } else {
            groups
                .last_mut()
                .expect("non-empty after first row")
                .push(row.text.clone());
        }
    }
    groups
}
