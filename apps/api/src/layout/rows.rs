//! Row assembly: vertical-center clustering of normalized lines.
//!
//! OCR fragments arrive in scan order, not layout order; multi-column
//! resumes split one visual line into several fragments. Clustering on
//! center_y with a data-derived tolerance rebuilds the visual rows, and
//! sorting members by left rebuilds reading order within a row.

use super::geometry::{median, NormalizedLine};

/// Fallback median line height when a page has no measurable lines,
/// expressed as a fraction of page height.
const DEFAULT_LINE_HEIGHT: f64 = 0.012;
/// Lower bound on the clustering tolerance.
const MIN_TOLERANCE: f64 = 0.003;
/// Visual separator between fragments merged into one row.
const ROW_SEPARATOR: &str = " · ";

/// A reconstructed horizontal line of text, merged from one or more
/// fragments sharing a vertical band on the same page.
#[derive(Debug, Clone)]
pub struct Row {
    pub text: String,
    pub left: f64,
    pub top: f64,
    pub bottom: f64,
    pub height: f64,
    pub center_y: f64,
}

fn close_cluster(mut members: Vec<NormalizedLine>) -> Row {
    members.sort_by(|a, b| a.left.total_cmp(&b.left));
    let text = members
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(ROW_SEPARATOR);
    let top = members.iter().map(|l| l.top).fold(f64::INFINITY, f64::min);
    let bottom = members
        .iter()
        .map(|l| l.bottom)
        .fold(f64::NEG_INFINITY, f64::max);
    let left = members.iter().map(|l| l.left).fold(f64::INFINITY, f64::min);
    Row {
        text,
        left,
        top,
        bottom,
        height: bottom - top,
        center_y: (top + bottom) / 2.0,
    }
}

/// Clusters one page's lines into rows.
///
/// Tolerance adapts to the document: max(0.003, median line height / 2), so
/// dense small print and airy large print both cluster sensibly. A cluster's
/// reference center is the running mean of its members — recomputed on every
/// addition, so the tolerance band tracks the row as it grows instead of
/// freezing on the first line's center.
pub fn rows_from_lines(lines: &[NormalizedLine]) -> Vec<Row> {
    if lines.is_empty() {
        return Vec::new();
    }

    let mut lines: Vec<NormalizedLine> = lines.to_vec();
    lines.sort_by(|a, b| a.center_y.total_cmp(&b.center_y));

    let heights: Vec<f64> = lines.iter().map(|l| l.height).collect();
    let median_height = median(&heights, DEFAULT_LINE_HEIGHT);
    let y_tol = (median_height * 0.5).max(MIN_TOLERANCE);

    let mut rows: Vec<Row> = Vec::new();
    let mut cluster: Vec<NormalizedLine> = Vec::new();
    let mut cluster_center: Option<f64> = None;

    for line in lines {
        match cluster_center {
            None => {
                cluster_center = Some(line.center_y);
                cluster.push(line);
            }
            Some(center) if (line.center_y - center).abs() <= y_tol => {
                cluster.push(line);
                let sum: f64 = cluster.iter().map(|l| l.center_y).sum();
                cluster_center = Some(sum / cluster.len() as f64);
            }
            Some(_) => {
                rows.push(close_cluster(std::mem::take(&mut cluster)));
                cluster_center = Some(line.center_y);
                cluster.push(line);
            }
        }
    }
    if !cluster.is_empty() {
        rows.push(close_cluster(cluster));
    }

    rows.sort_by(|a, b| a.center_y.total_cmp(&b.center_y).then(a.left.total_cmp(&b.left)));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, center_y: f64, left: f64, height: f64) -> NormalizedLine {
        let top = center_y - height / 2.0;
        NormalizedLine {
            text: text.to_string(),
            top,
            left,
            width: 0.2,
            height,
            bottom: top + height,
            center_y,
            right: left + 0.2,
            page: 1,
            confidence: None,
        }
    }

    #[test]
    fn test_empty_input_no_rows() {
        assert!(rows_from_lines(&[]).is_empty());
    }

    #[test]
    fn test_tolerance_merges_near_splits_far() {
        // Median height 0.02 → tolerance 0.01: 0.100 and 0.102 merge,
        // 0.150 stays separate.
        let lines = vec![
            line("left", 0.100, 0.1, 0.02),
            line("right", 0.102, 0.5, 0.02),
            line("below", 0.150, 0.1, 0.02),
        ];
        let rows = rows_from_lines(&lines);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text, "left · right");
        assert_eq!(rows[1].text, "below");
    }

    #[test]
    fn test_members_ordered_left_to_right() {
        let lines = vec![
            line("rightmost", 0.2, 0.7, 0.02),
            line("leftmost", 0.201, 0.1, 0.02),
            line("middle", 0.199, 0.4, 0.02),
        ];
        let rows = rows_from_lines(&lines);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "leftmost · middle · rightmost");
    }

    #[test]
    fn test_running_mean_recentering() {
        // Each step is within tolerance of the running mean, even though the
        // last line is out of tolerance of the first. A seed-frozen center
        // would split this chain.
        let lines = vec![
            line("a", 0.100, 0.1, 0.02),
            line("b", 0.108, 0.3, 0.02),
            line("c", 0.112, 0.5, 0.02),
        ];
        let rows = rows_from_lines(&lines);
        assert_eq!(rows.len(), 1, "chain within running-mean tolerance merges");
    }

    #[test]
    fn test_row_bounds_span_members() {
        let lines = vec![line("a", 0.100, 0.1, 0.02), line("b", 0.104, 0.5, 0.04)];
        let rows = rows_from_lines(&lines);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!((row.top - 0.084).abs() < 1e-9);
        assert!((row.bottom - 0.124).abs() < 1e-9);
        assert!((row.height - 0.04).abs() < 1e-9);
        assert!((row.center_y - 0.104).abs() < 1e-9);
        assert!((row.left - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_trailing_cluster_flushed() {
        let lines = vec![line("only", 0.9, 0.1, 0.02)];
        let rows = rows_from_lines(&lines);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text, "only");
    }

    #[test]
    fn test_tolerance_floor_applies_to_tiny_print() {
        // Median height 0.002 would give tolerance 0.001; the floor keeps
        // it at 0.003 so these two still merge.
        let lines = vec![
            line("a", 0.5000, 0.1, 0.002),
            line("b", 0.5025, 0.5, 0.002),
        ];
        assert_eq!(rows_from_lines(&lines).len(), 1);
    }
}
