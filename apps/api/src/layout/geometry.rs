//! Geometry extraction: raw OCR blocks → normalized line records.
//!
//! Textract emits blocks in scan order with bounding geometry expressed as
//! page fractions. Only LINE blocks with text survive; everything else
//! (WORD, PAGE, TABLE, CELL) is noise at this level.

use serde::{Deserialize, Serialize};

/// Floor for derived box dimensions so a degenerate polygon never yields a
/// zero-area box.
const MIN_DIMENSION: f64 = 1e-9;

/// One OCR-detected text span, as delivered by the OCR collaborator.
/// Field names follow the Textract block shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTextFragment {
    #[serde(rename = "BlockType")]
    pub block_type: String,
    #[serde(rename = "Text")]
    pub text: Option<String>,
    #[serde(rename = "Geometry")]
    pub geometry: Option<Geometry>,
    #[serde(rename = "Page")]
    pub page: Option<u32>,
    #[serde(rename = "Confidence")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    #[serde(rename = "BoundingBox")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(rename = "Polygon")]
    pub polygon: Option<Vec<PolygonPoint>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundingBox {
    #[serde(rename = "Top")]
    pub top: Option<f64>,
    #[serde(rename = "Left")]
    pub left: Option<f64>,
    #[serde(rename = "Width")]
    pub width: Option<f64>,
    #[serde(rename = "Height")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonPoint {
    #[serde(rename = "X")]
    pub x: Option<f64>,
    #[serde(rename = "Y")]
    pub y: Option<f64>,
}

/// A fragment reduced to the geometry the engine needs. Derived once,
/// never mutated.
#[derive(Debug, Clone)]
pub struct NormalizedLine {
    pub text: String,
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub bottom: f64,
    pub center_y: f64,
    pub right: f64,
    pub page: u32,
    pub confidence: Option<f64>,
}

struct ResolvedBox {
    top: f64,
    left: f64,
    width: f64,
    height: f64,
}

/// Resolves a fragment's bounding box: the explicit box when complete,
/// otherwise the axis-aligned rectangle of its 4-point polygon. Fragments
/// with neither representation yield `None` — expected OCR noise, dropped
/// silently upstream.
fn resolve_bbox(geometry: Option<&Geometry>) -> Option<ResolvedBox> {
    let geometry = geometry?;

    if let Some(bbox) = geometry.bounding_box.as_ref() {
        if let (Some(top), Some(left), Some(width), Some(height)) =
            (bbox.top, bbox.left, bbox.width, bbox.height)
        {
            return Some(ResolvedBox {
                top,
                left,
                width,
                height,
            });
        }
    }

    let polygon = geometry.polygon.as_ref()?;
    if polygon.len() != 4 {
        return None;
    }
    let mut xs = Vec::with_capacity(4);
    let mut ys = Vec::with_capacity(4);
    for point in polygon {
        xs.push(point.x?);
        ys.push(point.y?);
    }
    let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Some(ResolvedBox {
        top: min_y,
        left: min_x,
        width: (max_x - min_x).max(MIN_DIMENSION),
        height: (max_y - min_y).max(MIN_DIMENSION),
    })
}

/// Filters raw blocks down to LINE records with text and resolvable
/// geometry, computes derived fields, and sorts by (page, center_y, left).
/// That ordering is the foundation for row and section logic downstream.
pub fn extract_lines(raw: &[RawTextFragment]) -> Vec<NormalizedLine> {
    let mut lines: Vec<NormalizedLine> = raw
        .iter()
        .filter(|item| item.block_type == "LINE")
        .filter_map(|item| {
            let text = item.text.as_deref()?.trim();
            if text.is_empty() {
                return None;
            }
            let bbox = resolve_bbox(item.geometry.as_ref())?;
            Some(NormalizedLine {
                text: text.to_string(),
                top: bbox.top,
                left: bbox.left,
                width: bbox.width,
                height: bbox.height,
                bottom: bbox.top + bbox.height,
                center_y: bbox.top + bbox.height / 2.0,
                right: bbox.left + bbox.width,
                page: item.page.unwrap_or(1),
                confidence: item.confidence,
            })
        })
        .collect();

    lines.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.center_y.total_cmp(&b.center_y))
            .then(a.left.total_cmp(&b.left))
    });
    lines
}

/// Median of `values`, or `default` when empty. Median rather than mean so
/// oversized headers and underlines do not skew the estimate.
pub fn median(values: &[f64], default: f64) -> f64 {
    let mut vals: Vec<f64> = values.iter().cloned().filter(|v| v.is_finite()).collect();
    if vals.is_empty() {
        return default;
    }
    vals.sort_by(f64::total_cmp);
    let mid = vals.len() / 2;
    if vals.len() % 2 == 1 {
        vals[mid]
    } else {
        (vals[mid - 1] + vals[mid]) / 2.0
    }
}
