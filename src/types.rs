use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current viewport geometry: visible size plus document scroll offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Visible width in pixels
    pub width: f64,
    /// Visible height in pixels
    pub height: f64,
    /// Horizontal document scroll offset
    pub scroll_x: f64,
    /// Vertical document scroll offset
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(1280.0, 720.0)
    }
}

/// Viewport-relative bounding rectangle of an element, as reported by the
/// page's geometry query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// True when the box lies entirely outside the viewport on any side.
    pub fn outside_viewport(&self, viewport: &Viewport) -> bool {
        self.bottom() < 0.0
            || self.right() < 0.0
            || self.y > viewport.height
            || self.x > viewport.width
    }

    /// True when either dimension is below the minimum visible size.
    pub fn smaller_than(&self, min_size: f64) -> bool {
        self.width < min_size || self.height < min_size
    }

    /// Translate into page coordinates by adding the scroll offsets.
    pub fn to_page_coords(&self, viewport: &Viewport) -> PageRect {
        PageRect {
            top: self.y + viewport.scroll_y,
            left: self.x + viewport.scroll_x,
            width: self.width,
            height: self.height,
        }
    }
}

/// Page-coordinate rectangle (scroll offsets already applied). This is the
/// geometry drawn overlay boxes carry and the rectangle exported per node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

/// Computed-style snapshot of the properties relevant to layout inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSnapshot {
    pub display: String,
    pub position: String,
    pub width: String,
    pub height: String,
    pub color: String,
    pub background_color: String,
}

impl Default for StyleSnapshot {
    fn default() -> Self {
        StyleSnapshot {
            display: "block".to_string(),
            position: "static".to_string(),
            width: "auto".to_string(),
            height: "auto".to_string(),
            color: "rgb(0, 0, 0)".to_string(),
            background_color: "rgba(0, 0, 0, 0)".to_string(),
        }
    }
}

/// One node of the serialized element tree.
///
/// Tag-specific attributes (href/src/alt/type/placeholder/value/action/
/// method/text and image dimensions) are flattened into the node with
/// explicit `null` for absent values, so consumers can rely on key presence
/// for a given tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Stable identifier of the element (see [`crate::identity`])
    pub unique_id: String,
    /// Lowercase tag name
    pub tag: String,
    /// Literal `id` attribute, if any
    pub id: Option<String>,
    /// Class list in document order
    pub classes: Vec<String>,
    /// Structural path from the root (or nearest id-anchored ancestor)
    pub path: String,
    /// Tag-specific fields per the per-tag table in [`crate::tree`]
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Computed-style snapshot; absent when the style query failed
    pub style: Option<StyleSnapshot>,
    /// Page-relative bounding rectangle; absent when the geometry query
    /// failed
    pub rect: Option<PageRect>,
    /// Child nodes in document order
    pub children: Vec<TreeNode>,
}

/// The exported artifact: page metadata plus the bounded-depth element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Document title
    pub title: String,
    /// Page URL
    pub url: String,
    /// Export time, RFC 3339
    pub timestamp: String,
    /// Element tree rooted at the document body; `None` when the body was
    /// excluded or missing
    pub tree: Option<TreeNode>,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
