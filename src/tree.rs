//! Bounded-depth element-tree extraction and serialization.
//!
//! The walk prunes non-content tags and the engine's own overlay container,
//! registers every extracted element in the session's record table, and
//! yields to the event loop periodically so large pages do not block input
//! handling. Geometry and style failures on individual elements are logged
//! and substituted with absent fields, never aborting the walk.

use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use crate::identity;
use crate::page::Page;
use crate::types::{ExportDocument, TreeNode};

/// Default depth for exported documents.
pub const DEFAULT_EXPORT_DEPTH: usize = 5;
/// Hard ceiling for any tree walk.
pub const MAX_WALK_DEPTH: usize = 10;

/// Tags that carry no layout value and are pruned from the tree.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "meta"];
/// Extracted-node interval between yields back to the event loop.
const YIELD_EVERY: usize = 50;

/// Session-scoped identifier-to-live-element table, filled during extraction
/// so a host can highlight an exported element without re-resolving. Cleared
/// at the start of every export; never persisted.
pub struct ElementRecords<H> {
    map: HashMap<String, H>,
}

impl<H: Clone> ElementRecords<H> {
    pub fn new() -> Self {
        ElementRecords {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: String, el: H) {
        self.map.insert(id, el);
    }

    pub fn get(&self, id: &str) -> Option<&H> {
        self.map.get(id)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<H: Clone> Default for ElementRecords<H> {
    fn default() -> Self {
        ElementRecords::new()
    }
}

/// Extract one element's metadata, registering its identifier.
pub fn extract<P: Page>(
    page: &P,
    records: &mut ElementRecords<P::Handle>,
    el: &P::Handle,
) -> TreeNode {
    let unique_id = identity::stable_id(page, el);
    records.insert(unique_id.clone(), el.clone());

    let tag = page.tag_name(el);
    let style = match page.computed_style(el) {
        Ok(style) => Some(style),
        Err(err) => {
            debug!(%err, "computed style unavailable");
            None
        }
    };
    let rect = match page.bounding_rect(el) {
        Ok(rect) => Some(rect.to_page_coords(&page.viewport())),
        Err(err) => {
            debug!(%err, "bounding rect unavailable");
            None
        }
    };

    TreeNode {
        unique_id,
        tag: tag.clone(),
        id: page.dom_id(el),
        classes: page.class_list(el),
        path: identity::structural_path(page, el),
        fields: tag_fields(page, el, &tag),
        style,
        rect,
        children: Vec::new(),
    }
}

/// Per-tag field table. Every key a tag defines is always present, with an
/// explicit `null` when the attribute is absent.
fn tag_fields<P: Page>(page: &P, el: &P::Handle, tag: &str) -> Map<String, Value> {
    let attr = |name: &str| -> Value {
        page.attribute(el, name)
            .filter(|v| !v.is_empty())
            .map(Value::String)
            .unwrap_or(Value::Null)
    };
    let text = || -> Value {
        let text = page.inner_text(el);
        let text = text.trim();
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    };
    let dimension = |name: &str| -> Value {
        page.attribute(el, name)
            .and_then(|v| v.parse::<f64>().ok())
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    };

    let mut fields = Map::new();
    match tag {
        "a" => {
            fields.insert("href".to_string(), attr("href"));
            fields.insert("text".to_string(), text());
        }
        "img" => {
            fields.insert("src".to_string(), attr("src"));
            fields.insert("alt".to_string(), attr("alt"));
            fields.insert("width".to_string(), dimension("width"));
            fields.insert("height".to_string(), dimension("height"));
        }
        "button" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "span" | "div" | "li" => {
            fields.insert("text".to_string(), text());
        }
        "input" => {
            fields.insert("type".to_string(), attr("type"));
            fields.insert("placeholder".to_string(), attr("placeholder"));
            fields.insert("value".to_string(), attr("value"));
        }
        "form" => {
            fields.insert("action".to_string(), attr("action"));
            fields.insert("method".to_string(), attr("method"));
        }
        _ => {}
    }
    fields
}

/// True when the element is pruned from the tree: non-content tags and the
/// engine's own overlay container. Structural exclusions, not errors.
fn pruned<P: Page>(page: &P, el: &P::Handle, skip: Option<&P::Handle>) -> bool {
    let tag = page.tag_name(el);
    EXCLUDED_TAGS.contains(&tag.as_str()) || skip == Some(el)
}

struct Frame<H> {
    depth: usize,
    node: TreeNode,
    pending: Vec<H>,
    next: usize,
}

/// Walk the subtree rooted at `el` down to `max_depth` (clamped to
/// [`MAX_WALK_DEPTH`]). Returns `None` for pruned roots; pruned descendants
/// and anything deeper than `max_depth` are simply omitted from their
/// parent's children. Child order is document order. The walk yields to the
/// event loop at a fixed extracted-node interval.
pub async fn walk<P: Page>(
    page: &P,
    records: &mut ElementRecords<P::Handle>,
    skip: Option<&P::Handle>,
    el: &P::Handle,
    max_depth: usize,
) -> Option<TreeNode> {
    let max_depth = max_depth.min(MAX_WALK_DEPTH);
    if pruned(page, el, skip) {
        return None;
    }

    let mut visited: usize = 1;
    let mut stack = vec![Frame {
        depth: 0,
        node: extract(page, records, el),
        pending: page.children(el),
        next: 0,
    }];

    loop {
        // The borrow of the top frame ends before push/pop below.
        let (depth, child) = {
            let top = match stack.last_mut() {
                Some(top) => top,
                None => return None,
            };
            if top.next < top.pending.len() {
                let child = top.pending[top.next].clone();
                top.next += 1;
                (top.depth + 1, Some(child))
            } else {
                (top.depth, None)
            }
        };

        match child {
            Some(child) => {
                if depth > max_depth || pruned(page, &child, skip) {
                    continue;
                }
                visited += 1;
                if visited % YIELD_EVERY == 0 {
                    tokio::task::yield_now().await;
                }
                stack.push(Frame {
                    depth,
                    node: extract(page, records, &child),
                    pending: page.children(&child),
                    next: 0,
                });
            }
            None => {
                let done = match stack.pop() {
                    Some(done) => done,
                    None => return None,
                };
                match stack.last_mut() {
                    Some(parent) => parent.node.children.push(done.node),
                    None => return Some(done.node),
                }
            }
        }
    }
}

/// Produce the export document: clear the record table, walk the body, and
/// wrap the tree with page metadata and an RFC 3339 timestamp.
pub async fn export<P: Page>(
    page: &P,
    records: &mut ElementRecords<P::Handle>,
    skip: Option<&P::Handle>,
    max_depth: usize,
) -> ExportDocument {
    records.clear();
    let tree = match page.body() {
        Some(body) => walk(page, records, skip, &body, max_depth).await,
        None => None,
    };
    info!(
        registered = records.len(),
        "element tree extracted for export"
    );
    ExportDocument {
        title: page.title(),
        url: page.url(),
        timestamp: Utc::now().to_rfc3339(),
        tree,
    }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
