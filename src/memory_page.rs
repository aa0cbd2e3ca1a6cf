//! Arena-backed in-memory [`Page`] implementation.
//!
//! Backs the test suite and doubles as a host for offline page snapshots.
//! Nodes are built with the fluent [`NodeSpec`] builder; geometry is stored
//! in page coordinates and translated by the current scroll offsets, so
//! scrolling behaves like a real viewport. Individual nodes can be poisoned
//! to make their geometry/style queries fail, exercising the engine's
//! transient-error paths.

use std::collections::{HashMap, HashSet};

use crate::errors::PageError;
use crate::page::{BoxSpec, Page};
use crate::types::{BoundingBox, PageRect, StyleSnapshot, Viewport};

/// Handle into the page's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Content,
    OverlayContainer,
    HighlightBox,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attributes: HashMap<String, String>,
    text: String,
    /// Page-coordinate rectangle, when the node has layout.
    rect: Option<PageRect>,
    style: Option<StyleSnapshot>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    box_spec: Option<BoxSpec>,
    detached: bool,
}

/// Fluent builder for one element.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    tag: String,
    dom_id: Option<String>,
    classes: Vec<String>,
    attributes: HashMap<String, String>,
    text: String,
    rect: Option<PageRect>,
    style: Option<StyleSnapshot>,
}

impl NodeSpec {
    pub fn new(tag: &str) -> Self {
        NodeSpec {
            tag: tag.to_lowercase(),
            dom_id: None,
            classes: Vec::new(),
            attributes: HashMap::new(),
            text: String::new(),
            rect: None,
            style: None,
        }
    }

    pub fn dom_id(mut self, id: &str) -> Self {
        self.dom_id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Page-coordinate rectangle (x grows right, y grows down).
    pub fn rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(PageRect {
            top: y,
            left: x,
            width,
            height,
        });
        self
    }

    pub fn style(mut self, style: StyleSnapshot) -> Self {
        self.style = Some(style);
        self
    }
}

/// In-memory document.
pub struct MemoryPage {
    title: String,
    url: String,
    viewport: Viewport,
    nodes: Vec<Node>,
    body: Option<NodeId>,
    poisoned: HashSet<NodeId>,
    scrolled: Option<NodeId>,
}

impl MemoryPage {
    /// An empty document with no body yet (exercises the body-availability
    /// precondition).
    pub fn new(title: &str, url: &str) -> Self {
        MemoryPage {
            title: title.to_string(),
            url: url.to_string(),
            viewport: Viewport::default(),
            nodes: Vec::new(),
            body: None,
            poisoned: HashSet::new(),
            scrolled: None,
        }
    }

    /// A document with the body already attached, the common fixture.
    pub fn with_body(title: &str, url: &str) -> Self {
        let mut page = MemoryPage::new(title, url);
        page.attach_body();
        page
    }

    /// Attach the body element, returning its handle. No-op when a body
    /// already exists.
    pub fn attach_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let id = self.push_node(NodeSpec::new("body"), None, NodeKind::Content);
        self.body = Some(id);
        id
    }

    /// Insert an element as the last child of `parent`. The parent handle
    /// must come from this page.
    pub fn insert(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        let id = self.push_node(spec, Some(parent), NodeKind::Content);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_node(&mut self, spec: NodeSpec, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: spec.tag,
            dom_id: spec.dom_id,
            classes: spec.classes,
            attributes: spec.attributes,
            text: spec.text,
            rect: spec.rect,
            style: spec.style,
            parent,
            children: Vec::new(),
            kind,
            box_spec: None,
            detached: false,
        });
        id
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.viewport.scroll_x = x;
        self.viewport.scroll_y = y;
    }

    /// Replace an element's text content (simulates a content mutation).
    pub fn set_text(&mut self, el: NodeId, text: &str) {
        self.nodes[el.0].text = text.to_string();
    }

    /// Make geometry and style queries fail for this node.
    pub fn poison(&mut self, el: NodeId) {
        self.poisoned.insert(el);
    }

    /// The element most recently scrolled into view, if any.
    pub fn scrolled_to(&self) -> Option<NodeId> {
        self.scrolled
    }

    /// Number of attached overlay containers. The engine's exclusivity
    /// invariant says this is always 0 or 1.
    pub fn container_count(&self) -> usize {
        self.attached_of_kind(NodeKind::OverlayContainer).len()
    }

    /// Number of attached highlight boxes.
    pub fn box_count(&self) -> usize {
        self.attached_of_kind(NodeKind::HighlightBox).len()
    }

    /// Specs of the attached highlight boxes, in draw order.
    pub fn drawn_boxes(&self) -> Vec<BoxSpec> {
        self.attached_of_kind(NodeKind::HighlightBox)
            .into_iter()
            .filter_map(|id| self.nodes[id.0].box_spec.clone())
            .collect()
    }

    fn attached_of_kind(&self, kind: NodeKind) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| self.nodes[id.0].kind == kind)
            .collect()
    }

    /// Attached nodes in document (preorder) order, starting at the body.
    fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(body) = self.body {
            if !self.nodes[body.0].detached {
                self.collect_preorder(body, &mut out);
            }
        }
        out
    }

    fn collect_preorder(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        for child in &self.nodes[id.0].children {
            self.collect_preorder(*child, out);
        }
    }

    fn detach_subtree(&mut self, id: NodeId) {
        self.nodes[id.0].detached = true;
        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.detach_subtree(child);
        }
    }

    fn collect_text(&self, id: NodeId, parts: &mut Vec<String>) {
        let node = &self.nodes[id.0];
        if !node.text.is_empty() {
            parts.push(node.text.clone());
        }
        for child in &node.children {
            self.collect_text(*child, parts);
        }
    }

    fn check_live(&self, el: NodeId) -> Result<&Node, PageError> {
        let node = &self.nodes[el.0];
        if node.detached {
            return Err(PageError::Detached);
        }
        if self.poisoned.contains(&el) {
            return Err(PageError::Unavailable("query failed".to_string()));
        }
        Ok(node)
    }
}

impl Page for MemoryPage {
    type Handle = NodeId;

    fn title(&self) -> String {
        self.title.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn body(&self) -> Option<NodeId> {
        self.body.filter(|id| !self.nodes[id.0].detached)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn tag_name(&self, el: &NodeId) -> String {
        self.nodes[el.0].tag.clone()
    }

    fn dom_id(&self, el: &NodeId) -> Option<String> {
        self.nodes[el.0].dom_id.clone().filter(|id| !id.is_empty())
    }

    fn class_list(&self, el: &NodeId) -> Vec<String> {
        self.nodes[el.0].classes.clone()
    }

    fn inner_text(&self, el: &NodeId) -> String {
        let mut parts = Vec::new();
        self.collect_text(*el, &mut parts);
        parts.join(" ")
    }

    fn attribute(&self, el: &NodeId, name: &str) -> Option<String> {
        self.nodes[el.0].attributes.get(name).cloned()
    }

    fn parent(&self, el: &NodeId) -> Option<NodeId> {
        self.nodes[el.0].parent
    }

    fn children(&self, el: &NodeId) -> Vec<NodeId> {
        self.nodes[el.0].children.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|node| self.nodes[node.0].dom_id.as_deref() == Some(id))
    }

    fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|node| self.nodes[node.0].tag == tag)
            .collect()
    }

    fn elements_matching(&self, tags: &[&str]) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|node| tags.contains(&self.nodes[node.0].tag.as_str()))
            .collect()
    }

    fn bounding_rect(&self, el: &NodeId) -> Result<BoundingBox, PageError> {
        let node = self.check_live(*el)?;
        let rect = node
            .rect
            .as_ref()
            .ok_or_else(|| PageError::Unavailable("element has no layout".to_string()))?;
        Ok(BoundingBox {
            x: rect.left - self.viewport.scroll_x,
            y: rect.top - self.viewport.scroll_y,
            width: rect.width,
            height: rect.height,
        })
    }

    fn computed_style(&self, el: &NodeId) -> Result<StyleSnapshot, PageError> {
        let node = self.check_live(*el)?;
        Ok(node.style.clone().unwrap_or_default())
    }

    fn create_overlay_container(&mut self) -> Result<NodeId, PageError> {
        let Some(body) = self.body() else {
            return Err(PageError::Unavailable(
                "document body missing".to_string(),
            ));
        };
        // Catches exclusivity violations in tests: the engine must have
        // removed any prior container before asking for a new one.
        if self.container_count() > 0 {
            return Err(PageError::Unavailable(
                "overlay container already present".to_string(),
            ));
        }
        let id = self.push_node(
            NodeSpec::new("div").dom_id("domscope-overlay"),
            Some(body),
            NodeKind::OverlayContainer,
        );
        self.nodes[body.0].children.push(id);
        Ok(id)
    }

    fn append_highlight_box(
        &mut self,
        container: &NodeId,
        spec: &BoxSpec,
    ) -> Result<NodeId, PageError> {
        let node = &self.nodes[container.0];
        if node.detached || node.kind != NodeKind::OverlayContainer {
            return Err(PageError::Unavailable(
                "not an attached overlay container".to_string(),
            ));
        }
        let id = self.push_node(
            NodeSpec::new("div").class("domscope-highlight-box"),
            Some(*container),
            NodeKind::HighlightBox,
        );
        self.nodes[id.0].box_spec = Some(spec.clone());
        self.nodes[container.0].children.push(id);
        Ok(id)
    }

    fn remove_node(&mut self, node: &NodeId) {
        if self.nodes[node.0].detached {
            return;
        }
        if let Some(parent) = self.nodes[node.0].parent {
            self.nodes[parent.0].children.retain(|child| child != node);
        }
        self.detach_subtree(*node);
    }

    fn scroll_into_view(&mut self, el: &NodeId) {
        self.scrolled = Some(*el);
        if let Some(rect) = self.nodes[el.0].rect {
            let center_x = rect.left + rect.width / 2.0;
            let center_y = rect.top + rect.height / 2.0;
            self.viewport.scroll_x = (center_x - self.viewport.width / 2.0).max(0.0);
            self.viewport.scroll_y = (center_y - self.viewport.height / 2.0).max(0.0);
        }
    }
}

#[cfg(test)]
#[path = "memory_page_test.rs"]
mod memory_page_test;
