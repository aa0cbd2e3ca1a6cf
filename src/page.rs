use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::errors::PageError;
use crate::types::{BoundingBox, PageRect, StyleSnapshot, Viewport};

/// Facade over the live document the engine drives.
///
/// The engine never touches a DOM API directly. Reads, native lookups,
/// geometry and style queries, and overlay node management all go
/// through this trait. The concrete binding (a content-script bridge, a
/// remote-debugging connection, or the in-memory [`MemoryPage`]) is the
/// host's concern.
///
/// Geometry queries are fallible: on a live page an element can be removed
/// between discovery and measurement. Callers treat such failures as
/// transient, skipping the element or substituting an absent field.
///
/// [`MemoryPage`]: crate::memory_page::MemoryPage
pub trait Page {
    /// Opaque reference to a live element. Equality means "same node".
    type Handle: Clone + PartialEq + Eq + Hash + Debug;

    fn title(&self) -> String;
    fn url(&self) -> String;

    /// The document body, once available.
    fn body(&self) -> Option<Self::Handle>;

    /// Current viewport size and scroll offsets.
    fn viewport(&self) -> Viewport;

    /// Lowercase tag name.
    fn tag_name(&self, el: &Self::Handle) -> String;

    /// Literal `id` attribute; `None` when absent or empty.
    fn dom_id(&self, el: &Self::Handle) -> Option<String>;

    /// Class list in document order.
    fn class_list(&self, el: &Self::Handle) -> Vec<String>;

    /// Concatenated visible text of the element and its descendants.
    fn inner_text(&self, el: &Self::Handle) -> String;

    /// Attribute value; `None` when absent.
    fn attribute(&self, el: &Self::Handle, name: &str) -> Option<String>;

    fn parent(&self, el: &Self::Handle) -> Option<Self::Handle>;

    /// Child elements in document order.
    fn children(&self, el: &Self::Handle) -> Vec<Self::Handle>;

    /// Native by-id lookup (O(1) on a real page).
    fn element_by_id(&self, id: &str) -> Option<Self::Handle>;

    /// All elements with the given tag, in document order.
    fn elements_by_tag(&self, tag: &str) -> Vec<Self::Handle>;

    /// All elements matching any of the given tags, in document order.
    fn elements_matching(&self, tags: &[&str]) -> Vec<Self::Handle>;

    /// Viewport-relative bounding rectangle.
    fn bounding_rect(&self, el: &Self::Handle) -> Result<BoundingBox, PageError>;

    /// Computed-style snapshot.
    fn computed_style(&self, el: &Self::Handle) -> Result<StyleSnapshot, PageError>;

    /// Insert the overlay container. The engine guarantees any previous
    /// container was removed first; implementations only insert.
    fn create_overlay_container(&mut self) -> Result<Self::Handle, PageError>;

    /// Append one highlight box to the container. Boxes must never
    /// intercept pointer events.
    fn append_highlight_box(
        &mut self,
        container: &Self::Handle,
        spec: &BoxSpec,
    ) -> Result<Self::Handle, PageError>;

    /// Remove a node (and its subtree) from the document. Removing an
    /// already-detached node is a no-op.
    fn remove_node(&mut self, node: &Self::Handle);

    /// Scroll the element into centered view.
    fn scroll_into_view(&mut self, el: &Self::Handle);
}

/// Page notifications the host forwards to the engine.
///
/// How these are observed (MutationObserver, history hooks, scroll
/// listeners) is a collaborator concern; the engine only consumes the
/// stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageEvent {
    /// Structural mutation under the body (child list / subtree).
    Mutated,
    /// In-page navigation (e.g. a route change).
    Navigated,
    Scrolled,
    Resized,
}

/// Everything a host needs to materialize one highlight box: geometry in
/// page coordinates, the border color, and whether this is the single-target
/// emphasis box rather than a signature-colored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    pub rect: PageRect,
    pub color: Color,
    pub target: bool,
}
