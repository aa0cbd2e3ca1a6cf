//! # domscope
#![allow(clippy::uninlined_format_args)]
//!
//! Element-identity and overlay-rendering engine for inspecting live web
//! pages.
//!
//! domscope is the page-resident core of a web-page inspection tool: it
//! derives reproducible identifiers for DOM elements, resolves them back to
//! live elements after a reload, draws viewport-aware bounding-box overlays
//! without degrading page responsiveness, and serializes the element tree to
//! a portable JSON document.
//!
//! ## What it does
//!
//! - **Stable identifiers**: `p_class_x_text_Hello_World_path_1a2b3c`-style
//!   strings derived purely from an element's tag, id, classes, leading text,
//!   tag-specific attributes and a hash of its structural path. No random
//!   tokens: the same element on an unchanged page produces the same
//!   identifier across reloads.
//! - **Tiered resolution**: an identifier resolves back to a live element
//!   through progressively relaxed tiers: native id lookup, structural-path
//!   hash comparison, then class/leading-text matching. A miss is reported
//!   as not-found, never guessed.
//! - **Highlight overlays**: one container node, signature-colored boxes
//!   for every visible candidate element (viewport-culled, size-filtered,
//!   drawn in bounded batches that yield to the event loop), plus a
//!   single-target emphasis mode that scrolls the element into view.
//! - **Mutation reaction**: structural mutations and in-page navigations
//!   trigger debounced re-renders while highlighting is active; scroll and
//!   resize trigger a cheaper position-only refresh.
//! - **Tree export**: a bounded-depth walk of the element tree with
//!   per-tag metadata, computed-style snapshots and page-relative geometry.
//!
//! The live DOM sits behind the [`Page`] trait; mutation observation,
//! message transport, script injection and file download are host concerns.
//! The crate ships [`MemoryPage`], an in-memory implementation that backs
//! the test suite and works as an offline snapshot host.
//!
//! ## Usage
//!
//! ```
//! use domscope::{Command, Engine, MemoryPage, NodeSpec, Response};
//!
//! # async fn demo() {
//! // Build a page (a real host would bind the live DOM instead).
//! let mut page = MemoryPage::with_body("Example", "https://example.com/");
//! let body = page.attach_body();
//! page.insert(
//!     body,
//!     NodeSpec::new("div")
//!         .dom_id("hero")
//!         .class("banner")
//!         .rect(0.0, 0.0, 400.0, 120.0),
//! );
//!
//! let mut engine = Engine::new(page);
//!
//! // Highlight every visible candidate element.
//! let response = engine
//!     .handle(Command::SetHighlighting { force: Some(true) })
//!     .await;
//! assert_eq!(response, Response::Highlighting { enabled: true });
//!
//! // Export the element tree.
//! match engine.handle(Command::ExportTree).await {
//!     Response::Export { document } => {
//!         println!("{}", serde_json::to_string_pretty(&document).unwrap());
//!     }
//!     other => panic!("unexpected response: {:?}", other),
//! }
//! # }
//! ```
//!
//! For event-driven hosts, [`Engine::run`] wires the command channel, the
//! [`PageEvent`] stream and the internal debounce ticks into one select
//! loop; hosts with their own loop can instead call [`Engine::handle`],
//! [`Engine::on_event`] and [`Engine::on_tick`] directly.

/// Signature-based color assignment for highlight boxes
pub mod color;

/// Engine instance, command surface and host loop
pub mod engine;

/// Error taxonomy
pub mod errors;

/// Structural paths, the stable-identifier codec and tiered resolution
pub mod identity;

/// In-memory page implementation for tests and snapshots
pub mod memory_page;

/// Overlay rendering: culled boxes, single-target mode, position refresh
pub mod overlay;

/// The live-DOM facade the engine drives
pub mod page;

/// Page-event to debounced-work mapping
pub mod reactor;

/// Keyed debounce scheduler
pub mod scheduler;

/// Bounded-depth tree extraction and serialization
pub mod tree;

/// Shared geometry and serialization types
pub mod types;

pub use color::{Color, ColorTable};
pub use engine::{Command, Engine, EngineConfig, Response};
pub use errors::{EngineError, PageError};
pub use memory_page::{MemoryPage, NodeId, NodeSpec};
pub use page::{BoxSpec, Page, PageEvent};
pub use scheduler::{Scheduler, Tick};
pub use tree::ElementRecords;
pub use types::{
    BoundingBox, ExportDocument, PageRect, StyleSnapshot, TreeNode, Viewport,
};
