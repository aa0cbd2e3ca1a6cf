//! Overlay rendering: viewport-culled bounding boxes for the highlight-all
//! working set, the single-target emphasis box, and the cheap position
//! refresh used on scroll/resize.
//!
//! At most one overlay container exists at any time; every render starts by
//! removing the previous container, so boxes and listeners can never leak.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

use crate::color::{Color, ColorTable, TARGET_COLOR, signature};
use crate::engine::EngineConfig;
use crate::errors::EngineError;
use crate::page::{BoxSpec, Page};

/// Tags considered for the highlight-all working set, matched in document
/// order.
pub(crate) const CANDIDATE_TAGS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "a", "button", "img", "input", "form",
    "section", "article", "nav", "aside",
];

struct DrawnBox<H> {
    element: H,
    /// The box node currently drawn for this element; `None` while the
    /// element is culled out of view.
    node: Option<H>,
    color: Color,
    target: bool,
}

/// Owner of the single overlay container and the drawn working set.
pub struct Overlay<P: Page> {
    container: Option<P::Handle>,
    drawn: Vec<DrawnBox<P::Handle>>,
}

impl<P: Page> Overlay<P> {
    pub fn new() -> Self {
        Overlay {
            container: None,
            drawn: Vec::new(),
        }
    }

    /// The current overlay container, if one is mounted.
    pub fn container(&self) -> Option<&P::Handle> {
        self.container.as_ref()
    }

    /// Number of boxes currently drawn.
    pub fn box_count(&self) -> usize {
        self.drawn.iter().filter(|entry| entry.node.is_some()).count()
    }

    /// Full highlight pass: select the working set, cull, and draw
    /// signature-colored boxes. Processes elements in batches, yielding to
    /// the event loop between batches and aborting (with a cleared overlay)
    /// if highlighting was disabled mid-pass. Returns the number of boxes
    /// drawn.
    pub async fn render_all(
        &mut self,
        page: &mut P,
        colors: &mut ColorTable,
        enabled: &AtomicBool,
        config: &EngineConfig,
    ) -> Result<usize, EngineError> {
        self.clear(page);

        let candidates: Vec<P::Handle> = page
            .elements_matching(CANDIDATE_TAGS)
            .into_iter()
            .take(config.max_highlights)
            .collect();
        let viewport = page.viewport();

        let container = page
            .create_overlay_container()
            .map_err(|err| EngineError::ContainerCreation(err.to_string()))?;
        self.container = Some(container.clone());
        debug!(candidates = candidates.len(), "starting highlight pass");

        let mut drawn = 0;
        for (i, el) in candidates.iter().enumerate() {
            if i % config.batch_size == 0 {
                if i > 0 {
                    tokio::task::yield_now().await;
                }
                if !enabled.load(Ordering::Relaxed) {
                    debug!("highlighting disabled mid-pass, aborting");
                    self.clear(page);
                    return Ok(0);
                }
            }

            let rect = match page.bounding_rect(el) {
                Ok(rect) => rect,
                Err(err) => {
                    trace!(element = ?el, %err, "skipping element without geometry");
                    continue;
                }
            };
            if rect.outside_viewport(&viewport) || rect.smaller_than(config.min_box_size) {
                continue;
            }

            let color = colors.color_for(&signature(page, el));
            let spec = BoxSpec {
                rect: rect.to_page_coords(&viewport),
                color,
                target: false,
            };
            match page.append_highlight_box(&container, &spec) {
                Ok(node) => {
                    self.drawn.push(DrawnBox {
                        element: el.clone(),
                        node: Some(node),
                        color,
                        target: false,
                    });
                    drawn += 1;
                }
                Err(err) => {
                    debug!(%err, "failed to append highlight box");
                }
            }
        }

        info!(drawn, "highlight pass complete");
        Ok(drawn)
    }

    /// Draw the single-target emphasis box for an already-resolved element
    /// and scroll it into centered view. Not viewport-culled: the scroll is
    /// about to bring the element on screen.
    pub fn render_one(&mut self, page: &mut P, el: &P::Handle) -> Result<(), EngineError> {
        self.clear(page);

        let container = page
            .create_overlay_container()
            .map_err(|err| EngineError::ContainerCreation(err.to_string()))?;
        self.container = Some(container.clone());

        let viewport = page.viewport();
        let rect = match page.bounding_rect(el) {
            Ok(rect) => rect,
            Err(err) => {
                self.clear(page);
                return Err(err.into());
            }
        };
        let spec = BoxSpec {
            rect: rect.to_page_coords(&viewport),
            color: TARGET_COLOR,
            target: true,
        };
        match page.append_highlight_box(&container, &spec) {
            Ok(node) => {
                self.drawn.push(DrawnBox {
                    element: el.clone(),
                    node: Some(node),
                    color: TARGET_COLOR,
                    target: true,
                });
            }
            Err(err) => {
                self.clear(page);
                return Err(err.into());
            }
        }

        page.scroll_into_view(el);
        Ok(())
    }

    /// Recompute geometry for the currently drawn working set. Never
    /// recolors and never re-selects; elements culled by the new viewport
    /// keep their slot and get their box back once visible again, detached
    /// elements are dropped.
    pub fn refresh_positions(&mut self, page: &mut P, config: &EngineConfig) {
        let Some(container) = self.container.clone() else {
            return;
        };
        let viewport = page.viewport();

        for mut entry in std::mem::take(&mut self.drawn) {
            if let Some(node) = entry.node.take() {
                page.remove_node(&node);
            }
            let rect = match page.bounding_rect(&entry.element) {
                Ok(rect) => rect,
                Err(err) => {
                    trace!(%err, "dropping box for element without geometry");
                    continue;
                }
            };
            if !entry.target
                && (rect.outside_viewport(&viewport) || rect.smaller_than(config.min_box_size))
            {
                self.drawn.push(entry);
                continue;
            }
            let spec = BoxSpec {
                rect: rect.to_page_coords(&viewport),
                color: entry.color,
                target: entry.target,
            };
            match page.append_highlight_box(&container, &spec) {
                Ok(node) => {
                    entry.node = Some(node);
                    self.drawn.push(entry);
                }
                Err(err) => {
                    debug!(%err, "failed to reposition highlight box");
                    self.drawn.push(entry);
                }
            }
        }
    }

    /// Remove the container and every box. Idempotent: clearing with no
    /// container mounted is a no-op.
    pub fn clear(&mut self, page: &mut P) {
        if let Some(container) = self.container.take() {
            page.remove_node(&container);
        }
        self.drawn.clear();
    }
}

impl<P: Page> Default for Overlay<P> {
    fn default() -> Self {
        Overlay::new()
    }
}

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;
