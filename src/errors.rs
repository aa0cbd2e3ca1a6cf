use thiserror::Error;

/// Failures reported by a [`Page`](crate::page::Page) implementation.
///
/// These are the only errors the live-DOM facade may raise; everything the
/// engine does with them is local recovery (skip the element, substitute an
/// absent field) or a clean operation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The element handle no longer refers to an attached node, e.g. it was
    /// removed between discovery and a geometry query.
    #[error("element is no longer attached to the document")]
    Detached,
    /// A transient page-level failure (geometry/style query threw, node
    /// insertion rejected).
    #[error("page operation failed: {0}")]
    Unavailable(String),
}

/// Engine-level operation failures.
///
/// Identifier resolution misses are deliberately *not* represented here:
/// not-found is an expected outcome, surfaced as an absence through the
/// command surface, never as an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document body never became available within the retry budget.
    #[error("document body not available")]
    BodyUnavailable,
    /// The overlay container could not be inserted; the render pass was
    /// aborted with no partial container left behind.
    #[error("failed to create overlay container: {0}")]
    ContainerCreation(String),
    /// A page operation failed in a position the engine cannot recover from
    /// locally.
    #[error(transparent)]
    Page(#[from] PageError),
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
