//! The engine instance: session state, command dispatch, and the optional
//! host loop.
//!
//! One `Engine` is constructed per page context and owns every piece of
//! cross-call state: the enabled flag, the signature-to-color table, the
//! element-record table and the overlay. Commands arrive through
//! [`Engine::handle`]; page events through [`Engine::on_event`]; debounced
//! work fires through [`Engine::on_tick`]. [`Engine::run`] wires all three
//! channels into a select loop for hosts that want a ready-made event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::color::ColorTable;
use crate::errors::EngineError;
use crate::identity;
use crate::overlay::Overlay;
use crate::page::{Page, PageEvent};
use crate::reactor::Reactor;
use crate::scheduler::{Scheduler, Tick};
use crate::tree::{self, DEFAULT_EXPORT_DEPTH, ElementRecords};
use crate::types::ExportDocument;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Cap on the highlight-all working set.
    pub max_highlights: usize,
    /// Boxes below this size in either dimension are treated as visual
    /// noise and skipped.
    pub min_box_size: f64,
    /// Elements processed between yields back to the event loop.
    pub batch_size: usize,
    /// Tree depth for exported documents (clamped to
    /// [`tree::MAX_WALK_DEPTH`]).
    pub export_depth: usize,
    /// Debounce for scroll/resize position refresh.
    pub refresh_debounce: Duration,
    /// Debounce for mutation-triggered full re-renders.
    pub mutation_debounce: Duration,
    /// Fixed settle delay after in-page navigation.
    pub navigation_settle: Duration,
    /// Interval between body-availability retries.
    pub body_retry_interval: Duration,
    /// Number of body-availability attempts before giving up.
    pub body_retry_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_highlights: 100,
            min_box_size: 10.0,
            batch_size: 25,
            export_depth: DEFAULT_EXPORT_DEPTH,
            refresh_debounce: Duration::from_millis(100),
            mutation_debounce: Duration::from_millis(500),
            navigation_settle: Duration::from_millis(100),
            body_retry_interval: Duration::from_millis(100),
            body_retry_limit: 20,
        }
    }
}

/// Requests the host transport delivers to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Toggle highlight-all, or force it to a specific state.
    SetHighlighting {
        #[serde(default)]
        force: Option<bool>,
    },
    /// Report the current enabled flag.
    GetState,
    /// Resolve a stable identifier and draw the single-target highlight.
    HighlightElement { id: String },
    /// Serialize the element tree.
    ExportTree,
}

/// Replies to [`Command`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Highlighting { enabled: bool },
    State { enabled: bool },
    Highlighted { found: bool },
    Export { document: ExportDocument },
    Failed { message: String },
}

/// The page-resident engine. See the module docs.
pub struct Engine<P: Page> {
    page: P,
    config: EngineConfig,
    enabled: Arc<AtomicBool>,
    colors: ColorTable,
    records: ElementRecords<P::Handle>,
    overlay: Overlay<P>,
    reactor: Reactor,
    ticks: Option<mpsc::UnboundedReceiver<Tick>>,
}

impl<P: Page> Engine<P> {
    pub fn new(page: P) -> Self {
        Engine::with_config(page, EngineConfig::default())
    }

    pub fn with_config(page: P, config: EngineConfig) -> Self {
        let (scheduler, ticks) = Scheduler::new();
        let reactor = Reactor::new(
            scheduler,
            config.refresh_debounce,
            config.mutation_debounce,
            config.navigation_settle,
        );
        Engine {
            page,
            config,
            enabled: Arc::new(AtomicBool::new(false)),
            colors: ColorTable::new(),
            records: ElementRecords::new(),
            overlay: Overlay::new(),
            reactor,
            ticks: Some(ticks),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.container().is_some()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    /// Take the debounce-tick receiver, for hosts wiring their own event
    /// loop instead of [`Engine::run`]. Each tick received should be passed
    /// to [`Engine::on_tick`].
    pub fn take_ticks(&mut self) -> Option<mpsc::UnboundedReceiver<Tick>> {
        self.ticks.take()
    }

    /// Dispatch one command and produce its response. Never panics;
    /// unexpected failures surface as [`Response::Failed`].
    pub async fn handle(&mut self, command: Command) -> Response {
        debug!(?command, "handling command");
        match command {
            Command::SetHighlighting { force } => {
                let target = force.unwrap_or(!self.is_enabled());
                match self.set_highlighting(target).await {
                    Ok(enabled) => Response::Highlighting { enabled },
                    Err(err) => {
                        warn!(%err, "failed to toggle highlighting");
                        Response::Failed {
                            message: err.to_string(),
                        }
                    }
                }
            }
            Command::GetState => Response::State {
                enabled: self.is_enabled(),
            },
            Command::HighlightElement { id } => match self.highlight_element(&id).await {
                Ok(found) => Response::Highlighted { found },
                Err(err) => {
                    warn!(%err, "failed to highlight element");
                    Response::Failed {
                        message: err.to_string(),
                    }
                }
            },
            Command::ExportTree => match self.export_tree().await {
                Ok(document) => Response::Export { document },
                Err(err) => {
                    warn!(%err, "failed to export tree");
                    Response::Failed {
                        message: err.to_string(),
                    }
                }
            },
        }
    }

    /// Feed one page event into the mutation reactor.
    pub fn on_event(&mut self, event: PageEvent) {
        let highlighting = self.is_enabled();
        let has_overlay = self.overlay.container().is_some();
        self.reactor.observe(&event, highlighting, has_overlay);
    }

    /// Execute one debounced work item.
    pub async fn on_tick(&mut self, tick: Tick) {
        match tick {
            Tick::RefreshPositions => {
                self.overlay.refresh_positions(&mut self.page, &self.config);
            }
            Tick::RebuildHighlights | Tick::NavigationSettled => {
                if !self.is_enabled() {
                    return;
                }
                // A navigation restarts the highlight session, so it also
                // restarts the color assignment.
                let reset_colors = tick == Tick::NavigationSettled;
                if let Err(err) = self.render_pass(reset_colors).await {
                    warn!(%err, "debounced re-render failed");
                }
            }
        }
    }

    /// Select-loop over commands, page events and debounce ticks. Returns
    /// the engine when the command channel closes.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<(Command, oneshot::Sender<Response>)>,
        mut events: mpsc::UnboundedReceiver<PageEvent>,
    ) -> Self {
        let Some(mut ticks) = self.ticks.take() else {
            warn!("tick receiver already taken, refusing to run");
            return self;
        };
        let mut events_open = true;
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some((command, reply)) => {
                        let response = self.handle(command).await;
                        let _ = reply.send(response);
                    }
                    None => break,
                },
                event = events.recv(), if events_open => match event {
                    Some(event) => self.on_event(event),
                    None => events_open = false,
                },
                Some(tick) = ticks.recv() => self.on_tick(tick).await,
            }
        }
        self.ticks = Some(ticks);
        self
    }

    async fn set_highlighting(&mut self, target: bool) -> Result<bool, EngineError> {
        self.enabled.store(target, Ordering::Relaxed);
        if target {
            if let Err(err) = self.render_pass(true).await {
                // The flag must never claim an overlay that does not exist.
                self.enabled.store(false, Ordering::Relaxed);
                return Err(err);
            }
        } else {
            self.overlay.clear(&mut self.page);
            self.reactor.cancel_rebuilds();
        }
        Ok(self.is_enabled())
    }

    /// Full clear-and-render pass; `reset_colors` restarts the color
    /// session first.
    async fn render_pass(&mut self, reset_colors: bool) -> Result<usize, EngineError> {
        self.wait_for_body().await?;
        if reset_colors {
            self.colors.reset();
        }
        self.overlay
            .render_all(&mut self.page, &mut self.colors, &self.enabled, &self.config)
            .await
    }

    async fn highlight_element(&mut self, raw: &str) -> Result<bool, EngineError> {
        self.wait_for_body().await?;
        // Single-target mode always leaves the highlight-all flag off.
        self.enabled.store(false, Ordering::Relaxed);
        self.reactor.cancel_rebuilds();
        match identity::resolve(&self.page, raw) {
            Some(el) => {
                self.overlay.render_one(&mut self.page, &el)?;
                Ok(true)
            }
            None => {
                self.overlay.clear(&mut self.page);
                Ok(false)
            }
        }
    }

    async fn export_tree(&mut self) -> Result<ExportDocument, EngineError> {
        self.wait_for_body().await?;
        let skip = self.overlay.container().cloned();
        Ok(tree::export(
            &self.page,
            &mut self.records,
            skip.as_ref(),
            self.config.export_depth,
        )
        .await)
    }

    /// Defer until the document body is available, within the retry budget.
    async fn wait_for_body(&self) -> Result<P::Handle, EngineError> {
        for attempt in 0..self.config.body_retry_limit {
            if let Some(body) = self.page.body() {
                return Ok(body);
            }
            if attempt + 1 < self.config.body_retry_limit {
                tokio::time::sleep(self.config.body_retry_interval).await;
            }
        }
        warn!("document body never became available");
        Err(EngineError::BodyUnavailable)
    }
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
