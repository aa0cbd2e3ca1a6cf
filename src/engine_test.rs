// Unit tests for the engine's command surface and tick handling

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::identity;
use crate::memory_page::{MemoryPage, NodeSpec};

/// One visible qualifying element on an 800x600 viewport.
fn simple_page() -> MemoryPage {
    let mut page = MemoryPage::with_body("Simple", "https://example.com/");
    page.set_viewport(800.0, 600.0);
    let body = page.attach_body();
    page.insert(
        body,
        NodeSpec::new("div").class("card").rect(10.0, 10.0, 100.0, 50.0),
    );
    page
}

#[tokio::test]
async fn test_toggle_highlighting() {
    let mut engine = Engine::new(simple_page());
    assert!(!engine.is_enabled());

    let response = engine.handle(Command::SetHighlighting { force: None }).await;
    assert_eq!(response, Response::Highlighting { enabled: true });
    assert_eq!(engine.page().container_count(), 1);
    assert_eq!(engine.page().box_count(), 1);

    let response = engine.handle(Command::SetHighlighting { force: None }).await;
    assert_eq!(response, Response::Highlighting { enabled: false });
    assert_eq!(engine.page().container_count(), 0);
}

#[tokio::test]
async fn test_force_state_is_idempotent() {
    let mut engine = Engine::new(simple_page());
    for _ in 0..2 {
        let response = engine
            .handle(Command::SetHighlighting { force: Some(true) })
            .await;
        assert_eq!(response, Response::Highlighting { enabled: true });
    }
    assert_eq!(engine.page().container_count(), 1);

    // Disabling twice is a no-op the second time, not an error
    for _ in 0..2 {
        let response = engine
            .handle(Command::SetHighlighting { force: Some(false) })
            .await;
        assert_eq!(response, Response::Highlighting { enabled: false });
    }
    assert_eq!(engine.page().container_count(), 0);
}

#[tokio::test]
async fn test_get_state() {
    let mut engine = Engine::new(simple_page());
    assert_eq!(
        engine.handle(Command::GetState).await,
        Response::State { enabled: false }
    );
    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;
    assert_eq!(
        engine.handle(Command::GetState).await,
        Response::State { enabled: true }
    );
}

#[tokio::test]
async fn test_highlight_element_found() {
    let mut page = simple_page();
    let body = page.attach_body();
    let target = page.insert(
        body,
        NodeSpec::new("p").class("x").text("Hello World").rect(
            10.0, 200.0, 150.0, 30.0,
        ),
    );
    let id = identity::stable_id(&page, &target);

    let mut engine = Engine::new(page);
    // Start in highlight-all mode to verify the implicit transition out
    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;

    let response = engine.handle(Command::HighlightElement { id }).await;
    assert_eq!(response, Response::Highlighted { found: true });
    assert!(!engine.is_enabled(), "single-target mode clears the flag");
    assert_eq!(engine.page().container_count(), 1);
    assert_eq!(engine.page().box_count(), 1);
    assert!(engine.page().drawn_boxes()[0].target);
    assert_eq!(engine.page().scrolled_to(), Some(target));
}

#[tokio::test]
async fn test_highlight_element_not_found() {
    let mut engine = Engine::new(simple_page());
    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;
    assert_eq!(engine.page().container_count(), 1);

    let response = engine
        .handle(Command::HighlightElement {
            id: "table_path_zzz".to_string(),
        })
        .await;
    assert_eq!(response, Response::Highlighted { found: false });
    // Not-found clears the previous overlay and draws nothing
    assert_eq!(engine.page().container_count(), 0);
    assert!(!engine.is_enabled());
}

#[tokio::test]
async fn test_export_tree_response() {
    let mut engine = Engine::new(simple_page());
    let response = engine.handle(Command::ExportTree).await;
    match response {
        Response::Export { document } => {
            assert_eq!(document.title, "Simple");
            let tree = document.tree.expect("body tree");
            assert_eq!(tree.tag, "body");
            assert_eq!(tree.children.len(), 1);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_export_excludes_active_overlay() {
    let mut engine = Engine::new(simple_page());
    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;

    let response = engine.handle(Command::ExportTree).await;
    let Response::Export { document } = response else {
        panic!("expected export");
    };
    let tree = document.tree.unwrap();
    // Only the content div; the overlay container is not serialized
    assert_eq!(tree.children.len(), 1);
    assert_eq!(tree.children[0].id, None);
}

#[tokio::test(start_paused = true)]
async fn test_body_unavailable_fails_commands() {
    let config = EngineConfig {
        body_retry_interval: Duration::from_millis(10),
        body_retry_limit: 3,
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(MemoryPage::new("No body", "u"), config);

    let response = engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;
    assert!(matches!(response, Response::Failed { .. }));
    assert!(!engine.is_enabled(), "a failed pass leaves the flag off");

    let response = engine.handle(Command::ExportTree).await;
    assert!(matches!(response, Response::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_mutation_event_triggers_debounced_rebuild() {
    let mut engine = Engine::new(simple_page());
    let mut ticks = engine.take_ticks().expect("ticks");

    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;
    assert_eq!(engine.page().box_count(), 1);

    // The page grows a new element; the reactor debounces a rebuild.
    let body = engine.page_mut().attach_body();
    engine
        .page_mut()
        .insert(body, NodeSpec::new("p").rect(10.0, 100.0, 100.0, 40.0));
    engine.on_event(PageEvent::Mutated);

    let tick = ticks.recv().await.expect("debounced tick");
    assert_eq!(tick, Tick::RebuildHighlights);
    engine.on_tick(tick).await;
    assert_eq!(engine.page().box_count(), 2);
    assert_eq!(engine.page().container_count(), 1);
}

#[tokio::test]
async fn test_rebuild_tick_is_ignored_while_off() {
    let mut engine = Engine::new(simple_page());
    engine.on_tick(Tick::RebuildHighlights).await;
    assert_eq!(engine.page().container_count(), 0);

    engine.on_tick(Tick::NavigationSettled).await;
    assert_eq!(engine.page().container_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_are_ignored_while_off() {
    let mut engine = Engine::new(simple_page());
    let mut ticks = engine.take_ticks().expect("ticks");

    engine.on_event(PageEvent::Mutated);
    engine.on_event(PageEvent::Scrolled);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(ticks.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_scroll_event_refreshes_positions() {
    let mut engine = Engine::new(simple_page());
    let mut ticks = engine.take_ticks().expect("ticks");

    engine
        .handle(Command::SetHighlighting { force: Some(true) })
        .await;
    assert_eq!(engine.page().box_count(), 1);

    engine.page_mut().set_scroll(0.0, 2000.0);
    engine.on_event(PageEvent::Scrolled);

    let tick = ticks.recv().await.expect("refresh tick");
    assert_eq!(tick, Tick::RefreshPositions);
    engine.on_tick(tick).await;
    // The element scrolled out of view, so its box is culled
    assert_eq!(engine.page().box_count(), 0);
    assert_eq!(engine.page().container_count(), 1);
}

#[tokio::test]
async fn test_command_serde_wire_shape() {
    let command: Command =
        serde_json::from_value(json!({"action": "set_highlighting", "force": true})).unwrap();
    assert_eq!(
        command,
        Command::SetHighlighting { force: Some(true) }
    );

    let command: Command = serde_json::from_value(json!({"action": "get_state"})).unwrap();
    assert_eq!(command, Command::GetState);

    let response = Response::Highlighting { enabled: true };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"result": "highlighting", "enabled": true})
    );

    let response = Response::Highlighted { found: false };
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"result": "highlighted", "found": false})
    );
}

#[tokio::test]
async fn test_run_loop_processes_commands() {
    use tokio::sync::{mpsc, oneshot};

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (_event_tx, event_rx) = mpsc::unbounded_channel();

    let engine = Engine::new(simple_page());
    let task = tokio::spawn(engine.run(cmd_rx, event_rx));

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx
        .send((Command::SetHighlighting { force: Some(true) }, reply_tx))
        .unwrap();
    assert_eq!(
        reply_rx.await.unwrap(),
        Response::Highlighting { enabled: true }
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    cmd_tx.send((Command::GetState, reply_tx)).unwrap();
    assert_eq!(reply_rx.await.unwrap(), Response::State { enabled: true });

    // Closing the command channel ends the loop and hands the engine back
    drop(cmd_tx);
    let engine = task.await.unwrap();
    assert_eq!(engine.page().container_count(), 1);
}
