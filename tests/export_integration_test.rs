// Integration tests for the exported document format

use serde_json::Value;

use domscope::{Command, Engine, MemoryPage, NodeSpec, Response};

mod common;
use common::scenario_page;

async fn export_json(engine: &mut Engine<MemoryPage>) -> Value {
    match engine.handle(Command::ExportTree).await {
        Response::Export { document } => serde_json::to_value(&document).unwrap(),
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn test_export_document_wire_format() {
    let mut engine = Engine::new(scenario_page());
    let value = export_json(&mut engine).await;

    assert_eq!(value["title"], Value::String("Scenario".to_string()));
    assert_eq!(
        value["url"],
        Value::String("https://example.com/".to_string())
    );
    assert!(
        chrono::DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).is_ok()
    );

    let body = &value["tree"];
    assert_eq!(body["tag"], Value::String("body".to_string()));
    assert!(body["uniqueId"].is_string());
    assert!(body["path"].is_string());
    assert!(body["classes"].is_array());
    assert_eq!(body["id"], Value::Null);

    let div = &body["children"][0];
    assert_eq!(div["id"], Value::String("a".to_string()));
    // div carries the text key of the per-tag table, explicit null included
    assert!(div.as_object().unwrap().contains_key("text"));

    let p = &div["children"][0];
    assert_eq!(p["tag"], Value::String("p".to_string()));
    assert_eq!(p["text"], Value::String("Hello World".to_string()));
    assert_eq!(p["classes"], serde_json::json!(["x"]));
    assert!(p["rect"]["top"].is_number());
    assert!(p["style"]["backgroundColor"].is_string());
}

#[tokio::test]
async fn test_export_depth_defaults_to_five() {
    let mut page = MemoryPage::with_body("Deep", "https://example.com/deep");
    let body = page.attach_body();
    let mut parent = body;
    for _ in 0..8 {
        parent = page.insert(parent, NodeSpec::new("div"));
    }

    let mut engine = Engine::new(page);
    let value = export_json(&mut engine).await;

    let mut depth = 0;
    let mut node = &value["tree"];
    while node["children"].as_array().is_some_and(|c| !c.is_empty()) {
        node = &node["children"][0];
        depth += 1;
    }
    assert_eq!(depth, 5);
}

#[tokio::test]
async fn test_absent_tag_fields_serialize_as_null() {
    let mut page = MemoryPage::with_body("Nulls", "https://example.com/");
    let body = page.attach_body();
    page.insert(body, NodeSpec::new("a"));
    page.insert(body, NodeSpec::new("input"));

    let mut engine = Engine::new(page);
    let value = export_json(&mut engine).await;

    let link = &value["tree"]["children"][0];
    assert_eq!(link["href"], Value::Null);
    assert_eq!(link["text"], Value::Null);

    let input = &value["tree"]["children"][1];
    assert_eq!(input["type"], Value::Null);
    assert_eq!(input["placeholder"], Value::Null);
    assert_eq!(input["value"], Value::Null);
}

#[tokio::test]
async fn test_run_loop_end_to_end() {
    use tokio::sync::{mpsc, oneshot};

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let engine = Engine::new(scenario_page());
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
    cmd_tx.send((Command::ExportTree, reply_tx)).unwrap();
    let Response::Export { document } = reply_rx.await.unwrap() else {
        panic!("expected export");
    };
    assert_eq!(document.title, "Scenario");

    drop(event_tx);
    drop(cmd_tx);
    let engine = task.await.unwrap();
    assert!(engine.page().container_count() <= 1);
}
