// Common fixtures for integration tests

use std::sync::Once;

use domscope::{MemoryPage, NodeSpec};

static TRACING: Once = Once::new();

/// Route engine logs through the test writer; `RUST_LOG=domscope=debug`
/// shows them on failures.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// `<div id="a"><p class="x">Hello World</p></div>`, everything visible on
/// an 800x600 viewport.
#[allow(dead_code)]
pub fn scenario_page() -> MemoryPage {
    let mut page = MemoryPage::with_body("Scenario", "https://example.com/");
    page.set_viewport(800.0, 600.0);
    let body = page.attach_body();
    let div = page.insert(
        body,
        NodeSpec::new("div").dom_id("a").rect(0.0, 0.0, 400.0, 100.0),
    );
    page.insert(
        div,
        NodeSpec::new("p")
            .class("x")
            .text("Hello World")
            .rect(10.0, 10.0, 200.0, 30.0),
    );
    page
}

/// Three qualifying elements plus two below the minimum visible size.
#[allow(dead_code)]
pub fn sized_page() -> MemoryPage {
    let mut page = MemoryPage::with_body("Sized", "https://example.com/sized");
    page.set_viewport(800.0, 600.0);
    let body = page.attach_body();
    page.insert(body, NodeSpec::new("div").rect(10.0, 10.0, 200.0, 80.0));
    page.insert(body, NodeSpec::new("p").rect(10.0, 100.0, 300.0, 40.0));
    page.insert(body, NodeSpec::new("button").rect(10.0, 150.0, 120.0, 32.0));
    page.insert(body, NodeSpec::new("div").rect(10.0, 200.0, 8.0, 8.0));
    page.insert(body, NodeSpec::new("div").rect(10.0, 220.0, 100.0, 4.0));
    page
}
