// Unit tests for signature computation and the color table

use pretty_assertions::assert_eq;

use super::*;
use crate::memory_page::{MemoryPage, NodeSpec};

#[test]
fn test_color_display_and_parse() {
    let color = Color(0xFF00AB);
    assert_eq!(color.to_string(), "#FF00AB");
    assert_eq!(Color::parse("#FF00AB").unwrap(), color);
    assert_eq!(Color::parse("ff00ab").unwrap(), color);

    assert!(Color::parse("#12345").is_err());
    assert!(Color::parse("#ZZZZZZ").is_err());
    assert!(Color::parse("").is_err());
}

#[test]
fn test_color_serde() {
    let color = Color(0x0000FF);
    let json = serde_json::to_string(&color).unwrap();
    assert_eq!(json, "\"#0000FF\"");
    let back: Color = serde_json::from_str(&json).unwrap();
    assert_eq!(back, color);
}

#[test]
fn test_signature_sorts_classes() {
    let mut page = MemoryPage::with_body("t", "u");
    let body = page.attach_body();
    let el = page.insert(body, NodeSpec::new("div").class("zebra").class("alpha"));
    assert_eq!(signature(&page, &el), "div.alpha.zebra");

    let bare = page.insert(body, NodeSpec::new("span"));
    assert_eq!(signature(&page, &bare), "span");
}

#[test]
fn test_color_for_is_stable_within_session() {
    let mut colors = ColorTable::with_seed(42);
    let first = colors.color_for("div.card");
    let again = colors.color_for("div.card");
    assert_eq!(first, again);
    assert_eq!(colors.len(), 1);
}

#[test]
fn test_distinct_signatures_get_own_entries() {
    let mut colors = ColorTable::with_seed(7);
    let a = colors.color_for("div.card");
    let b = colors.color_for("span");
    let c = colors.color_for("a.nav");
    assert_eq!(colors.len(), 3);
    // 24-bit draws from a seeded generator; a collision here would be a
    // one-in-sixteen-million accident.
    assert_ne!(a, b);
    assert_ne!(b, c);
}

#[test]
fn test_colors_are_24_bit() {
    let mut colors = ColorTable::with_seed(1);
    for i in 0..64 {
        let color = colors.color_for(&format!("tag{}", i));
        assert!(color.0 <= 0xFF_FFFF);
    }
}

#[test]
fn test_reset_starts_a_new_session() {
    let mut colors = ColorTable::with_seed(3);
    colors.color_for("div");
    colors.color_for("p");
    assert_eq!(colors.len(), 2);

    colors.reset();
    assert!(colors.is_empty());
    // A fresh session may assign a different color; it only has to be
    // self-consistent.
    let after = colors.color_for("div");
    assert_eq!(colors.color_for("div"), after);
}
