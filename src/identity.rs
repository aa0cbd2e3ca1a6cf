//! Stable element identity: structural paths, the identifier codec, and the
//! tiered reverse lookup.
//!
//! A stable identifier is a pure function of the element's current state:
//! tag, literal id, classes, leading text, a few tag-specific attributes,
//! and a hash of its structural path. No random token is involved, so the
//! same element on a reloaded, unchanged page produces the same identifier.

use tracing::debug;

use crate::page::Page;

/// Leading-text fragments keep at most this many characters.
const TEXT_FRAGMENT_LEN: usize = 20;
/// Link/image target fragments keep the trailing characters, which carry
/// the distinguishing part of most URLs.
const URL_FRAGMENT_LEN: usize = 30;

/// Replace every non-alphanumeric character with `_`.
pub(crate) fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Sanitized leading text: first [`TEXT_FRAGMENT_LEN`] characters of the
/// element's inner text, non-alphanumerics replaced.
pub(crate) fn leading_text(inner_text: &str) -> String {
    sanitize(&inner_text.chars().take(TEXT_FRAGMENT_LEN).collect::<String>())
}

fn sanitized_head(s: &str, len: usize) -> String {
    sanitize(&s.chars().take(len).collect::<String>())
}

fn sanitized_tail(s: &str, len: usize) -> String {
    let clean = sanitize(s);
    // Sanitized text is pure ASCII, so byte indexing is safe.
    clean[clean.len().saturating_sub(len)..].to_string()
}

/// Fast non-cryptographic string hash: 32-bit wrapping rolling hash folded
/// to unsigned and base-36 encoded. Collision resistance is best-effort.
pub fn path_hash(path: &str) -> String {
    let mut hash: i32 = 0;
    for ch in path.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(ch as i32);
    }
    to_base36(hash.unsigned_abs())
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    out.iter().rev().collect()
}

/// Structural path from the document root to `el`.
///
/// Each segment is `tag[.classes][:nth-of-type(n)]` where `n` counts only
/// preceding siblings with the same tag, so inserting siblings of other
/// tags does not shift the index. An ancestor carrying a literal `id`
/// anchors the path (`tag#id`) and stops the upward walk.
pub fn structural_path<P: Page>(page: &P, el: &P::Handle) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = Some(el.clone());
    while let Some(node) = current {
        let tag = page.tag_name(&node);
        if let Some(id) = page.dom_id(&node) {
            segments.push(format!("{}#{}", tag, id));
            break;
        }
        let mut selector = tag.clone();
        let classes = page.class_list(&node);
        if !classes.is_empty() {
            selector.push('.');
            selector.push_str(&classes.join("."));
        }
        selector.push_str(&format!(":nth-of-type({})", same_tag_index(page, &node, &tag)));
        segments.push(selector);
        current = page.parent(&node);
    }
    segments.reverse();
    segments.join(" > ")
}

/// 1-based index of `el` among its same-tag siblings.
fn same_tag_index<P: Page>(page: &P, el: &P::Handle, tag: &str) -> usize {
    let Some(parent) = page.parent(el) else {
        return 1;
    };
    let mut index = 1;
    for sibling in page.children(&parent) {
        if &sibling == el {
            break;
        }
        if page.tag_name(&sibling) == tag {
            index += 1;
        }
    }
    index
}

/// Compute the stable identifier for an element.
pub fn stable_id<P: Page>(page: &P, el: &P::Handle) -> String {
    let tag = page.tag_name(el);
    let mut id = tag.clone();

    if let Some(dom_id) = page.dom_id(el) {
        id.push_str("_id_");
        id.push_str(&dom_id);
    }

    let mut classes = page.class_list(el);
    classes.sort();
    if !classes.is_empty() {
        id.push_str("_class_");
        id.push_str(&classes.join("."));
    }

    let text = leading_text(&page.inner_text(el));
    if !text.is_empty() {
        id.push_str("_text_");
        id.push_str(&text);
    }

    id.push_str(&attribute_fragments(page, el, &tag));

    id.push_str("_path_");
    id.push_str(&path_hash(&structural_path(page, el)));
    id
}

/// Tag-specific attribute fragments, each independently optional.
fn attribute_fragments<P: Page>(page: &P, el: &P::Handle, tag: &str) -> String {
    match tag {
        "a" => page
            .attribute(el, "href")
            .filter(|v| !v.is_empty())
            .map(|href| format!("_href_{}", sanitized_tail(&href, URL_FRAGMENT_LEN)))
            .unwrap_or_default(),
        "img" => page
            .attribute(el, "src")
            .filter(|v| !v.is_empty())
            .map(|src| format!("_src_{}", sanitized_tail(&src, URL_FRAGMENT_LEN)))
            .unwrap_or_default(),
        "input" => {
            let mut out = String::new();
            if let Some(name) = page.attribute(el, "name").filter(|v| !v.is_empty()) {
                out.push_str("_name_");
                out.push_str(&name);
            }
            if let Some(placeholder) = page
                .attribute(el, "placeholder")
                .filter(|v| !v.is_empty())
            {
                out.push_str("_placeholder_");
                out.push_str(&sanitized_head(&placeholder, TEXT_FRAGMENT_LEN));
            }
            out
        }
        _ => String::new(),
    }
}

/// Fragment markers the codec recognizes when decoding an identifier.
const MARKERS: &[&str] = &[
    "_id_",
    "_class_",
    "_text_",
    "_href_",
    "_src_",
    "_name_",
    "_placeholder_",
    "_path_",
];

/// Decoded view of a stable identifier.
///
/// Decoding scans for the known `_marker_` substrings. Sanitized content
/// that happens to contain a marker string mis-splits; identifiers are
/// best-effort parseable, not a robust wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    /// Lowercase tag name (always present).
    pub tag: String,
    /// Literal DOM id, if encoded.
    pub dom_id: Option<String>,
    /// Sorted dot-joined class list, if encoded.
    pub classes: Option<String>,
    /// Sanitized leading text, if encoded.
    pub text: Option<String>,
    /// Base-36 structural-path hash, if encoded.
    pub path_hash: Option<String>,
}

impl ParsedId {
    /// Decode an identifier. Returns `None` when no leading tag name is
    /// present.
    pub fn parse(raw: &str) -> Option<Self> {
        let tag: String = raw
            .chars()
            .take_while(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();
        if tag.is_empty() {
            return None;
        }

        let mut found: Vec<(usize, &str)> = MARKERS
            .iter()
            .filter_map(|marker| raw.find(marker).map(|pos| (pos, *marker)))
            .collect();
        found.sort_unstable();

        let mut parsed = ParsedId {
            tag,
            dom_id: None,
            classes: None,
            text: None,
            path_hash: None,
        };
        for (i, (pos, marker)) in found.iter().enumerate() {
            let start = pos + marker.len();
            let end = found.get(i + 1).map(|(next, _)| *next).unwrap_or(raw.len());
            if start >= end {
                continue;
            }
            let value = &raw[start..end];
            match *marker {
                "_id_" => parsed.dom_id = Some(value.to_string()),
                "_class_" => parsed.classes = Some(value.to_string()),
                "_text_" => parsed.text = Some(value.to_string()),
                "_path_" => parsed.path_hash = Some(value.to_string()),
                // Attribute fragments identify but do not participate in
                // resolution.
                _ => {}
            }
        }
        Some(parsed)
    }
}

/// Resolve a stable identifier back to a live element.
///
/// Four progressively relaxed tiers, first match wins:
///
/// 1. literal DOM id, accepted only when the tag also matches;
/// 2. same-tag scan comparing recomputed structural-path hashes;
/// 3. same-tag scan requiring equality of every encoded fragment among
///    sorted class list and leading text;
/// 4. `None`.
///
/// Duplicate, structurally identical elements resolve to the first match in
/// document order; that is best-effort by design, not a guarantee.
pub fn resolve<P: Page>(page: &P, raw: &str) -> Option<P::Handle> {
    let parsed = ParsedId::parse(raw)?;
    let tiers: [(&str, fn(&P, &ParsedId) -> Option<P::Handle>); 3] = [
        ("dom-id", by_dom_id::<P>),
        ("path-hash", by_path_hash::<P>),
        ("fragments", by_fragments::<P>),
    ];
    for (name, tier) in tiers {
        if let Some(el) = tier(page, &parsed) {
            debug!(tier = name, "resolved stable identifier");
            return Some(el);
        }
    }
    debug!(id = raw, "stable identifier did not resolve");
    None
}

/// Tier 1: the encoded literal id names exactly one element natively.
fn by_dom_id<P: Page>(page: &P, id: &ParsedId) -> Option<P::Handle> {
    let dom_id = id.dom_id.as_deref()?;
    let el = page.element_by_id(dom_id)?;
    (page.tag_name(&el) == id.tag).then_some(el)
}

/// Tier 2: recompute path hashes over all same-tag elements.
fn by_path_hash<P: Page>(page: &P, id: &ParsedId) -> Option<P::Handle> {
    let hash = id.path_hash.as_deref()?;
    page.elements_by_tag(&id.tag)
        .into_iter()
        .find(|el| path_hash(&structural_path(page, el)) == hash)
}

/// Tier 3: relaxed match on whichever of class list / leading text the
/// identifier carries. All present fragments must match.
fn by_fragments<P: Page>(page: &P, id: &ParsedId) -> Option<P::Handle> {
    if id.classes.is_none() && id.text.is_none() {
        return None;
    }
    page.elements_by_tag(&id.tag).into_iter().find(|el| {
        if let Some(classes) = &id.classes {
            let mut own = page.class_list(el);
            own.sort();
            if &own.join(".") != classes {
                return false;
            }
        }
        if let Some(text) = &id.text {
            if &leading_text(&page.inner_text(el)) != text {
                return false;
            }
        }
        true
    })
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;
