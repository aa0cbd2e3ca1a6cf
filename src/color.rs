use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::page::Page;

/// Border color of the single-target highlight box. Fixed, so one-shot
/// highlights are visually distinct from signature-colored ones.
pub const TARGET_COLOR: Color = Color(0xFF0000);

/// 24-bit RGB color, serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Parse from `#RRGGBB` (leading `#` optional).
    pub fn parse(s: &str) -> Result<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            anyhow::bail!("invalid color literal: {}", s);
        }
        let value = u32::from_str_radix(hex, 16)
            .map_err(|_| anyhow::anyhow!("invalid color literal: {}", s))?;
        Ok(Color(value))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06X}", self.0 & 0xFF_FFFF)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(D::Error::custom)
    }
}

/// Structural signature of an element: tag name plus the sorted,
/// dot-joined class list. Elements sharing a signature share a color.
pub fn signature<P: Page>(page: &P, el: &P::Handle) -> String {
    let tag = page.tag_name(el);
    let mut classes = page.class_list(el);
    classes.sort();
    if classes.is_empty() {
        tag
    } else {
        format!("{}.{}", tag, classes.join("."))
    }
}

/// Signature-to-color table for one highlighting session.
///
/// The first request for a signature allocates a pseudo-random color and
/// caches it; later requests return the cached color. There is no eviction:
/// the table is cleared wholesale when a full highlight pass restarts.
/// Colors are stable within a session only; a fresh session may recolor.
pub struct ColorTable {
    colors: HashMap<String, Color>,
    rng: StdRng,
}

impl ColorTable {
    pub fn new() -> Self {
        ColorTable {
            colors: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic table for tests.
    pub fn with_seed(seed: u64) -> Self {
        ColorTable {
            colors: HashMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The color assigned to `signature`, allocating one on first use.
    pub fn color_for(&mut self, signature: &str) -> Color {
        if let Some(color) = self.colors.get(signature) {
            return *color;
        }
        let color = Color(self.rng.gen_range(0..=0xFF_FFFF));
        self.colors.insert(signature.to_string(), color);
        color
    }

    /// Drop all assignments, so the next pass recolors from scratch.
    pub fn reset(&mut self) {
        self.colors.clear();
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        ColorTable::new()
    }
}

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;
