//! Discovery artifacts: marker assignments, discovered colors, fade sentinels.
//!
//! These types carry state between pipeline stages. They are built fresh per
//! generation run and discarded afterwards; none of them touch the
//! filesystem.

use std::collections::BTreeMap;

/// Reserved marker for `@primary-color`. Every other marker is random, but
/// the primary variable always compiles to this sentinel so its downstream
/// occurrences are stable across runs.
pub const PRIMARY_MARKER: &str = "#123456";

/// Shade ramp indices. Index 6 is the base color itself in the library's
/// palette convention and is skipped.
const SHADE_INDICES: [u8; 9] = [1, 2, 3, 4, 5, 7, 8, 9, 10];

pub fn shade_indices() -> impl Iterator<Item = u8> {
    SHADE_INDICES.into_iter()
}

/// For a shade token like `@primary-3`, return the base variable name
/// (`@primary-color`) and the shade index. Non-shade tokens return `None`.
pub fn shade_base(token: &str) -> Option<(String, u8)> {
    let (stem, index) = token.rsplit_once('-')?;
    let index: u8 = index.parse().ok()?;
    if !SHADE_INDICES.contains(&index) || !stem.starts_with('@') {
        return None;
    }
    Some((format!("{stem}-color"), index))
}

/// The ramp-expression form a shade token is re-substituted to, so the
/// output stays resolvable by the same palette function at switch time.
pub fn ramp_expression(base: &str, index: u8) -> String {
    format!("colorPalette({base}, {index})")
}

/// Bidirectional variable-name ↔ assigned marker color map.
#[derive(Debug, Clone, Default)]
pub struct MarkerAssignment {
    by_name: BTreeMap<String, String>,
    by_color: BTreeMap<String, String>,
}

impl MarkerAssignment {
    pub fn insert(&mut self, name: impl Into<String>, color: impl Into<String>) {
        let (name, color) = (name.into(), color.into());
        self.by_color.insert(color.clone(), name.clone());
        self.by_name.insert(name, color);
    }

    pub fn color_of(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn name_of(&self, color: &str) -> Option<&str> {
        self.by_color.get(color).map(String::as_str)
    }

    pub fn contains_color(&self, color: &str) -> bool {
        self.by_color.contains_key(color)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_name.iter().map(|(n, c)| (n.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Variable token → literal color the compiler resolved it to, including
/// shade-suffixed tokens like `@primary-3`. The central discovery artifact:
/// everything downstream keys off it.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredColorMap {
    entries: BTreeMap<String, String>,
}

impl DiscoveredColorMap {
    pub fn insert(&mut self, token: impl Into<String>, color: impl Into<String>) {
        self.entries.insert(token.into(), color.into());
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries.get(token).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), c.as_str()))
    }

    /// Entries ordered by descending color length, so substituting one
    /// discovered color can never corrupt a longer one it prefixes.
    pub fn by_color_length(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(b.0)));
        entries
    }

    /// Tokens ordered by descending name length, for value-position
    /// substitution (`@primary-10` before `@primary-1`).
    pub fn by_token_length(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Exact `fade(...)` call text → temporary sentinel color substituted while
/// the target stylesheet compiles. Inverted afterwards to restore the
/// original call syntax. Scoped to one assembler invocation.
#[derive(Debug, Clone, Default)]
pub struct FadeMap {
    entries: Vec<(String, String)>,
}

impl FadeMap {
    pub fn insert(&mut self, call: impl Into<String>, sentinel: impl Into<String>) {
        self.entries.push((call.into(), sentinel.into()));
    }

    pub fn sentinel_of(&self, call: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == call)
            .map(|(_, s)| s.as_str())
    }

    /// `(call, sentinel)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, s)| (c.as_str(), s.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
