//! Variable collection from a Less variable-definitions file.
//!
//! Extraction is deliberately line-oriented: a variables file is a flat list
//! of `@name: value;` declarations, and a full Less parse buys nothing here.
//! The regex is isolated behind [`extract_declarations`] so the mapping
//! builder and the classifier never see it.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::color::is_color;
use crate::error::CoreError;

/// One top-level `@name: value;` declaration per line. Names may be quoted
/// in the source; quotes are stripped. Lines that superficially resemble a
/// declaration but do not match contribute nothing.
static DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^@([\w'"-]+)\s*:\s*([^;]+);?\s*$"#).unwrap());

/// Extract structured `(name, raw_value)` pairs from file content.
///
/// Names come back with the `@` sigil and without quotes; values are
/// verbatim with the trailing semicolon trimmed.
pub fn extract_declarations(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let caps = DECLARATION.captures(line.trim())?;
            let name = format!("@{}", caps[1].replace(['\'', '"'], ""));
            let value = caps[2].trim().to_string();
            if value.is_empty() {
                return None;
            }
            Some((name, value))
        })
        .collect()
}

/// Name→value mapping built from a variable-definitions file.
///
/// Two passes are merged:
/// - `raw` keeps every declaration verbatim, no validity filtering;
/// - `colors` keeps only entries whose alias-resolved terminal value passes
///   the color classifier, with the resolved value stored.
///
/// Lookups prefer the resolved colors view so aliases read as their terminal
/// literal; `raw` supplies everything else. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct VariableMapping {
    raw: BTreeMap<String, String>,
    colors: BTreeMap<String, String>,
}

impl VariableMapping {
    /// Build the mapping from file content.
    ///
    /// Returns [`CoreError::CyclicVariableReference`] if an alias chain
    /// revisits a name instead of terminating in a literal.
    pub fn collect(content: &str, extra: &[Regex]) -> Result<Self, CoreError> {
        let declarations = extract_declarations(content);

        let mut raw = BTreeMap::new();
        for (name, value) in &declarations {
            raw.insert(name.clone(), value.clone());
        }

        let mut colors = BTreeMap::new();
        for (name, value) in &declarations {
            let resolved = resolve_alias(name, value, &raw)?;
            if is_color(&resolved, extra) {
                colors.insert(name.clone(), resolved);
            } else {
                trace!(variable = %name, value = %value, "skipping non-color variable");
            }
        }

        Ok(Self { raw, colors })
    }

    /// Merged lookup: resolved color value when the variable is a color,
    /// otherwise the verbatim raw value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.colors
            .get(name)
            .or_else(|| self.raw.get(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.raw.contains_key(name) || self.colors.contains_key(name)
    }

    /// The color-validated sub-map (alias chains resolved).
    pub fn colors(&self) -> &BTreeMap<String, String> {
        &self.colors
    }

    /// The unfiltered sub-map (values verbatim).
    pub fn raw(&self) -> &BTreeMap<String, String> {
        &self.raw
    }
}

/// Follow a `@a: @b;` reference chain through the declaration set until a
/// non-reference terminal is reached. A name seen twice is a cycle.
fn resolve_alias(
    name: &str,
    value: &str,
    declarations: &BTreeMap<String, String>,
) -> Result<String, CoreError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = value.trim();
    while current.starts_with('@') {
        if !seen.insert(current) {
            return Err(CoreError::CyclicVariableReference(name.to_string()));
        }
        match declarations.get(current) {
            Some(next) => current = next.trim(),
            // Dangling reference: leave it as-is, the classifier rejects it.
            None => break,
        }
    }
    Ok(current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collects_and_resolves_aliases() {
        let mapping = VariableMapping::collect("@a: #111;\n@b: @a;\n@c: 10px;\n", &[]).unwrap();
        assert_eq!(mapping.get("@a"), Some("#111"));
        assert_eq!(mapping.get("@b"), Some("#111"));
        assert_eq!(mapping.get("@c"), Some("10px"));
        assert!(!mapping.colors().contains_key("@c"));
        assert_eq!(mapping.raw().get("@c").map(String::as_str), Some("10px"));
        assert_eq!(mapping.raw().get("@b").map(String::as_str), Some("@a"));
    }

    #[test]
    fn strips_quotes_from_names() {
        let mapping = VariableMapping::collect("@\"accent\": #abc;\n", &[]).unwrap();
        assert_eq!(mapping.get("@accent"), Some("#abc"));
    }

    #[test]
    fn skips_lines_that_do_not_match() {
        let content = "// comment\n@import \"other\";\n.rule { color: red; }\n@good: #222;\n";
        let mapping = VariableMapping::collect(content, &[]).unwrap();
        assert_eq!(mapping.raw().len(), 1);
        assert_eq!(mapping.get("@good"), Some("#222"));
    }

    #[test]
    fn cyclic_reference_is_an_error() {
        let err = VariableMapping::collect("@a: @b;\n@b: @a;\n", &[]).unwrap_err();
        assert!(matches!(err, CoreError::CyclicVariableReference(_)));
    }

    #[test]
    fn dangling_reference_is_not_a_color() {
        let mapping = VariableMapping::collect("@a: @missing;\n", &[]).unwrap();
        assert!(!mapping.colors().contains_key("@a"));
        assert_eq!(mapping.get("@a"), Some("@missing"));
    }

    #[test]
    fn chain_resolves_through_multiple_hops() {
        let mapping =
            VariableMapping::collect("@a: #333;\n@b: @a;\n@c: @b;\n@d: @c;\n", &[]).unwrap();
        assert_eq!(mapping.get("@d"), Some("#333"));
    }
}
