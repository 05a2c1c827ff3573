//! Declaration pruning over compiled CSS.
//!
//! A single AST pass that keeps only what a theme swap can affect: style
//! rules with color-bearing declarations. At-rules, `url(...)` values,
//! palette-probe helper rules, and anything left empty are dropped.
//! Comments do not survive re-printing. Idempotent by construction.

use once_cell::sync::Lazy;
use regex::Regex;

use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;

use crate::error::PipelineError;

/// Properties a theme swap can affect.
const KEEP_PROPERTY: [&str; 4] = ["color", "background", "border", "box-shadow"];

/// Internal helper-class convention used by the palette probe rules.
static HELPER_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(?:main-color|palette-)").unwrap());

/// Strip all non-color-bearing rules from compiled CSS.
///
/// Output is printed non-minified so literal colors keep their six-digit
/// lowercase hex form; the later reverse-substitution pass matches them
/// textually.
pub fn prune(css: &str) -> Result<String, PipelineError> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            error_recovery: true,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| PipelineError::Css(e.to_string()))?;

    let mut kept = Vec::new();
    for rule in std::mem::take(&mut sheet.rules.0) {
        // Every at-rule goes wholesale; only plain style rules can carry
        // theme-relevant declarations.
        let CssRule::Style(mut style) = rule else {
            continue;
        };
        style.rules.0.clear();

        let selector = style
            .selectors
            .to_css_string(PrinterOptions::default())
            .map_err(|e| PipelineError::Css(e.to_string()))?;
        if HELPER_CLASS.is_match(&selector) {
            continue;
        }

        style
            .declarations
            .declarations
            .retain(|property| keep_declaration(property));
        style
            .declarations
            .important_declarations
            .retain(|property| keep_declaration(property));
        if style.declarations.declarations.is_empty()
            && style.declarations.important_declarations.is_empty()
        {
            continue;
        }
        kept.push(CssRule::Style(style));
    }
    sheet.rules.0 = kept;

    let out = sheet
        .to_css(PrinterOptions::default())
        .map_err(|e| PipelineError::Css(e.to_string()))?;
    Ok(out.code)
}

fn keep_declaration(property: &Property) -> bool {
    let name = property.property_id().name().to_ascii_lowercase();
    let value = property
        .value_to_css_string(PrinterOptions::default())
        .unwrap_or_default();
    if value.contains("url(") {
        return false;
    }
    if KEEP_PROPERTY.iter().any(|keep| name.contains(keep)) {
        return true;
    }
    // Dimension-free numeric literals pass as a conservative allowance.
    value.trim().parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prune_ok(css: &str) -> String {
        prune(css).unwrap()
    }

    #[test]
    fn drops_at_rules_wholesale() {
        let css = "@media (min-width: 600px) { .a { color: #111; } }\n\
                   @keyframes spin { from { opacity: 0; } }\n\
                   .b { color: #222; }\n";
        let out = prune_ok(css);
        assert!(!out.contains("@media"));
        assert!(!out.contains("@keyframes"));
        assert!(out.contains(".b"));
    }

    #[test]
    fn drops_non_color_declarations() {
        let out = prune_ok(".a { color: #111; padding: 4px; font-weight: bold; }");
        assert!(out.contains("color: #111"));
        assert!(!out.contains("padding"));
        assert!(!out.contains("font-weight"));
    }

    #[test]
    fn keeps_border_and_box_shadow() {
        let out = prune_ok(".a { border-color: #111; box-shadow: 0 0 2px #222; }");
        assert!(out.contains("border-color"));
        assert!(out.contains("box-shadow"));
    }

    #[test]
    fn keeps_bare_numeric_values() {
        let out = prune_ok(".a { opacity: 0.5; z-index: 9; width: 50%; color: #111; }");
        assert!(out.contains("opacity"));
        assert!(out.contains("z-index"));
        assert!(!out.contains("width"));
    }

    #[test]
    fn drops_url_values() {
        let out = prune_ok(".a { background: url(img.png); color: #111; }");
        assert!(!out.contains("url("));
        assert!(out.contains("color: #111"));
    }

    #[test]
    fn drops_rules_left_empty() {
        let out = prune_ok(".a { padding: 4px; }\n.b { color: #111; }");
        assert!(!out.contains(".a"));
        assert!(out.contains(".b"));
    }

    #[test]
    fn drops_helper_class_rules() {
        let out = prune_ok(".main-color .palette-1 { color: #111; }\n.palette-2 { color: #222; }\n.real { color: #333; }");
        assert!(!out.contains("palette"));
        assert!(out.contains(".real"));
    }

    #[test]
    fn drops_comments() {
        let out = prune_ok("/* header */\n.a { color: #111; /* inline */ }");
        assert!(!out.contains("/*"));
    }

    #[test]
    fn pruning_is_idempotent() {
        let css = "@media print { .x { color: #000; } }\n\
                   .a { color: #123456; margin: 2px; }\n\
                   .b { background: url(x.png); }\n\
                   .c, .d { border: 1px solid #abcdef; }\n";
        let once = prune_ok(css);
        let twice = prune_ok(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_six_digit_hex_when_not_minified() {
        let out = prune_ok(".a { color: #123456; }");
        assert!(out.contains("#123456"));
    }
}
