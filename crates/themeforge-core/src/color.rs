//! Color classification.
//!
//! [`is_color`] is the single gate used everywhere a raw string must be
//! judged "is this a theme-relevant color": the variable collector, the
//! discovery scan, and the assembler's re-substitution filter all call it,
//! so a value cannot pass into one mapping and fail out of another.

use once_cell::sync::Lazy;
use regex::Regex;

/// Less functions that produce a color at compile time. Values referencing
/// these are treated as colors even though they are not literals.
static DYNAMIC_COLOR_FN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(colorPalette|fade)\s*\(").unwrap());

/// Functional notation: `rgb`/`hsl`/`hsv` with optional alpha, 2-3 numeric
/// or percentage components (optional angle unit on the first), optional
/// trailing alpha component.
static FUNCTIONAL_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)^(rgb|hsl|hsv)a?\(
            \s*(-?[\d.]+%?(deg|grad|rad|turn)?\s*,\s*){1,2}
            -?[\d.]+%?\s*
            (,\s*-?[\d.]+%?\s*)?\)$",
    )
    .unwrap()
});

/// Decide whether a raw value string denotes a color.
///
/// `extra` holds caller-supplied patterns consulted only when none of the
/// built-in forms match.
pub fn is_color(value: &str, extra: &[Regex]) -> bool {
    let value = value.trim();
    if value.contains("rgb") {
        return true;
    }
    if value.is_empty() || value.contains("px") {
        return false;
    }
    if DYNAMIC_COLOR_FN.is_match(value) {
        return true;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit());
    }
    if FUNCTIONAL_COLOR.is_match(value) {
        return true;
    }
    extra.iter().any(|re| re.is_match(value))
}
