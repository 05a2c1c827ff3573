//! Textual minification of the assembled stylesheet.
//!
//! The assembled text contains Less variable references and ramp
//! expressions, so no CSS parser will accept it; minification is a fixed
//! sequence of textual passes instead. One rule per line, selector lists
//! joined with `, `, declarations kept as-is apart from collapsed
//! whitespace. Idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());
static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\r\n]+\s*").unwrap());
static COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

/// Collapse `css` to its minimal one-rule-per-line form.
pub fn minify(css: &str) -> String {
    let stripped = COMMENT.replace_all(css, "");
    let joined = LINE_BREAKS.replace_all(&stripped, "");
    let spaced = COMMA.replace_all(&joined, ", ");
    let mut out = spaced.replace('}', "}\n");
    out.truncate(out.trim_end().len());
    out.trim_start().to_string()
}
