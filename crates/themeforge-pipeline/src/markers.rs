//! Variable discovery via randomized recompilation.
//!
//! The Less compiler does not report which intermediate value a variable
//! resolved to at each use site, so the pipeline forces a discoverable
//! imprint instead: every theme variable gets a probe rule
//! `.<name> { color: <marker>; }` compiled against the real variable file
//! with marker overrides appended. Scanning the compiled output for
//! `.class { color: value; }` pairs recovers, per variable, the literal the
//! compiler resolved it to. Shade variants get nine extra probes whose
//! values come from the library's palette function, because a ramp output
//! cannot be predicted analytically.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use rand::RngExt;
use regex::Regex;
use tracing::{debug, trace};

use themeforge_core::{
    is_color, shade_indices, DiscoveredColorMap, MarkerAssignment, VariableMapping, PRIMARY_MARKER,
};

/// Captures `.class { color: value }` pairs in compiled probe output.
static PROBE_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([\w-]+)\s*\{\s*color:\s*([^;}]+?);?\s*\}").unwrap());

const BLACK: &str = "#000000";
const WHITE: &str = "#ffffff";

/// The primary variable gets the reserved sentinel; everything else gets a
/// fresh random color, re-rolled on collision with black, white, the
/// sentinel, or any marker already handed out.
pub fn assign_markers(theme_vars: &[String]) -> MarkerAssignment {
    let mut markers = MarkerAssignment::default();
    let mut used: HashSet<String> = HashSet::new();
    used.insert(PRIMARY_MARKER.to_string());

    for name in theme_vars {
        let color = if name == "@primary-color" {
            PRIMARY_MARKER.to_string()
        } else {
            random_color_avoiding(&used)
        };
        used.insert(color.clone());
        markers.insert(name.clone(), color);
    }
    debug!(count = markers.len(), "assigned marker colors");
    markers
}

/// A random opaque `#rrggbb` not present in `used`, never pure black or
/// pure white. Colors with all three channels nibble-paired are re-rolled
/// too: a CSS printer may shorten those to `#rgb`, which would break exact
/// textual matching later.
pub(crate) fn random_color_avoiding(used: &HashSet<String>) -> String {
    let mut rng = rand::rng();
    loop {
        let (r, g, b) = (
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
        );
        if r % 17 == 0 && g % 17 == 0 && b % 17 == 0 {
            continue;
        }
        let color = format!("#{r:02x}{g:02x}{b:02x}");
        if color != BLACK && color != WHITE && !used.contains(&color) {
            return color;
        }
    }
}

/// Build the probe stylesheet: the variable file verbatim, marker overrides
/// (last definition wins in Less), one probe rule per variable, and shade
/// probes for variables whose shade variants exist in the mapping.
pub fn marker_stylesheet(
    var_file_content: &str,
    markers: &MarkerAssignment,
    mapping: &VariableMapping,
) -> String {
    let mut source = String::from(var_file_content);
    if !source.ends_with('\n') {
        source.push('\n');
    }
    for (name, color) in markers.iter() {
        source.push_str(&format!("{name}: {color};\n"));
    }
    for (name, _) in markers.iter() {
        let class = name.trim_start_matches('@');
        source.push_str(&format!(".{class} {{ color: {name}; }}\n"));
        if let Some(stem) = shade_stem(name, mapping) {
            for index in shade_indices() {
                source.push_str(&format!(
                    ".{stem}-{index} {{ color: colorPalette({name}, {index}); }}\n"
                ));
            }
        }
    }
    source
}

/// A variable has shade variants when it is a `-color` name and the mapping
/// defines the first shade of its stem.
fn shade_stem<'a>(name: &'a str, mapping: &VariableMapping) -> Option<&'a str> {
    let stem = name.trim_start_matches('@').strip_suffix("-color")?;
    mapping.contains(&format!("@{stem}-1")).then_some(stem)
}

/// Scan compiled probe output, keeping pairs whose value classifies as a
/// color. Class names come back re-prefixed with the variable sigil.
pub fn discover(compiled_css: &str, extra: &[Regex]) -> DiscoveredColorMap {
    let mut discovered = DiscoveredColorMap::default();
    for caps in PROBE_RULE.captures_iter(compiled_css) {
        let class = &caps[1];
        let value = caps[2].trim();
        if is_color(value, extra) {
            trace!(class, value, "discovered compiled color");
            discovered.insert(format!("@{class}"), value);
        }
    }
    debug!(count = discovered.len(), "discovery scan complete");
    discovered
}
