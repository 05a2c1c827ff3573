//! Textual `@import` inlining.
//!
//! Splices relative import chains into one source text so the assembler can
//! treat the library's distributable stylesheet (and the appended
//! base-definitions block) as a single document. Package-prefixed (`~`) and
//! unresolvable imports are left for the real compiler.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::CompileError;

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*@import\s+(?:\([^)]*\)\s*)?["']([^"']+)["'][ \t]*;"#).unwrap()
});

/// Inline the relative `@import` chain rooted at `path` into one string.
/// Each file is inlined at most once; a revisited import is dropped.
pub fn bundle(path: &Path) -> Result<String, CompileError> {
    let mut visited = HashSet::new();
    let content = bundle_file(path, &mut visited)?;
    debug!(root = %path.display(), files = visited.len(), "bundled import chain");
    Ok(content)
}

fn bundle_file(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<String, CompileError> {
    let content = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    visited.insert(path.to_path_buf());
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for caps in IMPORT.captures_iter(&content) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&content[last..whole.start()]);
        last = whole.end();

        let target = &caps[1];
        match resolve_import(parent, target) {
            Some(resolved) if visited.contains(&resolved) => {
                trace!(import = target, "already inlined, dropping");
            }
            Some(resolved) => {
                out.push_str(&bundle_file(&resolved, visited)?);
            }
            None => {
                // External or missing: keep the statement for the compiler.
                out.push_str(whole.as_str());
            }
        }
    }
    out.push_str(&content[last..]);
    Ok(out)
}

/// Resolve a relative import target. `~`-prefixed package imports and
/// targets that do not exist on disk stay unresolved.
fn resolve_import(parent: &Path, target: &str) -> Option<PathBuf> {
    if target.starts_with('~') {
        return None;
    }
    let mut candidate = parent.join(target);
    if candidate.extension().is_none() {
        candidate.set_extension("less");
    }
    candidate.exists().then_some(candidate)
}
