//! Consumer stylesheet compilation.
//!
//! The consumer's own `.less` files get the discovered theme colors
//! substituted into value position, compile against the base variable file,
//! and are pruned down to their color-bearing rules. One broken file must
//! not block theme generation for the rest, so compiles are
//! failure-isolated per file. Identical pruned output is emitted once.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use themeforge_core::DiscoveredColorMap;
use themeforge_compiler::StyleCompiler;

use crate::error::PipelineError;
use crate::prune::prune;
use crate::subst::substitute_value_position;

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^[ \t]*@import\s+["']([^"']+)["'][ \t]*;[ \t]*\r?\n?"#).unwrap());

/// A discovered consumer stylesheet with its content already read.
#[derive(Debug, Clone)]
pub struct StyleFile {
    pub path: PathBuf,
    pub content: String,
}

/// Glob-discover `**/*.less` under each directory, in deterministic order.
pub fn discover_style_files(dirs: &[PathBuf]) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for dir in dirs {
        let pattern = format!("{}/**/*.less", dir.display());
        let entries = glob::glob(&pattern).map_err(|source| PipelineError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            files.push(entry);
        }
    }
    files.sort();
    files.dedup();
    debug!(count = files.len(), "discovered consumer stylesheets");
    Ok(files)
}

/// Read every discovered file concurrently. A file that fails to read is
/// kept with empty content so sibling files still compile.
pub async fn read_style_files(paths: &[PathBuf]) -> Vec<StyleFile> {
    let reads = paths.iter().map(|path| async move {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => StyleFile {
                path: path.clone(),
                content,
            },
            Err(error) => {
                warn!(path = %path.display(), %error, "failed to read consumer stylesheet");
                StyleFile {
                    path: path.clone(),
                    content: String::new(),
                }
            }
        }
    });
    join_all(reads).await
}

/// Compile, prune, and deduplicate the consumer stylesheets.
///
/// Member imports are stripped (their targets are compiled as top-level
/// files already), discovered colors are substituted for variable uses, the
/// base variable file is prepended as an import, and per-file compile
/// failures are logged and replaced with empty output.
pub async fn compile_custom(
    files: &[StyleFile],
    discovered: &DiscoveredColorMap,
    var_file: &Path,
    search_paths: &[PathBuf],
    compiler: &dyn StyleCompiler,
) -> String {
    let members: HashSet<PathBuf> = files.iter().map(|f| normalize(&f.path)).collect();

    let compiles = files.iter().map(|file| {
        let source = prepare_source(file, &members, discovered, var_file);
        async move {
            match compiler.compile(&source, search_paths).await {
                Ok(css) => css,
                Err(error) => {
                    warn!(path = %file.path.display(), %error, "consumer stylesheet failed to compile");
                    String::new()
                }
            }
        }
    });
    let compiled = join_all(compiles).await;

    let mut seen_hashes = HashSet::new();
    let mut combined = String::new();
    for (file, css) in files.iter().zip(compiled) {
        if css.is_empty() {
            continue;
        }
        let pruned = match prune(&css) {
            Ok(pruned) => pruned,
            Err(error) => {
                warn!(path = %file.path.display(), %error, "failed to prune compiled output");
                continue;
            }
        };
        if pruned.trim().is_empty() {
            continue;
        }
        if !seen_hashes.insert(blake3::hash(pruned.as_bytes())) {
            debug!(path = %file.path.display(), "duplicate pruned output, skipping");
            continue;
        }
        combined.push_str(&pruned);
        if !pruned.ends_with('\n') {
            combined.push('\n');
        }
    }
    combined
}

fn prepare_source(
    file: &StyleFile,
    members: &HashSet<PathBuf>,
    discovered: &DiscoveredColorMap,
    var_file: &Path,
) -> String {
    let parent = file.path.parent().unwrap_or_else(|| Path::new("."));

    // Imports whose target is itself a discovered member would duplicate
    // rules; genuinely external imports stay for the compiler.
    let stripped = IMPORT_LINE.replace_all(&file.content, |caps: &regex::Captures<'_>| {
        let target = &caps[1];
        let mut resolved = parent.join(target);
        if resolved.extension().is_none() {
            resolved.set_extension("less");
        }
        if members.contains(&normalize(&resolved)) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let mut body = stripped.into_owned();
    for (token, color) in discovered.by_token_length() {
        body = substitute_value_position(&body, token, color);
    }
    format!("@import \"{}\";\n{body}", var_file.display())
}

/// Lexical path normalization; enough to compare glob results with joined
/// import targets without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use themeforge_compiler::test_support::{FailingCompiler, FakeLessCompiler};

    fn style_file(path: &str, content: &str) -> StyleFile {
        StyleFile {
            path: PathBuf::from(path),
            content: content.to_string(),
        }
    }

    fn write_var_file(dir: &Path) -> PathBuf {
        let path = dir.join("variables.less");
        std::fs::write(&path, "@primary-color: #1890ff;\n").unwrap();
        path
    }

    #[tokio::test]
    async fn substitutes_discovered_colors_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let var_file = write_var_file(dir.path());
        let mut discovered = DiscoveredColorMap::default();
        discovered.insert("@primary-color", "#123456");

        let files = vec![style_file(
            "/app/styles/a.less",
            ".mine { color: @primary-color; padding: 4px; }\n",
        )];
        let css = compile_custom(&files, &discovered, &var_file, &[], &FakeLessCompiler::new()).await;

        assert!(css.contains("color: #123456"));
        assert!(!css.contains("padding"));
    }

    #[tokio::test]
    async fn member_imports_are_stripped_external_kept() {
        let dir = tempfile::tempdir().unwrap();
        let var_file = write_var_file(dir.path());
        let files = vec![
            style_file("/app/styles/a.less", "@import \"b\";\n@import \"~ext/c\";\n.a { color: #111; }\n"),
            style_file("/app/styles/b.less", ".b { color: #222; }\n"),
        ];
        let css = compile_custom(
            &files,
            &DiscoveredColorMap::default(),
            &var_file,
            &[],
            &FakeLessCompiler::new(),
        )
        .await;

        // .b appears once: from its own top-level compile, not via a's import.
        assert_eq!(css.matches(".b {").count(), 1);
        assert!(css.contains(".a {"));
    }

    #[tokio::test]
    async fn per_file_failure_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let var_file = write_var_file(dir.path());
        let files = vec![style_file("/app/a.less", ".a { color: #111; }\n")];

        let css = compile_custom(
            &files,
            &DiscoveredColorMap::default(),
            &var_file,
            &[],
            &FailingCompiler,
        )
        .await;
        assert_eq!(css, "");
    }

    #[tokio::test]
    async fn identical_pruned_output_is_emitted_once() {
        let dir = tempfile::tempdir().unwrap();
        let var_file = write_var_file(dir.path());
        let files = vec![
            style_file("/app/a.less", ".same { color: #abcdef; }\n"),
            style_file("/app/b.less", ".same { color: #abcdef; }\n"),
            style_file("/app/c.less", ".other { color: #fedcba; }\n"),
        ];
        let css = compile_custom(
            &files,
            &DiscoveredColorMap::default(),
            &var_file,
            &[],
            &FakeLessCompiler::new(),
        )
        .await;

        assert_eq!(css.matches(".same").count(), 1);
        assert!(css.contains(".other"));
    }

    #[test]
    fn discovery_glob_finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("top.less"), ".a {}\n").unwrap();
        std::fs::write(dir.path().join("nested/deep.less"), ".b {}\n").unwrap();
        std::fs::write(dir.path().join("ignored.css"), ".c {}\n").unwrap();

        let files = discover_style_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "less"));
    }
}
