//! Theme assembly orchestration.
//!
//! Linear pipeline with one cache short-circuit:
//! check cache → collect variables → assign markers → compile marked base →
//! discover colors → compile custom → load target → substitute (with fade
//! sentinels) → compile target → merge and prune → reverse substitute →
//! append base definitions → minify.
//!
//! The public entry point never raises: any failure is logged and becomes
//! an empty string, and the previous cache entry stays valid for the next
//! call.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use themeforge_compiler::{bundle, StyleCompiler};
use themeforge_core::{
    ramp_expression, shade_base, FadeMap, ThemeConfig, VariableMapping,
};

use crate::custom::{compile_custom, discover_style_files, read_style_files};
use crate::error::PipelineError;
use crate::markers::{assign_markers, discover, marker_stylesheet, random_color_avoiding};
use crate::minify::minify;
use crate::prune::prune;
use crate::subst::substitute_value_position;

/// Cache of the last generation, keyed by the content hash of the
/// concatenated consumer stylesheets. Owned by the generator and guarded by
/// a mutex, so overlapping calls on one generator serialize instead of
/// racing.
#[derive(Debug, Default)]
pub struct GenerationCache {
    hash: Option<blake3::Hash>,
    output: Option<String>,
}

impl GenerationCache {
    fn lookup(&self, hash: &blake3::Hash) -> Option<&str> {
        if self.hash.as_ref() == Some(hash) {
            self.output.as_deref()
        } else {
            None
        }
    }

    fn store(&mut self, hash: blake3::Hash, output: String) {
        self.hash = Some(hash);
        self.output = Some(output);
    }
}

/// The theme assembler: ties collection, discovery, custom compilation and
/// target compilation together into one switchable-theme stylesheet.
pub struct ThemeGenerator {
    config: ThemeConfig,
    compiler: Arc<dyn StyleCompiler>,
    cache: Mutex<GenerationCache>,
}

impl ThemeGenerator {
    pub fn new(config: ThemeConfig, compiler: Arc<dyn StyleCompiler>) -> Self {
        Self {
            config,
            compiler,
            cache: Mutex::new(GenerationCache::default()),
        }
    }

    /// Generate the switchable-theme stylesheet.
    ///
    /// Never fails: an error anywhere in the run is logged and an empty
    /// string is returned. A build step writing the result to disk should
    /// treat an empty result as build-breaking.
    pub async fn generate(&self) -> String {
        match self.try_generate().await {
            Ok(theme) => theme,
            Err(err) => {
                error!(error = ?err, "theme generation failed");
                String::new()
            }
        }
    }

    /// The fallible pipeline behind [`generate`](Self::generate).
    pub async fn try_generate(&self) -> Result<String> {
        let mut cache = self.cache.lock().await;

        let styles_dir = self.config.styles_dir();
        let var_file_path = self.config.var_file();
        let search_paths = vec![styles_dir];

        // CHECK_CACHE: hash the concatenated consumer stylesheet contents.
        let paths = discover_style_files(&self.config.styles_dirs)?;
        let style_files = read_style_files(&paths).await;
        let mut hasher = blake3::Hasher::new();
        for file in &style_files {
            hasher.update(file.content.as_bytes());
        }
        let content_hash = hasher.finalize();
        if let Some(cached) = cache.lookup(&content_hash) {
            info!("consumer stylesheets unchanged, returning cached theme");
            return Ok(cached.to_string());
        }

        // COLLECT_VARIABLES: required read, fatal on failure.
        let extra = self.config.compiled_extra_patterns()?;
        let var_content = tokio::fs::read_to_string(&var_file_path)
            .await
            .map_err(|source| PipelineError::Read {
                path: var_file_path.clone(),
                source,
            })
            .context("reading variable-definitions file")?;
        let mapping = VariableMapping::collect(&var_content, &extra)?;

        let theme_vars: Vec<String> = self
            .config
            .theme_variables
            .iter()
            .filter(|name| mapping.contains(name) && !is_shade_indexed(name))
            .cloned()
            .collect();
        debug!(count = theme_vars.len(), "theme variables selected");

        // ASSIGN_MARKERS → COMPILE_MARKED_BASE → DISCOVER_COLORS. The
        // marker batch is failure-isolated like any other compile batch.
        let markers = assign_markers(&theme_vars);
        let marker_source = marker_stylesheet(&var_content, &markers, &mapping);
        let marker_css = match self.compiler.compile(&marker_source, &search_paths).await {
            Ok(css) => css,
            Err(err) => {
                warn!(error = %err, "marker batch failed to compile");
                String::new()
            }
        };
        let discovered = discover(&marker_css, &extra);

        // COMPILE_CUSTOM
        let custom_css = compile_custom(
            &style_files,
            &discovered,
            &var_file_path,
            &search_paths,
            self.compiler.as_ref(),
        )
        .await;

        // LOAD_TARGET_STYLESHEET: required read, fatal on failure.
        let main_path = self.config.main_stylesheet();
        let mut target = bundle(&main_path).context("bundling target stylesheet")?;

        // SUBSTITUTE_AND_HANDLE_DYNAMIC_COLORS: the compiler cannot evaluate
        // fade() over variables that hold marker values worth preserving, so
        // each call is parked behind a random sentinel and restored after.
        let mut used: HashSet<String> = discovered.iter().map(|(_, c)| c.to_string()).collect();
        let mut fades = FadeMap::default();
        for call in extract_fade_calls(&target) {
            let sentinel = random_color_avoiding(&used);
            used.insert(sentinel.clone());
            target = target.replace(&call, &sentinel);
            fades.insert(call, sentinel);
        }
        for (token, color) in discovered.by_token_length() {
            target = substitute_value_position(&target, token, color);
        }

        // COMPILE_TARGET
        let target_css = self
            .compiler
            .compile(&target, &search_paths)
            .await
            .context("compiling target stylesheet")?;

        // MERGE_AND_PRUNE
        let merged = format!("{target_css}\n{custom_css}");
        let mut css = prune(&merged)?;

        // REVERSE_SUBSTITUTE: sentinels back to fade() syntax first, then
        // every discovered literal back to its variable token (shade tokens
        // to their ramp-expression form).
        for (call, sentinel) in fades.iter() {
            css = css.replace(sentinel, call);
        }
        for (token, color) in discovered.by_color_length() {
            let replacement = match shade_base(token) {
                Some((base, index)) if theme_vars.contains(&base) => {
                    ramp_expression(&base, index)
                }
                _ => token.to_string(),
            };
            css = replace_color(&css, color, &replacement);
        }

        // APPEND_BASE_DEFINITIONS + MINIFY: definitions precede their use
        // for any downstream top-to-bottom textual substitution; the bundled
        // variable source is appended verbatim so ramp functions stay
        // resolvable at switch time.
        let mut names: HashSet<&str> = theme_vars.iter().map(String::as_str).collect();
        for (token, _) in discovered.iter() {
            names.insert(token);
        }
        let css = strip_variable_definitions(&css, &names);
        let body = minify(&css);

        let mut head = String::new();
        for name in theme_vars.iter().rev() {
            if let Some(value) = mapping.get(name) {
                head.push_str(name);
                head.push_str(": ");
                head.push_str(value);
                head.push_str(";\n");
            }
        }
        let tail = bundle(&var_file_path).context("bundling variable-definitions file")?;
        let theme = format!("{head}{body}\n{tail}");

        cache.store(content_hash, theme.clone());
        info!(bytes = theme.len(), "theme generated");
        Ok(theme)
    }
}

/// A trailing all-digit segment marks a shade-indexed name.
fn is_shade_indexed(name: &str) -> bool {
    name.rsplit_once('-')
        .map(|(_, suffix)| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Extract distinct `fade(...)` calls whose first argument is a variable
/// reference. Calls over literals or the black/white variables compile to
/// stable output on their own and are left alone.
fn extract_fade_calls(source: &str) -> Vec<String> {
    let mut calls = Vec::new();
    let bytes = source.as_bytes();
    let mut from = 0;
    while let Some(offset) = source[from..].find("fade(") {
        let start = from + offset;
        from = start + 5;
        // Reject identifier tails like "myfade(".
        if start > 0 {
            let prev = bytes[start - 1];
            if prev.is_ascii_alphanumeric() || prev == b'-' || prev == b'_' {
                continue;
            }
        }
        let Some(end) = matching_paren(source, start + 4) else {
            continue;
        };
        let call = &source[start..=end];
        let args = &source[start + 5..end];
        let first = args.split(',').next().unwrap_or("").trim();
        if !first.starts_with('@') || first == "@black" || first == "@white" {
            continue;
        }
        if !calls.iter().any(|c| c == call) {
            calls.push(call.to_string());
        }
        from = end + 1;
    }
    calls
}

/// Replace a discovered color literal, also covering the `#rgb` short form
/// a CSS printer may have collapsed a nibble-paired `#rrggbb` into.
fn replace_color(css: &str, color: &str, replacement: &str) -> String {
    let css = css.replace(color, replacement);
    let Some(short) = hex_short_form(color) else {
        return css;
    };
    // The short form may only match where no further hex digit follows,
    // otherwise `#abc` would corrupt an unrelated `#abcdef`.
    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    for (start, _) in css.match_indices(&short) {
        if start < last {
            continue;
        }
        let end = start + short.len();
        if css[end..]
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_hexdigit())
        {
            continue;
        }
        out.push_str(&css[last..start]);
        out.push_str(replacement);
        last = end;
    }
    out.push_str(&css[last..]);
    out
}

fn hex_short_form(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let bytes = hex.as_bytes();
    let paired = bytes[0].eq_ignore_ascii_case(&bytes[1])
        && bytes[2].eq_ignore_ascii_case(&bytes[3])
        && bytes[4].eq_ignore_ascii_case(&bytes[5]);
    paired.then(|| {
        format!(
            "#{}{}{}",
            hex[0..1].to_ascii_lowercase(),
            hex[2..3].to_ascii_lowercase(),
            hex[4..5].to_ascii_lowercase()
        )
    })
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in source.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop bare `@name: value;` lines for the given names.
fn strip_variable_definitions(css: &str, names: &HashSet<&str>) -> String {
    css.lines()
        .filter(|line| {
            line.trim()
                .split_once(':')
                .map(|(name, _)| !names.contains(name.trim()))
                .unwrap_or(true)
        })
        .map(|line| format!("{line}\n"))
        .collect()
}
