//! Deterministic in-process stand-ins for the real compiler.
//!
//! [`FakeLessCompiler`] evaluates the Less subset the pipeline actually
//! exercises: `@import` resolution against search paths, `@name: value;`
//! definitions (last wins), variable substitution in rule bodies, and the
//! `colorPalette(...)` / `fade(...)` color functions with a fixed ramp.
//! Enough to run the whole generation pipeline hermetically in tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::compiler::StyleCompiler;
use crate::error::CompileError;

static IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*@import\s+["']([^"']+)["']\s*;\s*$"#).unwrap());
static PALETTE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"colorPalette\(\s*(#[0-9a-fA-F]{3,8})\s*,\s*(\d+)\s*\)").unwrap());
static FADE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fade\(\s*(#[0-9a-fA-F]{3,8})\s*,\s*([\d.]+)%\s*\)").unwrap());

/// Minimal Less evaluator.
#[derive(Debug, Default, Clone)]
pub struct FakeLessCompiler;

impl FakeLessCompiler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StyleCompiler for FakeLessCompiler {
    async fn compile(
        &self,
        source: &str,
        search_paths: &[PathBuf],
    ) -> Result<String, CompileError> {
        let mut visited = HashSet::new();
        let inlined = inline_imports(source, search_paths, &mut visited)?;

        // Collect definitions, last one wins, and drop them from the output.
        let mut names: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        let mut body = String::new();
        for line in inlined.lines() {
            let trimmed = line.trim();
            if let Some((name, value)) = parse_definition(trimmed) {
                match names.iter().position(|n| *n == name) {
                    Some(i) => values[i] = value,
                    None => {
                        names.push(name);
                        values.push(value);
                    }
                }
            } else if trimmed.starts_with("//") {
                continue;
            } else {
                body.push_str(line);
                body.push('\n');
            }
        }

        // Resolve references inside definitions, longest name first.
        let order = substitution_order(&names);
        for _ in 0..8 {
            let mut changed = false;
            for i in 0..values.len() {
                let mut value = values[i].clone();
                for &j in &order {
                    if i != j && value.contains(&names[j]) {
                        value = value.replace(&names[j], &values[j]);
                    }
                }
                value = evaluate_color_functions(&value);
                if value != values[i] {
                    values[i] = value;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Substitute into the rule bodies and evaluate what remains.
        for &j in &order {
            body = body.replace(&names[j], &values[j]);
        }
        body = evaluate_color_functions(&body);

        let css: String = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("{line}\n"))
            .collect();
        Ok(css)
    }
}

/// A compiler that always fails; for failure-isolation tests.
#[derive(Debug, Default, Clone)]
pub struct FailingCompiler;

#[async_trait]
impl StyleCompiler for FailingCompiler {
    async fn compile(&self, _: &str, _: &[PathBuf]) -> Result<String, CompileError> {
        Err(CompileError::Compiler("synthetic failure".to_string()))
    }
}

fn inline_imports(
    source: &str,
    search_paths: &[PathBuf],
    visited: &mut HashSet<PathBuf>,
) -> Result<String, CompileError> {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        if let Some(caps) = IMPORT_LINE.captures(line) {
            if let Some(path) = resolve(&caps[1], search_paths) {
                if visited.insert(path.clone()) {
                    let content =
                        std::fs::read_to_string(&path).map_err(|source| CompileError::Io {
                            path: path.clone(),
                            source,
                        })?;
                    out.push_str(&inline_imports(&content, search_paths, visited)?);
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    Ok(out)
}

fn resolve(target: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    let direct = PathBuf::from(target);
    if direct.is_absolute() {
        candidates.push(direct);
    } else {
        candidates.extend(search_paths.iter().map(|p| p.join(target)));
    }
    for mut candidate in candidates {
        if candidate.extension().is_none() {
            candidate.set_extension("less");
        }
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

fn parse_definition(line: &str) -> Option<(String, String)> {
    if !line.starts_with('@') || line.starts_with("@import") || line.starts_with("@media") {
        return None;
    }
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    if name.len() < 2
        || !name[1..]
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return None;
    }
    let value = rest.trim().trim_end_matches(';').trim();
    Some((name.to_string(), value.to_string()))
}

fn substitution_order(names: &[String]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..names.len()).collect();
    order.sort_by(|&a, &b| names[b].len().cmp(&names[a].len()));
    order
}

fn evaluate_color_functions(text: &str) -> String {
    let text = PALETTE_CALL.replace_all(text, |caps: &regex::Captures<'_>| {
        let index: u8 = caps[2].parse().unwrap_or(6);
        ramp(&caps[1], index)
    });
    FADE_CALL
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            let (r, g, b) = parse_hex(&caps[1]);
            let percent: f64 = caps[2].parse().unwrap_or(100.0);
            format!("rgba({r}, {g}, {b}, {})", percent / 100.0)
        })
        .into_owned()
}

/// Fixed tint/shade ramp: indices below 6 mix toward white, above 6 toward
/// black, 6 is the base color. Deterministic and injective for non-gray
/// inputs, which is all the discovery scan needs.
fn ramp(hex: &str, index: u8) -> String {
    let (r, g, b) = parse_hex(hex);
    let mix = |channel: u8, toward: f64, amount: f64| -> u8 {
        let value = f64::from(channel) + (toward - f64::from(channel)) * amount;
        value.round().clamp(0.0, 255.0) as u8
    };
    let (toward, amount) = if index < 6 {
        (255.0, f64::from(6 - index) * 0.15)
    } else if index > 6 {
        (0.0, f64::from(index - 6) * 0.15)
    } else {
        return format!("#{r:02x}{g:02x}{b:02x}");
    };
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(r, toward, amount),
        mix(g, toward, amount),
        mix(b, toward, amount)
    )
}

fn parse_hex(hex: &str) -> (u8, u8, u8) {
    let digits = hex.trim_start_matches('#');
    let expand = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
    match digits.len() {
        3 | 4 => (
            expand(&digits[0..1]) * 17,
            expand(&digits[1..2]) * 17,
            expand(&digits[2..3]) * 17,
        ),
        _ => (
            expand(&digits[0..2]),
            expand(&digits[2..4]),
            expand(&digits[4..6]),
        ),
    }
}
