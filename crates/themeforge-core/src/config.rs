//! Caller-facing configuration surface.
//!
//! Config loading (files, CLI) belongs to the host build tool; this is the
//! plain options object it hands us.

use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Options for one theme generation target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Install root of the component library whose theme is being extracted.
    pub library_dir: PathBuf,

    /// Directory holding the library's Less sources. Derived from
    /// `library_dir` when absent.
    #[serde(default)]
    pub library_styles_dir: Option<PathBuf>,

    /// Directories holding the consumer's own stylesheets, discovered as
    /// `**/*.less`.
    #[serde(default)]
    pub styles_dirs: Vec<PathBuf>,

    /// Variable-definitions file. Defaults to the library's own default
    /// theme variables.
    #[serde(default)]
    pub var_file: Option<PathBuf>,

    /// The library's distributable entry stylesheet. Defaults to the style
    /// directory's index file.
    #[serde(default)]
    pub main_stylesheet: Option<PathBuf>,

    /// Ordered variable names selected for runtime switchability.
    #[serde(default = "default_theme_variables")]
    pub theme_variables: Vec<String>,

    /// Additional patterns accepted by the color classifier.
    #[serde(default)]
    pub extra_color_patterns: Vec<String>,
}

fn default_theme_variables() -> Vec<String> {
    vec!["@primary-color".to_string()]
}

impl ThemeConfig {
    pub fn new(library_dir: impl Into<PathBuf>) -> Self {
        Self {
            library_dir: library_dir.into(),
            library_styles_dir: None,
            styles_dirs: Vec::new(),
            var_file: None,
            main_stylesheet: None,
            theme_variables: default_theme_variables(),
            extra_color_patterns: Vec::new(),
        }
    }

    /// Style source directory, derived when not overridden.
    pub fn styles_dir(&self) -> PathBuf {
        self.library_styles_dir
            .clone()
            .unwrap_or_else(|| self.library_dir.join("styles"))
    }

    /// Variable-definitions file, derived when not overridden.
    pub fn var_file(&self) -> PathBuf {
        self.var_file
            .clone()
            .unwrap_or_else(|| self.styles_dir().join("variables.less"))
    }

    /// Distributable entry stylesheet, derived when not overridden.
    pub fn main_stylesheet(&self) -> PathBuf {
        self.main_stylesheet
            .clone()
            .unwrap_or_else(|| self.styles_dir().join("index.less"))
    }

    /// Compile the extra color patterns, rejecting invalid ones up front so
    /// classification never fails mid-pipeline.
    pub fn compiled_extra_patterns(&self) -> Result<Vec<Regex>, CoreError> {
        self.extra_color_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| CoreError::InvalidColorPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_paths_from_library_dir() {
        let config = ThemeConfig::new("/opt/lib");
        assert_eq!(config.styles_dir(), PathBuf::from("/opt/lib/styles"));
        assert_eq!(
            config.var_file(),
            PathBuf::from("/opt/lib/styles/variables.less")
        );
        assert_eq!(
            config.main_stylesheet(),
            PathBuf::from("/opt/lib/styles/index.less")
        );
        assert_eq!(config.theme_variables, vec!["@primary-color".to_string()]);
    }

    #[test]
    fn overrides_win_over_derivation() {
        let mut config = ThemeConfig::new("/opt/lib");
        config.library_styles_dir = Some(PathBuf::from("/elsewhere"));
        config.var_file = Some(PathBuf::from("/elsewhere/theme.less"));
        assert_eq!(config.styles_dir(), PathBuf::from("/elsewhere"));
        assert_eq!(config.var_file(), PathBuf::from("/elsewhere/theme.less"));
    }

    #[test]
    fn invalid_extra_pattern_is_rejected() {
        let mut config = ThemeConfig::new("/opt/lib");
        config.extra_color_patterns = vec!["(".to_string()];
        assert!(config.compiled_extra_patterns().is_err());
    }
}
