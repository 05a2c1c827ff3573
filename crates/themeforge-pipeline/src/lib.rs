//! Theme Extraction Pipeline
//!
//! Generates a single switchable-theme stylesheet for a Less-based component
//! library by compiling it twice: once for real, once with synthetic marker
//! colors substituted for the theme variables, then diffing what the
//! compiler produced to learn which declarations each variable controls.
//!
//! ## Pipeline Architecture
//!
//! 1. **Collect**: parse the variable-definitions file into a name→value
//!    mapping with aliases resolved (`themeforge-core`)
//! 2. **Mark**: assign collision-avoided marker colors and compile probe
//!    rules to discover each variable's compiled occurrences ([`markers`])
//! 3. **Prune**: strip everything non-color-bearing from compiled output
//!    ([`prune`])
//! 4. **Custom**: compile the consumer's own stylesheets with discovered
//!    colors substituted in, failure-isolated per file ([`custom`])
//! 5. **Assemble**: compile the library's distributable stylesheet with
//!    markers and fade sentinels, merge, re-substitute variable names for
//!    every discovered literal, and minify ([`assemble`])
//!
//! The orchestrator never panics out of its public entry point: any failure
//! is logged and becomes an empty string, leaving the cache untouched.

pub mod assemble;
pub mod custom;
pub mod error;
pub mod markers;
pub mod minify;
pub mod prune;
mod subst;

pub use assemble::{GenerationCache, ThemeGenerator};
pub use custom::{compile_custom, discover_style_files, read_style_files, StyleFile};
pub use error::PipelineError;
pub use markers::{assign_markers, discover, marker_stylesheet};
pub use minify::minify;
pub use prune::prune;

pub use themeforge_core::ThemeConfig;
