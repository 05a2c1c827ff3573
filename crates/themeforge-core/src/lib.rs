//! Core data model for the themeforge pipeline.
//!
//! This crate holds everything the generation pipeline agrees on but that does
//! not itself touch the filesystem or a compiler:
//! - Variable collection from a Less variable-definitions file, with alias
//!   resolution ([`VariableMapping`])
//! - The single color-classification predicate used by every stage
//!   ([`color::is_color`])
//! - The discovery artifacts produced and consumed across stages
//!   ([`DiscoveredColorMap`], [`MarkerAssignment`], [`FadeMap`])
//! - The caller-facing configuration surface ([`ThemeConfig`])

pub mod color;
pub mod config;
pub mod discovery;
pub mod error;
pub mod variables;

pub use color::is_color;
pub use config::ThemeConfig;
pub use discovery::{
    ramp_expression, shade_base, shade_indices, DiscoveredColorMap, FadeMap, MarkerAssignment,
    PRIMARY_MARKER,
};
pub use error::CoreError;
pub use variables::VariableMapping;
