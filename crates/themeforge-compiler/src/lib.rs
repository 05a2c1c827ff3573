//! Stylesheet-compiler boundary.
//!
//! The Less compiler is an external collaborator: the pipeline only ever
//! sees the [`StyleCompiler`] trait (source text + search paths → compiled
//! CSS or failure). [`LesscCompiler`] adapts the `lessc` binary;
//! [`test_support`] provides a deterministic in-process evaluator so the
//! pipeline's behavior is testable without a toolchain.
//!
//! [`bundle`] is the textual `@import`-inlining helper used for the
//! library's distributable stylesheet and the appended base-definitions
//! block.

pub mod bundle;
pub mod compiler;
pub mod error;
pub mod test_support;

pub use bundle::bundle;
pub use compiler::{LesscCompiler, StyleCompiler};
pub use error::CompileError;
