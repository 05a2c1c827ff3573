//! Pipeline-stage errors.
//!
//! Only required-file failures and CSS parse/print failures surface here;
//! per-file compile failures are isolated where they happen and never
//! become errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSS transform failed: {0}")]
    Css(String),

    #[error("invalid glob pattern '{pattern}'")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}
