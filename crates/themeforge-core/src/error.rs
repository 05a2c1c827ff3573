//! Error types for the core data model.

use thiserror::Error;

/// Errors produced while building the core mappings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A variable alias chain came back to a name it already visited.
    #[error("cyclic variable reference while resolving '{0}'")]
    CyclicVariableReference(String),

    /// A caller-supplied extra color pattern failed to compile.
    #[error("invalid extra color pattern '{pattern}': {source}")]
    InvalidColorPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
