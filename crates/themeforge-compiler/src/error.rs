//! Compiler-boundary errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn compiler '{command}'")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler I/O failure")]
    Pipe(#[source] std::io::Error),

    #[error("compiler reported an error: {0}")]
    Compiler(String),

    #[error("compiler produced non-UTF-8 output")]
    Utf8(#[from] std::string::FromUtf8Error),
}
