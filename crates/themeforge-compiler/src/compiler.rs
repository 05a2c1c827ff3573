//! The `StyleCompiler` seam and its `lessc` subprocess adapter.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::error::CompileError;

/// Interface to the stylesheet-language compiler.
///
/// Implementations take Less source text plus include search paths and
/// return compiled CSS. The pipeline holds this behind `Arc<dyn ...>` so the
/// compiler can be swapped (subprocess in production, in-process fake in
/// tests).
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    async fn compile(&self, source: &str, search_paths: &[PathBuf])
        -> Result<String, CompileError>;
}

/// Compiles by spawning the `lessc` binary, feeding source on stdin.
#[derive(Debug, Clone)]
pub struct LesscCompiler {
    binary: String,
}

impl LesscCompiler {
    pub fn new() -> Self {
        Self::with_binary("lessc")
    }

    /// Use a specific compiler binary (path or name on `$PATH`).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for LesscCompiler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StyleCompiler for LesscCompiler {
    async fn compile(
        &self,
        source: &str,
        search_paths: &[PathBuf],
    ) -> Result<String, CompileError> {
        let mut command = Command::new(&self.binary);
        command.arg("-");
        if !search_paths.is_empty() {
            let separator = if cfg!(windows) { ";" } else { ":" };
            let joined = search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(separator);
            command.arg(format!("--include-path={joined}"));
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(binary = %self.binary, bytes = source.len(), "invoking less compiler");
        let mut child = command.spawn().map_err(|source| CompileError::Spawn {
            command: self.binary.clone(),
            source,
        })?;

        // stdin is always piped above.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(source.as_bytes())
                .await
                .map_err(CompileError::Pipe)?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(CompileError::Pipe)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CompileError::Compiler(stderr));
        }

        let css = String::from_utf8(output.stdout)?;
        trace!(bytes = css.len(), "compile finished");
        Ok(css)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let compiler = LesscCompiler::with_binary("themeforge-no-such-lessc");
        let err = compiler.compile(".a { color: red; }", &[]).await.unwrap_err();
        assert!(matches!(err, CompileError::Spawn { .. }));
    }
}
