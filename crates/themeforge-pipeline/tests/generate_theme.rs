//! End-to-end theme generation against a hermetic fixture tree.
//!
//! The fake Less compiler stands in for `lessc`, so these tests exercise
//! the whole pipeline (discovery, custom compilation, assembly, caching)
//! without any external toolchain.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use themeforge_compiler::test_support::FakeLessCompiler;
use themeforge_compiler::{CompileError, StyleCompiler};
use themeforge_core::{ThemeConfig, PRIMARY_MARKER};
use themeforge_pipeline::ThemeGenerator;

/// Counts compiler invocations so cache behavior is observable.
struct CountingCompiler {
    inner: FakeLessCompiler,
    calls: AtomicUsize,
}

impl CountingCompiler {
    fn new() -> Self {
        Self {
            inner: FakeLessCompiler::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl StyleCompiler for CountingCompiler {
    async fn compile(
        &self,
        source: &str,
        search_paths: &[PathBuf],
    ) -> Result<String, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(source, search_paths).await
    }
}

const VARIABLES: &str = "\
@primary-color: #1890ff;
@primary-1: colorPalette(@primary-color, 1);
@primary-2: colorPalette(@primary-color, 2);
@link-color: @primary-color;
@font-size-base: 14px;
";

const INDEX: &str = "\
@import \"variables\";
.btn {
  color: @primary-color;
  background: #ffffff;
  padding: 4px;
}
.btn-light {
  color: @primary-1;
}
.link {
  color: @link-color;
}
.alert {
  border-color: fade(@primary-color, 20%);
}
@media print {
  .btn {
    color: #000000;
  }
}
";

fn fixture() -> (TempDir, ThemeConfig) {
    let dir = TempDir::new().unwrap();
    let styles = dir.path().join("lib/styles");
    let app = dir.path().join("app");
    std::fs::create_dir_all(&styles).unwrap();
    std::fs::create_dir_all(&app).unwrap();

    std::fs::write(styles.join("variables.less"), VARIABLES).unwrap();
    std::fs::write(styles.join("index.less"), INDEX).unwrap();

    std::fs::write(
        app.join("a.less"),
        ".mine { color: @primary-color; margin: 2px; }\n",
    )
    .unwrap();
    std::fs::write(
        app.join("b.less"),
        ".mine { color: @primary-color; margin: 2px; }\n",
    )
    .unwrap();
    std::fs::write(
        app.join("c.less"),
        ".other { background-color: @link-color; }\n",
    )
    .unwrap();

    let mut config = ThemeConfig::new(dir.path().join("lib"));
    config.styles_dirs = vec![app];
    config.theme_variables = vec!["@primary-color".to_string(), "@link-color".to_string()];
    (dir, config)
}

#[tokio::test]
async fn generates_switchable_theme() {
    let (_dir, config) = fixture();
    let generator = ThemeGenerator::new(config, Arc::new(FakeLessCompiler::new()));
    let theme = generator.generate().await;
    assert!(!theme.is_empty());

    // Definitions lead, in reverse-declared order, values resolved.
    assert!(theme.starts_with("@link-color: #1890ff;\n@primary-color: #1890ff;\n"));

    // Library rules re-expressed in variable terms.
    assert!(theme.contains("color: @primary-color;"));
    assert!(theme.contains("colorPalette(@primary-color, 1)"));
    assert!(theme.contains("fade(@primary-color, 20%)"));

    // No marker leaks, no non-color baggage.
    assert!(!theme.contains(PRIMARY_MARKER));
    assert!(!theme.contains("@media"));
    assert!(!theme.contains("padding"));
    assert!(!theme.contains("margin"));

    // Consumer stylesheets: deduplicated and re-substituted.
    assert_eq!(theme.matches(".mine").count(), 1);
    assert!(theme.contains("background-color: @link-color;"));

    // The bundled variable source is appended verbatim at the very end.
    assert!(theme.trim_end().ends_with("@font-size-base: 14px;"));
}

#[tokio::test]
async fn cache_short_circuits_until_consumer_content_changes() {
    let (dir, config) = fixture();
    let compiler = Arc::new(CountingCompiler::new());
    let generator = ThemeGenerator::new(config, compiler.clone());

    let first = generator.generate().await;
    let calls_after_first = compiler.calls.load(Ordering::SeqCst);
    assert!(calls_after_first > 0);

    let second = generator.generate().await;
    assert_eq!(first, second);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), calls_after_first);

    // One changed byte in any consumer file invalidates the cache.
    std::fs::write(
        dir.path().join("app/c.less"),
        ".other { background-color: #405162; }\n",
    )
    .unwrap();
    let third = generator.generate().await;
    assert!(compiler.calls.load(Ordering::SeqCst) > calls_after_first);
    assert!(third.contains("background-color: #405162;"));
    assert!(!third.contains("background-color: @link-color;"));
}

#[tokio::test]
async fn missing_variable_file_fails_soft_to_empty() {
    let dir = TempDir::new().unwrap();
    let config = ThemeConfig::new(dir.path().join("nope"));
    let generator = ThemeGenerator::new(config, Arc::new(FakeLessCompiler::new()));
    assert_eq!(generator.generate().await, "");
}

#[tokio::test]
async fn broken_consumer_file_does_not_block_generation() {
    let (dir, config) = fixture();
    // A file the fake compiler chokes on: its import exists but is not
    // valid UTF-8, so the read inside the compiler fails.
    std::fs::write(dir.path().join("app/garbage.bin"), [0xffu8, 0xfe, 0x00]).unwrap();
    let import = dir.path().join("app/garbage.bin");
    std::fs::write(
        dir.path().join("app/broken.less"),
        format!("@import \"{}\";\n.broken {{ color: @primary-color; }}\n", import.display()),
    )
    .unwrap();
    let generator = ThemeGenerator::new(config, Arc::new(FakeLessCompiler::new()));
    let theme = generator.generate().await;
    assert!(!theme.is_empty());
    assert!(theme.contains(".mine"));
}
