//! On-device text recognition — turns image bytes into the prompt text that
//! gets forwarded to a model.
//!
//! The LLM layer only ever sees the recognized string. The default recognizer
//! shells out to the `tesseract` binary, piping the image through stdin.

use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Trait for OCR engines.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in an encoded image (PNG, JPEG, …).
    ///
    /// Returns the trimmed text, or an empty string when there is nothing to read.
    async fn recognize_text(&self, image: &[u8]) -> anyhow::Result<String>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

// ─────────────────────────────────────────────
// Tesseract
// ─────────────────────────────────────────────

/// Runs `tesseract stdin stdout -l <lang>`.
#[derive(Clone, Debug)]
pub struct TesseractRecognizer {
    binary: String,
    language: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".into(),
            language: "eng".into(),
        }
    }

    /// Use a different executable (full path or name on `PATH`).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Tesseract language pack(s), e.g. `"eng+fra"`.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize_text(&self, image: &[u8]) -> anyhow::Result<String> {
        if image.is_empty() {
            warn!("ocr: empty image, skipping");
            return Ok(String::new());
        }

        debug!(
            binary = %self.binary,
            language = %self.language,
            bytes = image.len(),
            "running OCR"
        );

        let mut child = tokio::process::Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start '{}'", self.binary))?;

        let mut stdin = child
            .stdin
            .take()
            .context("tesseract stdin was not captured")?;
        stdin
            .write_all(image)
            .await
            .context("failed to write image to tesseract")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("failed to read tesseract output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = %output.status, stderr = %stderr.trim(), "tesseract failed");
            bail!("tesseract exited with {}: {}", output.status, stderr.trim());
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = text.chars().count(), "OCR complete");
        Ok(text)
    }

    fn display_name(&self) -> &str {
        "Tesseract"
    }
}

// ─────────────────────────────────────────────
// Helper
// ─────────────────────────────────────────────

/// Check if a file path looks like an image tesseract can read.
pub fn is_image_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".webp", ".bmp", ".tif", ".tiff", ".pnm"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}
