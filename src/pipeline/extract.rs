//! Text extraction from corpus documents, including OCR for images.
//!
//! Plain-text and markdown files are read directly; image files are routed
//! through a pluggable [`OcrEngine`]. OCR failures are logged and collapse to
//! empty text so one unreadable scan never aborts an ingestion pass.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];
const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

/// Errors raised while running optical character recognition.
#[derive(Debug, Error)]
pub enum OcrError {
    /// OCR binary could not be spawned.
    #[error("failed to launch OCR command: {0}")]
    Spawn(#[from] std::io::Error),
    /// OCR process exited with a failure status.
    #[error("OCR command failed ({status}): {stderr}")]
    Command {
        /// Exit status reported by the process.
        status: std::process::ExitStatus,
        /// Captured standard error output.
        stderr: String,
    },
}

/// Interface implemented by OCR backends.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text content of an image file.
    async fn recognize(&self, image: &Path) -> Result<String, OcrError>;
}

/// OCR engine shelling out to the `tesseract` command-line tool.
pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    /// Use a specific tesseract binary instead of the one on `PATH`.
    pub fn with_binary(binary: String) -> Self {
        Self { binary }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image: &Path) -> Result<String, OcrError> {
        let output = Command::new(&self.binary)
            .arg(image)
            .arg("stdout")
            .output()
            .await?;

        if !output.status.success() {
            return Err(OcrError::Command {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Extract the text content of a corpus document.
///
/// Returns `None` for file types the ingestor does not understand. Read and
/// OCR failures degrade to empty text, which callers treat as a skippable
/// document.
pub async fn extract_document_text(path: &Path, ocr: &dyn OcrEngine) -> Option<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())?;

    if TEXT_EXTENSIONS.contains(&extension.as_str()) {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Failed to read document");
                Some(String::new())
            }
        }
    } else if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        match ocr.recognize(path).await {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "OCR failed; treating image as empty");
                Some(String::new())
            }
        }
    } else {
        None
    }
}
