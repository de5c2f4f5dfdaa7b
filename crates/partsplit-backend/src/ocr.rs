use std::path::PathBuf;
use std::process::Command;

use partsplit_core::{BackendError, OcrEngine, PageImage};

/// [`OcrEngine`] backed by the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
    /// Tesseract page segmentation mode.
    psm: u8,
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("eng")
    }
}

impl TesseractOcr {
    /// `language` is a Tesseract language code, e.g. `eng` or `eng+deu`.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: language.into(),
            psm: 3,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_psm(mut self, psm: u8) -> Self {
        self.psm = psm;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether the configured binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &PageImage) -> Result<String, BackendError> {
        let dir = tempfile::tempdir()?;
        let img_path = dir.path().join(format!("page-{}.png", image.page));
        std::fs::write(&img_path, &image.png)?;

        let out = Command::new(&self.binary)
            .arg(&img_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .map_err(|e| {
                BackendError::OcrError(format!("failed to run {}: {}", self.binary.display(), e))
            })?;
        if !out.status.success() {
            return Err(BackendError::OcrError(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&out.stdout).into_owned();
        tracing::debug!(page = image.page, chars = text.chars().count(), "page recognized");
        Ok(text)
    }
}
