use std::path::{Path, PathBuf};

use mupdf::{Document, TextPageFlags};

use partsplit_core::{BackendError, PageImage, PdfBackend, TextItem};

use crate::raster;

/// MuPDF-based implementation of [`PdfBackend`].
///
/// The document is reopened for every call since MuPDF handles are not
/// `Send`; the page count is read once in [`open`](Self::open). Rasters come
/// from `pdftoppm`.
pub struct MupdfBackend {
    path: PathBuf,
    page_count: usize,
    pdftoppm: PathBuf,
}

impl MupdfBackend {
    /// Open `path` and read its page count.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let path = path.into();
        let document = open_document(&path)?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;
        Ok(Self {
            path,
            page_count: page_count.max(0) as usize,
            pdftoppm: PathBuf::from("pdftoppm"),
        })
    }

    /// Use a specific `pdftoppm` binary for rendering.
    pub fn with_pdftoppm(mut self, binary: impl Into<PathBuf>) -> Self {
        self.pdftoppm = binary.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_page(&self, page: usize) -> Result<(), BackendError> {
        if page == 0 || page > self.page_count {
            return Err(BackendError::PageOutOfRange {
                page,
                total: self.page_count,
            });
        }
        Ok(())
    }
}

fn open_document(path: &Path) -> Result<Document, BackendError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;
    Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))
}

impl PdfBackend for MupdfBackend {
    fn page_count(&self) -> Result<usize, BackendError> {
        Ok(self.page_count)
    }

    fn text_items(&self, page: usize) -> Result<Vec<TextItem>, BackendError> {
        self.check_page(page)?;
        let document = open_document(&self.path)?;
        let pdf_page = document
            .load_page((page - 1) as i32)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let page_bounds = pdf_page
            .bounds()
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = pdf_page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let mut items = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                let bounds = line.bounds();
                // MuPDF measures y downward from the top edge
                let y = page_bounds.y1 - bounds.y1;
                items.extend(
                    word_runs(&text, bounds.x0, bounds.x1)
                        .into_iter()
                        .map(|(word, x)| TextItem::new(word, x, y)),
                );
            }
        }

        tracing::trace!(page, runs = items.len(), "text layer read");
        Ok(items)
    }

    fn render_page(&self, page: usize, scale: f32) -> Result<PageImage, BackendError> {
        self.check_page(page)?;
        let png = raster::render_with(&self.pdftoppm, &self.path, page, scale)?;
        Ok(PageImage { page, png })
    }
}

/// Split a line into whitespace-separated runs, placing each run by its
/// character offset between the line's left and right edges.
fn word_runs(text: &str, x0: f32, x1: f32) -> Vec<(String, f32)> {
    let total = text.chars().count();
    if total == 0 {
        return Vec::new();
    }
    let advance = (x1 - x0) / total as f32;

    let mut runs = Vec::new();
    let mut current = String::new();
    let mut start = 0;
    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                runs.push((std::mem::take(&mut current), x0 + advance * start as f32));
            }
        } else {
            if current.is_empty() {
                start = idx;
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        runs.push((current, x0 + advance * start as f32));
    }
    runs
}
