use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to render page: {0}")]
    RenderError(String),
    #[error("OCR failed: {0}")]
    OcrError(String),
    #[error("page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One positioned run of text on a page.
///
/// Coordinates are in page space with the origin at the bottom-left, so `y`
/// grows toward the top of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl TextItem {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// A PNG-encoded raster of a single page.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-based page number the image was rendered from.
    pub page: usize,
    pub png: Vec<u8>,
}

/// Trait for PDF page access.
///
/// Implementors provide text runs and page rasters; label extraction, name
/// detection and split assembly live in [`crate::analyzer::Splitter`].
/// Page numbers are 1-based.
pub trait PdfBackend: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> Result<usize, BackendError>;

    /// Positioned text runs of one page, in any order.
    fn text_items(&self, page: usize) -> Result<Vec<TextItem>, BackendError>;

    /// Render one page at `scale` (1.0 = 72 dpi).
    fn render_page(&self, page: usize, scale: f32) -> Result<PageImage, BackendError>;
}

/// Trait for optical character recognition engines.
pub trait OcrEngine: Send + Sync {
    /// Best-effort full text of the image.
    fn recognize(&self, image: &PageImage) -> Result<String, BackendError>;
}
