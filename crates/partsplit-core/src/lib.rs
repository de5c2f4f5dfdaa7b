use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod analyzer;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod config_file;
pub mod detector;
pub mod naming;
pub mod region;
pub mod text;

pub use analyzer::{
    OcrTrigger, ProgressEvent, SplitAccumulator, Splitter, UNKNOWN_INSTRUMENT,
};
pub use backend::{BackendError, OcrEngine, PageImage, PdfBackend, TextItem};
pub use catalog::{BRASS_BAND, ENSEMBLE_NAMES, InstrumentSet, WIND_BAND, normalize};
pub use config::{ListOverride, OcrMode, SplitterConfig, SplitterConfigBuilder};
pub use detector::detect_instrument;
pub use naming::{sanitize_instrument_name, split_file_name};
pub use region::extract_top_label;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("analysis cancelled before page {page}")]
    Cancelled { page: usize },
    #[error("unknown ensemble: {0}")]
    UnknownEnsemble(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A contiguous run of pages attributed to one instrument.
///
/// `pages` always equals `start_page..=end_page`. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub instrument: String,
    pub start_page: usize,
    pub end_page: usize,
    pub pages: Vec<usize>,
}

impl Split {
    pub(crate) fn new(instrument: impl Into<String>, page: usize) -> Self {
        Self {
            instrument: instrument.into(),
            start_page: page,
            end_page: page,
            pages: vec![page],
        }
    }

    pub(crate) fn extend_to(&mut self, page: usize) {
        self.pages.push(page);
        self.end_page = page;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// `"page 3"` or `"pages 1-3"`.
    pub fn page_range_label(&self) -> String {
        if self.start_page == self.end_page {
            format!("page {}", self.start_page)
        } else {
            format!("pages {}-{}", self.start_page, self.end_page)
        }
    }
}

/// Splits covering every page of one document, in page order.
pub type AnalysisResult = Vec<Split>;

/// Analyze a document with the given instrument set and default configuration.
///
/// Pipeline, per page in ascending order:
/// 1. Take the top label line from the text layer (or OCR, once page 1 shows
///    the text layer is unusable and `ocr` is available)
/// 2. Detect an instrument name in the label
/// 3. Close the open split on a new instrument; extend it otherwise
pub fn analyze(
    backend: &dyn PdfBackend,
    instruments: &InstrumentSet,
    ocr: Option<&dyn OcrEngine>,
) -> Result<AnalysisResult, SplitError> {
    Splitter::new(instruments).analyze(backend, ocr, |_| {})
}
