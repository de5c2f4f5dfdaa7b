//! Concrete collaborators for the split analysis in `partsplit-core`.
//!
//! - [`MupdfBackend`]: text runs through MuPDF, page rasters through `pdftoppm`
//! - [`TesseractOcr`]: OCR through the `tesseract` command line tool
//! - [`writer`]: per-instrument PDF files through lopdf
//!
//! This crate is the only one linking mupdf (AGPL-3.0), so analysis code and
//! its tests stay free of it.

mod ocr;
mod raster;
mod text_layer;
pub mod writer;

pub use ocr::TesseractOcr;
pub use text_layer::MupdfBackend;
pub use writer::{WriteError, extract_pages, write_splits};
