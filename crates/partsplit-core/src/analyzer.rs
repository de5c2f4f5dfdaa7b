use tokio_util::sync::CancellationToken;

use crate::backend::{OcrEngine, PdfBackend, TextItem};
use crate::catalog::InstrumentSet;
use crate::config::{OcrMode, SplitterConfig};
use crate::{AnalysisResult, Split, SplitError, detector, region};

/// Instrument name used for leading pages with no detected instrument.
pub const UNKNOWN_INSTRUMENT: &str = "Unknown";

/// Why a run switched from the text layer to OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrTrigger {
    /// Configured with [`OcrMode::Always`].
    Forced,
    /// Page 1 produced a label but no instrument.
    NoDetection,
    /// Page 1 produced (almost) no label text.
    ShortLabel,
}

/// Progress events emitted during analysis.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    OcrModeEnabled {
        trigger: OcrTrigger,
    },
    Page {
        current: usize,
        total: usize,
        ocr_active: bool,
        detected: Option<String>,
    },
    SplitClosed {
        index: usize,
        split: Split,
    },
}

/// Page-by-page split assembly.
///
/// Feed pages in ascending order with [`push`](Self::push); a detection that
/// differs from the current instrument closes the open split and starts a new
/// one, while repeats and pages without a detection extend the open split.
#[derive(Debug, Default)]
pub struct SplitAccumulator {
    current_instrument: Option<String>,
    current: Option<Split>,
    closed: Vec<Split>,
}

impl SplitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the detection for `page`. Returns the split closed by this page, if any.
    pub fn push(&mut self, page: usize, detected: Option<String>) -> Option<&Split> {
        match detected {
            Some(name) if self.current_instrument.as_deref() != Some(name.as_str()) => {
                let closed = self.current.take().map(|mut split| {
                    split.end_page = page - 1;
                    self.closed.push(split);
                });
                self.current = Some(Split::new(name.clone(), page));
                self.current_instrument = Some(name);
                closed.and_then(|_| self.closed.last())
            }
            Some(_) => {
                if let Some(split) = self.current.as_mut() {
                    split.extend_to(page);
                }
                None
            }
            None => {
                match self.current.as_mut() {
                    Some(split) => split.extend_to(page),
                    None => {
                        self.current = Some(Split::new(UNKNOWN_INSTRUMENT, page));
                        self.current_instrument = Some(UNKNOWN_INSTRUMENT.to_string());
                    }
                }
                None
            }
        }
    }

    /// Close the open split, if any, and return all splits in page order.
    pub fn finish(mut self) -> AnalysisResult {
        if let Some(split) = self.current.take() {
            self.closed.push(split);
        }
        self.closed
    }

    /// Number of splits closed so far.
    pub fn closed_len(&self) -> usize {
        self.closed.len()
    }
}

/// A configurable split analysis pipeline for one instrument set.
///
/// Holds a [`SplitterConfig`] and the instrument set (with any configured
/// extra catalog entries) and exposes each pipeline step as a method.
pub struct Splitter {
    config: SplitterConfig,
    instruments: InstrumentSet,
}

impl Splitter {
    /// Create a splitter with default configuration.
    pub fn new(instruments: &InstrumentSet) -> Self {
        Self::with_config(instruments, SplitterConfig::default())
    }

    /// Create a splitter with a custom configuration.
    pub fn with_config(instruments: &InstrumentSet, config: SplitterConfig) -> Self {
        let instruments = instruments.with_extra_instruments(&config.extra_instruments);
        Self {
            config,
            instruments,
        }
    }

    /// Create a splitter for a built-in ensemble by name.
    pub fn for_ensemble(name: &str, config: SplitterConfig) -> Result<Self, SplitError> {
        let set = InstrumentSet::by_name(name)
            .ok_or_else(|| SplitError::UnknownEnsemble(name.to_string()))?;
        Ok(Self::with_config(set, config))
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    pub fn instruments(&self) -> &InstrumentSet {
        &self.instruments
    }

    /// Label text from a page's text runs.
    pub fn extract_label(&self, items: &[TextItem]) -> String {
        region::extract_top_label_with_config(items, &self.config)
    }

    /// Instrument named by a label, if any.
    pub fn detect(&self, text: &str) -> Option<String> {
        detector::detect_instrument_with_config(text, &self.instruments, &self.config)
    }

    /// Run the full analysis over every page of `backend`.
    pub fn analyze(
        &self,
        backend: &dyn PdfBackend,
        ocr: Option<&dyn OcrEngine>,
        progress: impl Fn(ProgressEvent),
    ) -> Result<AnalysisResult, SplitError> {
        self.analyze_with_cancel(backend, ocr, progress, &CancellationToken::new())
    }

    /// Like [`analyze`](Self::analyze), checking `cancel` before each page.
    ///
    /// A cancelled run returns [`SplitError::Cancelled`] and discards the
    /// splits assembled so far. Backend and OCR failures abort the run.
    pub fn analyze_with_cancel(
        &self,
        backend: &dyn PdfBackend,
        ocr: Option<&dyn OcrEngine>,
        progress: impl Fn(ProgressEvent),
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, SplitError> {
        let total = backend.page_count()?;
        let mut accumulator = SplitAccumulator::new();

        let mut ocr_engine = None;
        match (self.config.ocr_mode, ocr) {
            (OcrMode::Always, Some(engine)) => {
                ocr_engine = Some(engine);
                tracing::info!("OCR forced for all pages");
                progress(ProgressEvent::OcrModeEnabled {
                    trigger: OcrTrigger::Forced,
                });
            }
            (OcrMode::Always, None) => {
                tracing::warn!("OCR requested but no OCR engine available, using text layer");
            }
            _ => {}
        }

        for page in 1..=total {
            if cancel.is_cancelled() {
                tracing::debug!(page, "analysis cancelled");
                return Err(SplitError::Cancelled { page });
            }

            let mut label = match ocr_engine {
                Some(engine) => self.ocr_label(backend, engine, page)?,
                None => self.extract_label(&backend.text_items(page)?),
            };
            let mut detected = self.detect(&label);

            if page == 1 && ocr_engine.is_none() && self.config.ocr_mode == OcrMode::Auto {
                let trigger = if label.chars().count() < self.config.min_label_chars {
                    Some(OcrTrigger::ShortLabel)
                } else if detected.is_none() {
                    Some(OcrTrigger::NoDetection)
                } else {
                    None
                };
                match (trigger, ocr) {
                    (Some(trigger), Some(engine)) => {
                        tracing::info!(?trigger, label = %label, "switching to OCR for the rest of the document");
                        progress(ProgressEvent::OcrModeEnabled { trigger });
                        ocr_engine = Some(engine);
                        label = self.ocr_label(backend, engine, page)?;
                        detected = self.detect(&label);
                    }
                    (Some(trigger), None) => {
                        tracing::warn!(?trigger, "page 1 has no usable label and no OCR engine is available");
                    }
                    (None, _) => {}
                }
            }

            tracing::debug!(
                page,
                label = %label,
                detected = detected.as_deref().unwrap_or("-"),
                ocr = ocr_engine.is_some(),
                "page analyzed"
            );
            progress(ProgressEvent::Page {
                current: page,
                total,
                ocr_active: ocr_engine.is_some(),
                detected: detected.clone(),
            });

            let index = accumulator.closed_len();
            if let Some(closed) = accumulator.push(page, detected) {
                progress(ProgressEvent::SplitClosed {
                    index,
                    split: closed.clone(),
                });
            }
        }

        let splits = accumulator.finish();
        if let Some(last) = splits.last() {
            progress(ProgressEvent::SplitClosed {
                index: splits.len() - 1,
                split: last.clone(),
            });
        }

        for (idx, split) in splits.iter().enumerate() {
            tracing::info!(
                index = idx + 1,
                instrument = %split.instrument,
                range = %split.page_range_label(),
                pages = split.page_count(),
                "split"
            );
        }

        Ok(splits)
    }

    /// Render a page and read its text through OCR.
    fn ocr_label(
        &self,
        backend: &dyn PdfBackend,
        engine: &dyn OcrEngine,
        page: usize,
    ) -> Result<String, SplitError> {
        let image = backend.render_page(page, self.config.ocr_scale)?;
        Ok(engine.recognize(&image)?)
    }
}
