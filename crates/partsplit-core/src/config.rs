use regex::Regex;

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

/// Words that end an instrument label on real title pages. Everything from the
/// first of these onward is dropped from an extracted name.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "Written",
    "for",
    "Funk",
    "Better",
    "Championships",
    "Concert",
    "Liam",
    "Arranged",
    "Pat",
    "Metheny",
];

/// When to read page labels through OCR instead of the PDF text layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OcrMode {
    /// Switch to OCR for the whole run if page 1 yields no usable label.
    #[default]
    Auto,
    /// Never use OCR.
    Never,
    /// Use OCR for every page.
    Always,
}

impl std::str::FromStr for OcrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(OcrMode::Auto),
            "never" | "off" => Ok(OcrMode::Never),
            "always" | "force" => Ok(OcrMode::Always),
            other => Err(format!("unknown OCR mode: {other}")),
        }
    }
}

/// Configuration for label extraction, name detection and split analysis.
///
/// Use [`SplitterConfigBuilder`] to construct with string values; `build()`
/// compiles the stop-word pattern.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    // ── detector.rs ──
    /// Stop words compiled into a single trailing-noise pattern.
    pub(crate) stop_words_re: Regex,
    /// Catalog entries appended to the selected instrument set.
    pub(crate) extra_instruments: Vec<String>,
    /// Number of leading characters of a label searched for a name (default: 200).
    pub(crate) search_window: usize,
    /// Extracted names must be strictly longer than this (default: 2).
    pub(crate) min_name_len: usize,
    /// Extracted names must be strictly shorter than this (default: 40).
    pub(crate) max_name_len: usize,
    /// Snap free-text names to the closest catalog entry at this ratio (0.0–1.0).
    pub(crate) fuzzy_threshold: Option<f64>,

    // ── region.rs ──
    /// Height below the topmost text run that still counts as the top band.
    pub(crate) top_band_height: f32,
    /// Runs whose baselines differ by less than this share a line.
    pub(crate) line_tolerance: f32,
    /// Stop accumulating label text once it exceeds this many characters.
    pub(crate) label_max_chars: usize,
    /// Runs kept before the keyword-bearing run.
    pub(crate) context_before: usize,
    /// Runs kept after the keyword-bearing run.
    pub(crate) context_after: usize,

    // ── analyzer.rs ──
    pub(crate) ocr_mode: OcrMode,
    /// A page-1 label shorter than this switches the run to OCR (default: 3).
    pub(crate) min_label_chars: usize,
    /// Render scale handed to the rasterizer for OCR (default: 2.0).
    pub(crate) ocr_scale: f32,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            stop_words_re: compile_stop_words(
                &DEFAULT_STOP_WORDS
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>(),
            )
            .unwrap(),
            extra_instruments: Vec::new(),
            search_window: 200,
            min_name_len: 2,
            max_name_len: 40,
            fuzzy_threshold: None,
            top_band_height: 100.0,
            line_tolerance: 5.0,
            label_max_chars: 50,
            context_before: 2,
            context_after: 2,
            ocr_mode: OcrMode::Auto,
            min_label_chars: 3,
            ocr_scale: 2.0,
        }
    }
}

impl SplitterConfig {
    pub fn ocr_mode(&self) -> OcrMode {
        self.ocr_mode
    }

    pub fn ocr_scale(&self) -> f32 {
        self.ocr_scale
    }

    pub fn extra_instruments(&self) -> &[String] {
        &self.extra_instruments
    }

    pub fn fuzzy_threshold(&self) -> Option<f64> {
        self.fuzzy_threshold
    }
}

/// Build the trailing-noise pattern: optional leading whitespace, then the
/// first occurrence of any stop word (also inside a longer word, so
/// "Concerto" is cut at "Concert"), then the rest of the line.
fn compile_stop_words(words: &[String]) -> Result<Regex, regex::Error> {
    if words.is_empty() {
        // matches nothing
        return Regex::new(r"\b\B");
    }
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\s*(?:{alternation}).*"))
}

/// Builder for [`SplitterConfig`].
#[derive(Debug, Clone, Default)]
pub struct SplitterConfigBuilder {
    stop_words: ListOverride<String>,
    extra_instruments: Vec<String>,
    search_window: Option<usize>,
    min_name_len: Option<usize>,
    max_name_len: Option<usize>,
    fuzzy_threshold: Option<f64>,
    top_band_height: Option<f32>,
    line_tolerance: Option<f32>,
    label_max_chars: Option<usize>,
    context_before: Option<usize>,
    context_after: Option<usize>,
    ocr_mode: Option<OcrMode>,
    min_label_chars: Option<usize>,
    ocr_scale: Option<f32>,
}

impl SplitterConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Stop words ──

    pub fn set_stop_words(mut self, words: Vec<String>) -> Self {
        self.stop_words = ListOverride::Replace(words);
        self
    }

    pub fn add_stop_word(mut self, word: String) -> Self {
        match &mut self.stop_words {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(word),
            ListOverride::Default => self.stop_words = ListOverride::Extend(vec![word]),
        }
        self
    }

    // ── Catalog ──

    pub fn add_instrument(mut self, name: String) -> Self {
        self.extra_instruments.push(name);
        self
    }

    pub fn extra_instruments(mut self, names: Vec<String>) -> Self {
        self.extra_instruments.extend(names);
        self
    }

    // ── Detector scalars ──

    pub fn search_window(mut self, chars: usize) -> Self {
        self.search_window = Some(chars);
        self
    }

    pub fn name_length_bounds(mut self, min_exclusive: usize, max_exclusive: usize) -> Self {
        self.min_name_len = Some(min_exclusive);
        self.max_name_len = Some(max_exclusive);
        self
    }

    /// Enable snapping free-text names to the closest catalog entry.
    pub fn fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = Some(threshold.clamp(0.0, 1.0));
        self
    }

    // ── Region scalars ──

    pub fn top_band_height(mut self, height: f32) -> Self {
        self.top_band_height = Some(height);
        self
    }

    pub fn line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = Some(tolerance);
        self
    }

    pub fn label_max_chars(mut self, chars: usize) -> Self {
        self.label_max_chars = Some(chars);
        self
    }

    pub fn label_context(mut self, before: usize, after: usize) -> Self {
        self.context_before = Some(before);
        self.context_after = Some(after);
        self
    }

    // ── Analyzer ──

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.ocr_mode = Some(mode);
        self
    }

    pub fn min_label_chars(mut self, chars: usize) -> Self {
        self.min_label_chars = Some(chars);
        self
    }

    pub fn ocr_scale(mut self, scale: f32) -> Self {
        self.ocr_scale = Some(scale);
        self
    }

    /// Compile the stop-word pattern and produce a [`SplitterConfig`].
    pub fn build(self) -> Result<SplitterConfig, regex::Error> {
        let defaults: Vec<String> = DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect();
        let stop_words = self.stop_words.resolve(&defaults);
        let base = SplitterConfig::default();

        Ok(SplitterConfig {
            stop_words_re: compile_stop_words(&stop_words)?,
            extra_instruments: self.extra_instruments,
            search_window: self.search_window.unwrap_or(base.search_window),
            min_name_len: self.min_name_len.unwrap_or(base.min_name_len),
            max_name_len: self.max_name_len.unwrap_or(base.max_name_len),
            fuzzy_threshold: self.fuzzy_threshold,
            top_band_height: self.top_band_height.unwrap_or(base.top_band_height),
            line_tolerance: self.line_tolerance.unwrap_or(base.line_tolerance),
            label_max_chars: self.label_max_chars.unwrap_or(base.label_max_chars),
            context_before: self.context_before.unwrap_or(base.context_before),
            context_after: self.context_after.unwrap_or(base.context_after),
            ocr_mode: self.ocr_mode.unwrap_or(base.ocr_mode),
            min_label_chars: self.min_label_chars.unwrap_or(base.min_label_chars),
            ocr_scale: self.ocr_scale.unwrap_or(base.ocr_scale),
        })
    }
}
