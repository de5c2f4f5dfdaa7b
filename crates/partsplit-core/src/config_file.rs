use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SplitError;
use crate::config::{OcrMode, SplitterConfig, SplitterConfigBuilder};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub detection: Option<DetectionConfig>,
    pub layout: Option<LayoutConfig>,
    pub ocr: Option<OcrConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// `brass-band` or `wind-band`.
    pub ensemble: Option<String>,
    pub extra_instruments: Option<Vec<String>>,
    /// Replaces the built-in stop words.
    pub stop_words: Option<Vec<String>>,
    /// Appended to the (built-in or replaced) stop words.
    pub extra_stop_words: Option<Vec<String>>,
    pub search_window: Option<usize>,
    pub fuzzy_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub top_band_height: Option<f32>,
    pub line_tolerance: Option<f32>,
    pub label_max_chars: Option<usize>,
    pub context_before: Option<usize>,
    pub context_after: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    /// `auto`, `never` or `always`.
    pub mode: Option<String>,
    pub scale: Option<f32>,
    pub min_label_chars: Option<usize>,
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub directory: Option<String>,
}

/// Platform config directory path: `<config_dir>/partsplit/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("partsplit").join("config.toml"))
}

/// Load config by cascading CWD `.partsplit.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".partsplit.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Overlay value if present, base value otherwise.
fn pick<S, T>(overlay: Option<&S>, base: Option<&S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay.and_then(&field).or_else(|| base.and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bd, od) = (base.detection.as_ref(), overlay.detection.as_ref());
    let (bl, ol) = (base.layout.as_ref(), overlay.layout.as_ref());
    let (bo, oo) = (base.ocr.as_ref(), overlay.ocr.as_ref());
    let (bu, ou) = (base.output.as_ref(), overlay.output.as_ref());

    ConfigFile {
        detection: Some(DetectionConfig {
            ensemble: pick(od, bd, |d| d.ensemble.clone()),
            extra_instruments: pick(od, bd, |d| d.extra_instruments.clone()),
            stop_words: pick(od, bd, |d| d.stop_words.clone()),
            extra_stop_words: pick(od, bd, |d| d.extra_stop_words.clone()),
            search_window: pick(od, bd, |d| d.search_window),
            fuzzy_threshold: pick(od, bd, |d| d.fuzzy_threshold),
        }),
        layout: Some(LayoutConfig {
            top_band_height: pick(ol, bl, |l| l.top_band_height),
            line_tolerance: pick(ol, bl, |l| l.line_tolerance),
            label_max_chars: pick(ol, bl, |l| l.label_max_chars),
            context_before: pick(ol, bl, |l| l.context_before),
            context_after: pick(ol, bl, |l| l.context_after),
        }),
        ocr: Some(OcrConfig {
            mode: pick(oo, bo, |o| o.mode.clone()),
            scale: pick(oo, bo, |o| o.scale),
            min_label_chars: pick(oo, bo, |o| o.min_label_chars),
            language: pick(oo, bo, |o| o.language.clone()),
        }),
        output: Some(OutputConfig {
            directory: pick(ou, bu, |o| o.directory.clone()),
        }),
    }
}

impl ConfigFile {
    /// Apply the values present in this file onto `builder`.
    pub fn apply(&self, mut builder: SplitterConfigBuilder) -> SplitterConfigBuilder {
        if let Some(d) = &self.detection {
            if let Some(words) = &d.stop_words {
                builder = builder.set_stop_words(words.clone());
            }
            for word in d.extra_stop_words.iter().flatten() {
                builder = builder.add_stop_word(word.clone());
            }
            if let Some(extra) = &d.extra_instruments {
                builder = builder.extra_instruments(extra.clone());
            }
            if let Some(n) = d.search_window {
                builder = builder.search_window(n);
            }
            if let Some(t) = d.fuzzy_threshold {
                builder = builder.fuzzy_threshold(t);
            }
        }
        if let Some(l) = &self.layout {
            if let Some(h) = l.top_band_height {
                builder = builder.top_band_height(h);
            }
            if let Some(t) = l.line_tolerance {
                builder = builder.line_tolerance(t);
            }
            if let Some(n) = l.label_max_chars {
                builder = builder.label_max_chars(n);
            }
            if l.context_before.is_some() || l.context_after.is_some() {
                let defaults = SplitterConfig::default();
                builder = builder.label_context(
                    l.context_before.unwrap_or(defaults.context_before),
                    l.context_after.unwrap_or(defaults.context_after),
                );
            }
        }
        if let Some(o) = &self.ocr {
            if let Some(mode) = &o.mode {
                match mode.parse::<OcrMode>() {
                    Ok(mode) => builder = builder.ocr_mode(mode),
                    Err(e) => tracing::warn!(error = %e, "ignoring [ocr] mode"),
                }
            }
            if let Some(scale) = o.scale {
                builder = builder.ocr_scale(scale);
            }
            if let Some(n) = o.min_label_chars {
                builder = builder.min_label_chars(n);
            }
        }
        builder
    }

    /// Build a [`SplitterConfig`] from this file over the defaults.
    pub fn to_config(&self) -> Result<SplitterConfig, SplitError> {
        Ok(self.apply(SplitterConfigBuilder::new()).build()?)
    }

    pub fn ensemble(&self) -> Option<&str> {
        self.detection.as_ref()?.ensemble.as_deref()
    }

    pub fn ocr_language(&self) -> Option<&str> {
        self.ocr.as_ref()?.language.as_deref()
    }

    pub fn output_directory(&self) -> Option<&str> {
        self.output.as_ref()?.directory.as_deref()
    }
}
