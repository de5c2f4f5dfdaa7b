//! Label-line extraction from positioned text runs.
//!
//! Part names sit on the topmost line of a page in typical score layouts,
//! sometimes centered between a title and a composer credit. The extractor
//! keeps runs in a fixed-height band below the highest baseline, groups them
//! into lines, and returns a short string around the first run that mentions
//! an instrument.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::TextItem;
use crate::catalog::FAMILY_KEYWORDS;
use crate::config::SplitterConfig;
use crate::text::{collapse_whitespace, strip_punctuation};

/// Extract the best-guess label from a page's text runs using the default configuration.
pub fn extract_top_label(items: &[TextItem]) -> String {
    extract_top_label_with_config(items, &SplitterConfig::default())
}

/// Config-aware version of [`extract_top_label`].
pub(crate) fn extract_top_label_with_config(items: &[TextItem], config: &SplitterConfig) -> String {
    let Some(max_y) = items.iter().map(|item| item.y).reduce(f32::max) else {
        return String::new();
    };
    let threshold = max_y - config.top_band_height;

    let mut band: Vec<&TextItem> = items.iter().filter(|item| item.y >= threshold).collect();
    // top first, then left to right
    band.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let lines = group_lines(&band, config.line_tolerance);
    let Some(mut top_line) = lines
        .into_iter()
        .max_by(|a, b| a.anchor_y.total_cmp(&b.anchor_y))
        .map(|line| line.items)
    else {
        return collapse_whitespace(
            &band
                .iter()
                .map(|item| item.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );
    };
    top_line.sort_by(|a, b| a.x.total_cmp(&b.x));

    let keyword_idx = top_line
        .iter()
        .position(|item| FAMILY_KEYWORDS.is_match(&strip_punctuation(&item.text)));

    match keyword_idx {
        Some(idx) => {
            let start = idx.saturating_sub(config.context_before);
            let end = (idx + config.context_after).min(top_line.len() - 1);
            let text = accumulate(&top_line[start..=end], config.label_max_chars);
            static NOISE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!?=]+").unwrap());
            collapse_whitespace(&NOISE_RE.replace_all(&text, ""))
        }
        None => collapse_whitespace(&accumulate(&top_line, config.label_max_chars)),
    }
}

/// Runs sharing one baseline (within tolerance).
struct Line<'a> {
    /// Baseline of the run that opened the line.
    anchor_y: f32,
    items: Vec<&'a TextItem>,
}

/// Assign each run to the first existing line whose anchor is within
/// `tolerance`, opening a new line otherwise.
fn group_lines<'a>(items: &[&'a TextItem], tolerance: f32) -> Vec<Line<'a>> {
    let mut lines: Vec<Line<'a>> = Vec::new();
    for &item in items {
        match lines
            .iter_mut()
            .find(|line| (line.anchor_y - item.y).abs() < tolerance)
        {
            Some(line) => line.items.push(item),
            None => lines.push(Line {
                anchor_y: item.y,
                items: vec![item],
            }),
        }
    }
    lines
}

/// Join run texts with trailing spaces, stopping once the text exceeds `max_chars`.
fn accumulate(items: &[&TextItem], max_chars: usize) -> String {
    let mut text = String::new();
    for item in items {
        text.push_str(&item.text);
        text.push(' ');
        if text.chars().count() > max_chars {
            break;
        }
    }
    text
}
