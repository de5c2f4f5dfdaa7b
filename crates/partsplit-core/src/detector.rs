//! Instrument name detection from a page label.
//!
//! The label is cleaned of common OCR confusions, the first line mentioning an
//! instrument root word is located, and a capitalized name (with optional
//! pitch and ordinal prefixes) is pulled from it. Catalog entries win over the
//! raw extraction when their normalized forms agree.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::InstrumentSet;
use crate::config::SplitterConfig;
use crate::text::{collapse_whitespace, fix_ocr_confusions};

/// Optional pitch prefix ("Eb", "Bb"), optional ordinal ("1st", "2nd"), then
/// one or more words.
static PITCHED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([A-Z]b\s+)?(\d+(?:st|nd|rd|th)\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)")
        .unwrap()
});

/// Same as [`PITCHED_NAME_RE`] without the pitch prefix.
static PLAIN_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:st|nd|rd|th)\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap()
});

/// Detect an instrument name in `text` using the default configuration.
///
/// Returns the canonical catalog entry when the extracted name matches one
/// exactly (after [`crate::catalog::normalize`]), the whitespace-collapsed
/// extraction when it only contains an instrument root word, and `None`
/// otherwise.
pub fn detect_instrument(text: &str, set: &InstrumentSet) -> Option<String> {
    detect_instrument_with_config(text, set, &SplitterConfig::default())
}

/// Config-aware version of [`detect_instrument`].
pub(crate) fn detect_instrument_with_config(
    text: &str,
    set: &InstrumentSet,
    config: &SplitterConfig,
) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    let cleaned = fix_ocr_confusions(text.trim());
    let window: String = cleaned.chars().take(config.search_window).collect();

    for line in window.split('\n').map(str::trim) {
        if !set.mentions_instrument(line) {
            continue;
        }
        for pattern in [&*PITCHED_NAME_RE, &*PLAIN_NAME_RE] {
            if let Some(name) = extract_from_line(line, pattern, set, config) {
                return Some(name);
            }
        }
    }

    None
}

/// Try one extraction pattern against a candidate line.
fn extract_from_line(
    line: &str,
    pattern: &Regex,
    set: &InstrumentSet,
    config: &SplitterConfig,
) -> Option<String> {
    let found = pattern.find(line)?;
    if !set.mentions_instrument(found.as_str()) {
        return None;
    }

    let trimmed = config.stop_words_re.replace(found.as_str(), "");
    let extracted = trimmed.trim();
    let len = extracted.chars().count();
    if len <= config.min_name_len || len >= config.max_name_len {
        return None;
    }

    if let Some(canonical) = set.exact_match(extracted) {
        return Some(canonical.to_string());
    }

    if let Some(threshold) = config.fuzzy_threshold
        && let Some(closest) = set.fuzzy_match(extracted, threshold)
    {
        return Some(closest.to_string());
    }

    if set.mentions_instrument(extracted) {
        return Some(collapse_whitespace(extracted));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BRASS_BAND, WIND_BAND};
    use crate::config::SplitterConfigBuilder;

    #[test]
    fn test_empty_text_is_none() {
        assert_eq!(detect_instrument("", &BRASS_BAND), None);
        assert_eq!(detect_instrument("   \n\t ", &BRASS_BAND), None);
    }

    #[test]
    fn test_exact_catalog_match() {
        assert_eq!(
            detect_instrument("Solo Cornet", &BRASS_BAND),
            Some("Solo Cornet".to_string())
        );
        assert_eq!(
            detect_instrument("eb bass", &BRASS_BAND),
            Some("Eb Bass".to_string())
        );
    }

    #[test]
    fn test_ocr_ordinal_fix() {
        assert_eq!(
            detect_instrument("ist Trombone", &BRASS_BAND),
            Some("1st Trombone".to_string())
        );
        assert_eq!(
            detect_instrument("lst Baritone", &BRASS_BAND),
            Some("1st Baritone".to_string())
        );
        assert_eq!(
            detect_instrument("znd Horn", &BRASS_BAND),
            Some("2nd Horn".to_string())
        );
    }

    #[test]
    fn test_umlaut_flattening() {
        assert_eq!(
            detect_instrument("Flügelhorn", &BRASS_BAND),
            Some("Flugelhorn".to_string())
        );
    }

    #[test]
    fn test_stop_words_trim_trailing_title() {
        assert_eq!(
            detect_instrument("2nd Cornet Written for the Fairfield Band", &BRASS_BAND),
            Some("2nd Cornet".to_string())
        );
        assert_eq!(
            detect_instrument("Solo Horn Arranged by Someone", &BRASS_BAND),
            Some("Solo Horn".to_string())
        );
    }

    #[test]
    fn test_stop_word_prefix_inside_title_word() {
        assert_eq!(
            detect_instrument("Cornet Concerto", &BRASS_BAND),
            Some("Cornet".to_string())
        );
        assert_eq!(
            detect_instrument("Euphonium Concertino", &BRASS_BAND),
            Some("Euphonium".to_string())
        );
    }

    #[test]
    fn test_first_matching_line_wins() {
        let text = "Fairfield Band\nEb Bass\nSolo Cornet";
        assert_eq!(detect_instrument(text, &BRASS_BAND), Some("Eb Bass".to_string()));
    }

    #[test]
    fn test_free_text_name_when_not_in_catalog() {
        assert_eq!(
            detect_instrument("Solo Cornet Two", &BRASS_BAND),
            Some("Solo Cornet Two".to_string())
        );
        assert_eq!(
            detect_instrument("1st Clarinet in Bb", &WIND_BAND),
            Some("1st Clarinet in Bb".to_string())
        );
    }

    #[test]
    fn test_ensemble_keywords_gate_detection() {
        assert_eq!(detect_instrument("1st Clarinet", &BRASS_BAND), None);
        assert_eq!(
            detect_instrument("1st Clarinet", &WIND_BAND),
            Some("1st Clarinet".to_string())
        );
    }

    #[test]
    fn test_no_instrument_words() {
        assert_eq!(detect_instrument("Symphonic Overture", &BRASS_BAND), None);
        assert_eq!(detect_instrument("Allegro con brio", &BRASS_BAND), None);
    }

    #[test]
    fn test_overlong_name_rejected() {
        let text = "Cornet Solo Part From The Grand Overture Suite Number";
        assert_eq!(detect_instrument(text, &BRASS_BAND), None);
    }

    #[test]
    fn test_search_window_limits_lookahead() {
        let text = format!("{}\nSolo Horn", "Allegro ".repeat(30));
        assert_eq!(detect_instrument(&text, &BRASS_BAND), None);

        let config = SplitterConfigBuilder::new().search_window(400).build().unwrap();
        assert_eq!(
            detect_instrument_with_config(&text, &BRASS_BAND, &config),
            Some("Solo Horn".to_string())
        );
    }

    #[test]
    fn test_fuzzy_threshold_snaps_to_catalog() {
        assert_eq!(
            detect_instrument("Tenor Hornn", &BRASS_BAND),
            Some("Tenor Hornn".to_string())
        );

        let config = SplitterConfigBuilder::new()
            .fuzzy_threshold(0.9)
            .build()
            .unwrap();
        assert_eq!(
            detect_instrument_with_config("Tenor Hornn", &BRASS_BAND, &config),
            Some("Tenor Horn".to_string())
        );
    }

    #[test]
    fn test_deterministic() {
        let text = "ist Trombone\nWritten for the band";
        let first = detect_instrument(text, &BRASS_BAND);
        for _ in 0..5 {
            assert_eq!(detect_instrument(text, &BRASS_BAND), first);
        }
    }
}
