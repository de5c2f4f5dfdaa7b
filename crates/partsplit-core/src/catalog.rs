//! Known instrument names per ensemble type.
//!
//! Each [`InstrumentSet`] bundles a catalog of canonical part names with the
//! keyword pattern used to decide whether a line of text mentions an
//! instrument at all. Catalog order is documentation only; lookups go through
//! [`normalize`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Standard brass band part names, grouped by section.
pub const BRASS_BAND_INSTRUMENTS: &[&str] = &[
    // Cornets
    "Soprano Cornet",
    "Soprano Cornet in Eb",
    "Soprano Cornet in E♭",
    "Solo Cornet",
    "Solo Cornet 1",
    "Solo Cornet I",
    "Solo Cornet 2",
    "Solo Cornet II",
    "Solo Cornet 3",
    "Solo Cornet III",
    "Solo Cornet 4",
    "Solo Cornet IV",
    "Repiano Cornet",
    "Repiano",
    "2nd Cornet",
    "Second Cornet",
    "3rd Cornet",
    "Third Cornet",
    "Flugel",
    "Flugelhorn",
    "Flugel Horn",
    // Horns
    "Solo Horn",
    "Solo Tenor Horn",
    "Tenor Horn",
    "1st Horn",
    "First Horn",
    "2nd Horn",
    "Second Horn",
    "3rd Horn",
    "Third Horn",
    "1st Tenor Horn",
    "2nd Tenor Horn",
    // Baritones
    "Baritone",
    "1st Baritone",
    "First Baritone",
    "2nd Baritone",
    "Second Baritone",
    // Trombones
    "1st Trombone",
    "First Trombone",
    "2nd Trombone",
    "Second Trombone",
    "Bass Trombone",
    // Euphoniums
    "Euphonium",
    "Solo Euphonium",
    "1st Euphonium",
    "First Euphonium",
    "2nd Euphonium",
    "Second Euphonium",
    // Basses
    "Eb Bass",
    "E♭ Bass",
    "Eb Tuba",
    "E♭ Tuba",
    "BBb Bass",
    "BB♭ Bass",
    "BBb Tuba",
    "BB♭ Tuba",
    "Tuba",
    "1st Eb Bass",
    "2nd Eb Bass",
    "1st BBb Bass",
    "2nd BBb Bass",
    // Percussion
    "Percussion",
    "Percussion 1",
    "Percussion 2",
    "Percussion I",
    "Percussion II",
    "Timpani",
    "Drums",
    "Bass Drum",
    "Snare Drum",
    "Cymbals",
    "Glockenspiel",
    "Xylophone",
    "Vibraphone",
    // Other
    "Piano",
    "Conductor",
    "Score",
    "Full Score",
];

/// Concert/wind band part names, grouped by section.
pub const WIND_BAND_INSTRUMENTS: &[&str] = &[
    // Flutes and double reeds
    "Piccolo",
    "Flute",
    "1st Flute",
    "2nd Flute",
    "Oboe",
    "1st Oboe",
    "2nd Oboe",
    "English Horn",
    "Bassoon",
    "1st Bassoon",
    "2nd Bassoon",
    "Contrabassoon",
    // Clarinets
    "Eb Clarinet",
    "E♭ Clarinet",
    "Solo Clarinet",
    "1st Clarinet",
    "2nd Clarinet",
    "3rd Clarinet",
    "Bb Clarinet",
    "B♭ Clarinet",
    "1st Bb Clarinet",
    "2nd Bb Clarinet",
    "3rd Bb Clarinet",
    "Alto Clarinet",
    "Bass Clarinet",
    "Contrabass Clarinet",
    // Saxophones
    "Soprano Saxophone",
    "Alto Saxophone",
    "1st Alto Saxophone",
    "2nd Alto Saxophone",
    "Tenor Saxophone",
    "Baritone Saxophone",
    // Trumpets and cornets
    "Trumpet",
    "1st Trumpet",
    "2nd Trumpet",
    "3rd Trumpet",
    "Bb Trumpet",
    "B♭ Trumpet",
    "1st Bb Trumpet",
    "2nd Bb Trumpet",
    "3rd Bb Trumpet",
    "Cornet",
    "1st Cornet",
    "2nd Cornet",
    "3rd Cornet",
    "Flugelhorn",
    // Horns
    "Horn",
    "F Horn",
    "Horn in F",
    "1st Horn",
    "2nd Horn",
    "3rd Horn",
    "4th Horn",
    // Low brass
    "Trombone",
    "1st Trombone",
    "2nd Trombone",
    "3rd Trombone",
    "Bass Trombone",
    "Euphonium",
    "Euphonium TC",
    "Euphonium BC",
    "Baritone",
    "Baritone TC",
    "Baritone BC",
    "Tuba",
    "String Bass",
    "Double Bass",
    // Percussion
    "Percussion",
    "Percussion 1",
    "Percussion 2",
    "Mallet Percussion",
    "Mallets",
    "Timpani",
    "Snare Drum",
    "Bass Drum",
    "Drum Set",
    "Cymbals",
    "Glockenspiel",
    "Xylophone",
    "Vibraphone",
    "Marimba",
    "Chimes",
    // Other
    "Harp",
    "Piano",
    "Conductor",
    "Score",
    "Full Score",
];

/// Quick-match root words for brass band parts.
const BRASS_BAND_KEYWORDS: &str =
    r"(?i)soprano|cornet|horn|baritone|trombone|euphonium|bass|tuba|percussion|timpani|flugel|repiano";

/// Quick-match root words for wind band parts.
const WIND_BAND_KEYWORDS: &str = r"(?i)piccolo|flute|oboe|bassoon|clarinet|saxophone|trumpet|cornet|flugel|horn|trombone|euphonium|baritone|tuba|bass|percussion|mallet|timpani|harp";

/// Every root word recognized by any built-in set. The region extractor uses
/// this when scanning a label line, before the ensemble is consulted.
pub static FAMILY_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)soprano|cornet|flugel|repiano|horn|baritone|trombone|euphonium|bass|tuba|percussion|timpani|piccolo|flute|oboe|bassoon|clarinet|saxophone|trumpet|mallet|harp",
    )
    .unwrap()
});

pub static BRASS_BAND: Lazy<InstrumentSet> = Lazy::new(|| {
    InstrumentSet::new(
        "brass-band",
        BRASS_BAND_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
        Regex::new(BRASS_BAND_KEYWORDS).unwrap(),
    )
});

pub static WIND_BAND: Lazy<InstrumentSet> = Lazy::new(|| {
    InstrumentSet::new(
        "wind-band",
        WIND_BAND_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
        Regex::new(WIND_BAND_KEYWORDS).unwrap(),
    )
});

/// Names accepted by [`InstrumentSet::by_name`].
pub const ENSEMBLE_NAMES: &[&str] = &["brass-band", "wind-band"];

/// Get a normalized version of an instrument name for comparison.
///
/// Lowercases, trims, collapses whitespace runs and maps the unicode flat and
/// sharp signs to `b` and `#`.
pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('♭', "b")
        .replace('♯', "#")
}

/// A named catalog plus keyword pattern for one ensemble type.
#[derive(Debug, Clone)]
pub struct InstrumentSet {
    name: String,
    instruments: Vec<String>,
    keywords: Regex,
    /// normalized name → index of the first catalog entry with that form
    by_normalized: HashMap<String, usize>,
}

impl InstrumentSet {
    pub fn new(name: impl Into<String>, instruments: Vec<String>, keywords: Regex) -> Self {
        let mut by_normalized = HashMap::with_capacity(instruments.len());
        for (idx, instrument) in instruments.iter().enumerate() {
            by_normalized.entry(normalize(instrument)).or_insert(idx);
        }
        Self {
            name: name.into(),
            instruments,
            keywords,
            by_normalized,
        }
    }

    /// Look up a built-in set by its ensemble name (`brass-band`, `wind-band`).
    pub fn by_name(name: &str) -> Option<&'static InstrumentSet> {
        match normalize(name).replace([' ', '_'], "-").as_str() {
            "brass-band" | "brass" => Some(&BRASS_BAND),
            "wind-band" | "wind" | "concert-band" => Some(&WIND_BAND),
            _ => None,
        }
    }

    /// Copy of this set with additional catalog entries appended.
    pub fn with_extra_instruments(&self, extra: &[String]) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut instruments = self.instruments.clone();
        instruments.extend(extra.iter().cloned());
        Self::new(self.name.clone(), instruments, self.keywords.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn keywords(&self) -> &Regex {
        &self.keywords
    }

    /// Whether `text` contains any of this set's root words.
    pub fn mentions_instrument(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }

    /// Canonical catalog entry whose normalized form equals that of `name`.
    pub fn exact_match(&self, name: &str) -> Option<&str> {
        self.by_normalized
            .get(&normalize(name))
            .map(|&idx| self.instruments[idx].as_str())
    }

    /// Best catalog entry whose `rapidfuzz` ratio (0.0–1.0) is at or above `threshold`.
    pub fn fuzzy_match(&self, name: &str, threshold: f64) -> Option<&str> {
        let norm = normalize(name);
        let mut best: Option<(f64, &str)> = None;
        for instrument in &self.instruments {
            let candidate = normalize(instrument);
            let score = rapidfuzz::fuzz::ratio(norm.chars(), candidate.chars());
            if score >= threshold && best.is_none_or(|(s, _)| score > s) {
                best = Some((score, instrument.as_str()));
            }
        }
        best.map(|(_, instrument)| instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_basic() {
        assert_eq!(normalize("  Solo   Cornet "), "solo cornet");
        assert_eq!(normalize("E♭ Bass"), "eb bass");
        assert_eq!(normalize("F♯ Horn"), "f# horn");
        assert_eq!(normalize("BB♭\tTuba"), "bbb tuba");
    }

    #[test]
    fn test_normalize_idempotent() {
        for s in [
            "  Soprano Cornet in E♭ ",
            "BB♭ Tuba",
            "",
            "   ",
            "ÄÖÜ  Horn\n\n2",
            "1st\u{00a0}Trombone",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_exact_match_ignores_case_and_symbols() {
        assert_eq!(BRASS_BAND.exact_match("eb bass"), Some("Eb Bass"));
        assert_eq!(BRASS_BAND.exact_match("E♭ BASS"), Some("Eb Bass"));
        assert_eq!(BRASS_BAND.exact_match("1st  trombone"), Some("1st Trombone"));
        assert_eq!(BRASS_BAND.exact_match("Kazoo"), None);
    }

    #[test]
    fn test_exact_match_prefers_first_catalog_entry() {
        // "Soprano Cornet in Eb" and "Soprano Cornet in E♭" share a normalized form
        assert_eq!(
            BRASS_BAND.exact_match("soprano cornet in e♭"),
            Some("Soprano Cornet in Eb")
        );
    }

    #[test]
    fn test_by_name() {
        assert_eq!(InstrumentSet::by_name("brass-band").unwrap().name(), "brass-band");
        assert_eq!(InstrumentSet::by_name("Wind Band").unwrap().name(), "wind-band");
        assert_eq!(InstrumentSet::by_name("wind_band").unwrap().name(), "wind-band");
        assert!(InstrumentSet::by_name("orchestra").is_none());
    }

    #[test]
    fn test_ensemble_names_resolve_to_themselves() {
        for name in ENSEMBLE_NAMES {
            assert_eq!(InstrumentSet::by_name(name).map(|s| s.name()), Some(*name));
        }
    }

    #[test]
    fn test_keywords_differ_per_set() {
        assert!(BRASS_BAND.mentions_instrument("Repiano Cornet"));
        assert!(!BRASS_BAND.mentions_instrument("1st Clarinet"));
        assert!(WIND_BAND.mentions_instrument("1st Clarinet"));
        assert!(FAMILY_KEYWORDS.is_match("CLARINET"));
        assert!(FAMILY_KEYWORDS.is_match("Repiano"));
    }

    #[test]
    fn test_with_extra_instruments() {
        let set = BRASS_BAND.with_extra_instruments(&["Solo Flugel".to_string()]);
        assert_eq!(set.exact_match("solo flugel"), Some("Solo Flugel"));
        assert_eq!(set.instruments().len(), BRASS_BAND.instruments().len() + 1);
        assert_eq!(BRASS_BAND.exact_match("solo flugel"), None);
    }

    #[test]
    fn test_fuzzy_match() {
        assert_eq!(BRASS_BAND.fuzzy_match("Euphonuim", 0.85), Some("Euphonium"));
        assert_eq!(BRASS_BAND.fuzzy_match("Solo Cornat", 0.85), Some("Solo Cornet"));
        assert_eq!(BRASS_BAND.fuzzy_match("Conductor's Notes", 0.95), None);
    }
}
