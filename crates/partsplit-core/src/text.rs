use once_cell::sync::Lazy;
use regex::Regex;

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove every character that is neither a word character nor whitespace.
pub fn strip_punctuation(text: &str) -> String {
    static PUNCT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
    PUNCT_RE.replace_all(text, "").into_owned()
}

/// Fix digit/letter confusions common in OCR output and flatten umlauts.
///
/// - `"ist Trombone"`, `"lst Baritone"`, `"Ist"`, `"Lst"` → `"1st …"`
/// - `"znd Horn"` → `"2nd Horn"`
/// - `"Flügelhorn"` → `"Flugelhorn"`
pub fn fix_ocr_confusions(text: &str) -> String {
    static FIRST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b[il]st\b").unwrap());
    static SECOND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bznd\b").unwrap());

    let text = FIRST_RE.replace_all(text, "1st");
    let text = SECOND_RE.replace_all(&text, "2nd");
    text.replace('ü', "u")
        .replace('ö', "o")
        .replace('ä', "a")
        .replace('Ü', "U")
        .replace('Ö', "O")
        .replace('Ä', "A")
}
