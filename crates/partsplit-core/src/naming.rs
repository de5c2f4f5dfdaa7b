use once_cell::sync::Lazy;
use regex::Regex;

/// Lowercase slug of an instrument name: only ASCII letters, digits, spaces
/// and hyphens survive, and whitespace runs become `-`.
///
/// `"2nd E♭ Bass"` → `"2nd-e-bass"`
pub fn sanitize_instrument_name(instrument: &str) -> String {
    static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s-]").unwrap());
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let kept = DISALLOWED_RE.replace_all(instrument, "");
    WS_RE.replace_all(&kept, "-").to_lowercase()
}

/// File name for one split: `<base>-<Instrument-Name>.pdf`.
///
/// Capitalization is preserved; characters other than word characters,
/// whitespace and `-` are dropped, whitespace becomes `-` and hyphen runs
/// collapse. A trailing `.pdf` on `base` is removed first.
pub fn split_file_name(base: &str, instrument: &str) -> String {
    static PDF_EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());
    static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
    static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static HYPHENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

    let base = PDF_EXT_RE.replace(base, "");
    let name = DISALLOWED_RE.replace_all(instrument, "");
    let name = WS_RE.replace_all(&name, "-");
    let name = HYPHENS_RE.replace_all(&name, "-");
    format!("{base}-{name}.pdf")
}
