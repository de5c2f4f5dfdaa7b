use std::io::Write;
use std::path::PathBuf;

use owo_colors::OwoColorize;
use partsplit_core::{InstrumentSet, OcrTrigger, Split, UNKNOWN_INSTRUMENT};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// One summary line: `N. <instrument> (<range>, <count> page[s])`.
pub fn split_line(index: usize, split: &Split, color: ColorMode) -> String {
    let count = split.page_count();
    let detail = format!(
        "({}, {} page{})",
        split.page_range_label(),
        count,
        plural(count)
    );
    if !color.enabled() {
        return format!("{}. {} {}", index + 1, split.instrument, detail);
    }
    if split.instrument == UNKNOWN_INSTRUMENT {
        format!("{}. {} {}", index + 1, split.instrument.yellow(), detail.dimmed())
    } else {
        format!("{}. {} {}", index + 1, split.instrument.bold(), detail.dimmed())
    }
}

/// Human-readable reason for switching to OCR.
pub fn ocr_trigger_message(trigger: OcrTrigger, color: ColorMode) -> String {
    let msg = match trigger {
        OcrTrigger::Forced => "OCR forced for all pages",
        OcrTrigger::NoDetection => "No instrument found in the text layer of page 1, switching to OCR",
        OcrTrigger::ShortLabel => "Page 1 has no usable text layer, switching to OCR",
    };
    if color.enabled() {
        msg.yellow().to_string()
    } else {
        msg.to_string()
    }
}

/// Print the split summary after analysis.
pub fn print_summary(
    w: &mut dyn Write,
    pdf_name: &str,
    splits: &[Split],
    color: ColorMode,
) -> std::io::Result<()> {
    let pages: usize = splits.iter().map(Split::page_count).sum();
    writeln!(
        w,
        "Found {} part{} in {} ({} page{}):",
        splits.len(),
        plural(splits.len()),
        pdf_name,
        pages,
        plural(pages)
    )?;
    for (idx, split) in splits.iter().enumerate() {
        writeln!(w, "  {}", split_line(idx, split, color))?;
    }
    Ok(())
}

/// Print the files written by `split`.
pub fn print_written(w: &mut dyn Write, paths: &[PathBuf], color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(w, "Wrote {} file{}:", paths.len(), plural(paths.len()))?;
    for path in paths {
        if color.enabled() {
            writeln!(w, "  {}", path.display().green())?;
        } else {
            writeln!(w, "  {}", path.display())?;
        }
    }
    Ok(())
}

/// Print the result of a single detection.
pub fn print_detection(
    w: &mut dyn Write,
    detected: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    match (detected, color.enabled()) {
        (Some(name), true) => writeln!(w, "{}", name.green()),
        (Some(name), false) => writeln!(w, "{}", name),
        (None, true) => writeln!(w, "{}", "No instrument detected".red()),
        (None, false) => writeln!(w, "No instrument detected"),
    }
}

/// Print the catalog of an instrument set.
pub fn print_instruments(
    w: &mut dyn Write,
    set: &InstrumentSet,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", set.name().bold())?;
    } else {
        writeln!(w, "{}", set.name())?;
    }
    for name in set.instruments() {
        writeln!(w, "  {}", name)?;
    }
    Ok(())
}
