use std::path::Path;
use std::process::Command;

use partsplit_core::BackendError;

/// Render one page (1-based) of the PDF at `path` to PNG bytes with the
/// `pdftoppm` at `binary`. `scale` 1.0 renders at 72 dpi.
pub(crate) fn render_with(
    binary: &Path,
    path: &Path,
    page: usize,
    scale: f32,
) -> Result<Vec<u8>, BackendError> {
    let dpi = (72.0 * scale).round().max(1.0) as u32;
    let dir = tempfile::tempdir()?;
    let prefix = dir.path().join("page");

    let out = Command::new(binary)
        .arg("-r")
        .arg(dpi.to_string())
        .arg("-f")
        .arg(page.to_string())
        .arg("-l")
        .arg(page.to_string())
        .arg("-png")
        .arg("-singlefile")
        .arg(path)
        .arg(&prefix)
        .output()
        .map_err(|e| {
            BackendError::RenderError(format!("failed to run {}: {}", binary.display(), e))
        })?;
    if !out.status.success() {
        return Err(BackendError::RenderError(format!(
            "{} exited with {}: {}",
            binary.display(),
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let png = std::fs::read(prefix.with_extension("png"))?;
    if png.is_empty() {
        return Err(BackendError::RenderError(format!("page {page} rendered empty")));
    }
    tracing::debug!(page, dpi, bytes = png.len(), "page rendered");
    Ok(png)
}
