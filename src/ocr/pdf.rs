//! PDF page rendering via Poppler's `pdfinfo` and `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::tools::spawn_error;
use super::OcrError;

/// Number of pages in a PDF, read from `pdfinfo`.
pub fn pdf_page_count(pdf_path: &Path) -> Result<u32, OcrError> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .map_err(|e| spawn_error(e, "pdfinfo", "poppler-utils"))?;

    if !output.status.success() {
        return Err(OcrError::OcrFailed(format!(
            "pdfinfo failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_page_count(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| OcrError::OcrFailed("pdfinfo reported no page count".to_string()))
}

fn parse_page_count(info: &str) -> Option<u32> {
    info.lines()
        .find(|line| line.starts_with("Pages:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse().ok())
}

/// Render one PDF page to a PNG inside `output_dir`.
pub fn pdf_page_to_image(
    pdf_path: &Path,
    page: u32,
    dpi: u32,
    output_dir: &Path,
) -> Result<PathBuf, OcrError> {
    let page_str = page.to_string();
    let dpi_str = dpi.to_string();

    let status = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi_str, "-f", &page_str, "-l", &page_str])
        .arg(pdf_path)
        .arg(output_dir.join("page"))
        .status()
        .map_err(|e| spawn_error(e, "pdftoppm", "poppler-utils"))?;

    if !status.success() {
        return Err(OcrError::OcrFailed(format!(
            "pdftoppm failed to convert page {}",
            page
        )));
    }

    find_page_image(output_dir, page)
        .ok_or_else(|| OcrError::OcrFailed(format!("No image generated for page {}", page)))
}

/// Find the image `pdftoppm` wrote for a page.
///
/// The page number is zero-padded to the width of the document's page count,
/// so `page-1.png`, `page-01.png` and `page-001.png` are all possible.
pub fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    (1..=4)
        .map(|digits| dir.join(format!("page-{:0width$}.png", page, width = digits)))
        .find(|path| path.exists())
}
