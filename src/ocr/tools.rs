//! External tool discovery.

/// Check whether an executable is on `PATH`.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Map a spawn failure to an OCR error, naming the package to install.
pub(crate) fn spawn_error(err: std::io::Error, tool: &str, package: &str) -> super::OcrError {
    if err.kind() == std::io::ErrorKind::NotFound {
        super::OcrError::BackendNotAvailable(format!("{} not found (install {})", tool, package))
    } else {
        super::OcrError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("docextract-no-such-tool-xyz"));
    }

    #[test]
    fn test_spawn_error_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let mapped = spawn_error(err, "tesseract", "tesseract-ocr");
        assert!(matches!(mapped, crate::ocr::OcrError::BackendNotAvailable(m) if m.contains("tesseract-ocr")));
    }
}
