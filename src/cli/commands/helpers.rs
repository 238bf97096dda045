//! Shared helper functions for CLI commands.

use console::style;

use crate::models::{DocumentStatus, ExtractedData};

/// Truncate a string to at most `max_len` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn styled_status(status: DocumentStatus) -> String {
    match status {
        DocumentStatus::Pending => style(status.as_str()).yellow().to_string(),
        DocumentStatus::Complete => style(status.as_str()).cyan().to_string(),
        DocumentStatus::Verified => style(status.as_str()).green().to_string(),
    }
}

/// Print extracted fields as a table.
pub fn print_fields(data: &ExtractedData) {
    if data.is_empty() {
        println!("  {} No fields extracted", style("!").yellow());
        return;
    }

    println!("  {:<28} {:<36} {:>10}", "Field", "Value", "Confidence");
    println!("  {}", "-".repeat(76));
    for (name, field) in data {
        let confidence = field
            .confidence
            .map(|c| format!("{:.1}", c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<28} {:<36} {:>10}",
            truncate(name, 28),
            truncate(&field.value.to_string(), 36),
            confidence
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Wages, tips, other compensation", 12), "Wages, ti...");
        assert_eq!(truncate("ümlaut ümlaut", 8), "ümlau...");
    }
}
