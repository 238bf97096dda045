//! Key/value field extraction from recognized lines.

use std::sync::OnceLock;

use regex::Regex;

use super::tsv::OcrLine;
use crate::models::{ExtractedData, ExtractedField, FieldKind, FieldValue, Form};

const MAX_KEY_LEN: usize = 48;

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Plain or signed amounts, or parenthesized (negative) amounts.
        Regex::new(
            r"^-?\$?\s*(\d{1,3}(,\d{3})*|\d+)(\.\d+)?%?$|^\(\$?\s*(\d{1,3}(,\d{3})*|\d+)(\.\d+)?%?\)$",
        )
        .expect("numeric pattern is valid")
    })
}

/// Parse a printed number such as `$1,234.50`, `(12.00)` or `45%`.
///
/// Parenthesized amounts are negative and may not carry their own sign.
/// Returns `None` for anything that is not purely numeric.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || !numeric_pattern().is_match(s) {
        return None;
    }

    let negative_parens = s.starts_with('(');
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    Some(if negative_parens { -value } else { value })
}

fn typed_value(raw: &str, kind: FieldKind) -> FieldValue {
    match kind {
        FieldKind::Number => parse_number(raw)
            .map(FieldValue::Number)
            .unwrap_or_else(|| FieldValue::Text(raw.to_string())),
        FieldKind::Text => FieldValue::Text(raw.to_string()),
    }
}

/// Digit strings like `02139` are identifiers, not amounts.
fn has_leading_zero(raw: &str) -> bool {
    let digits = raw
        .trim()
        .trim_start_matches(|c: char| matches!(c, '(' | '-' | '$') || c.is_whitespace());
    let mut chars = digits.chars();
    chars.next() == Some('0') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

fn guess_value(raw: &str) -> FieldValue {
    if has_leading_zero(raw) {
        return FieldValue::Text(raw.to_string());
    }
    parse_number(raw)
        .map(FieldValue::Number)
        .unwrap_or_else(|| FieldValue::Text(raw.to_string()))
}

fn field_from_line(value: FieldValue, line: &OcrLine) -> ExtractedField {
    ExtractedField {
        value,
        confidence: line.confidence,
        bounding_box: line.bounding_box,
    }
}

/// Lowercase and collapse whitespace for label comparison.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Generic `key: value` extraction.
///
/// Repeated keys are suffixed ` (2)`, ` (3)` in reading order.
pub fn extract_generic(lines: &[OcrLine]) -> ExtractedData {
    let mut data = ExtractedData::new();

    for line in lines {
        let Some((key, value)) = line.text.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() || key.chars().count() > MAX_KEY_LEN {
            continue;
        }

        let mut name = key.to_string();
        let mut n = 2;
        while data.contains_key(&name) {
            name = format!("{} ({})", key, n);
            n += 1;
        }
        data.insert(name, field_from_line(guess_value(value), line));
    }

    data
}

/// Form-guided extraction. Every form field appears in the result.
pub fn extract_with_form(lines: &[OcrLine], form: &Form) -> ExtractedData {
    let normalized: Vec<String> = lines.iter().map(|l| normalize(&l.text)).collect();
    let mut data = ExtractedData::new();

    for field in &form.fields {
        let found = field
            .match_labels()
            .into_iter()
            .find_map(|label| find_labeled_value(lines, &normalized, &normalize(label)));

        let extracted = match found {
            Some((value, line)) => field_from_line(typed_value(&value, field.kind), line),
            None => ExtractedField::missing(),
        };
        data.insert(field.name.clone(), extracted);
    }

    data
}

/// Find the first line starting with `label` and return the value after it,
/// or the following line when the label stands alone.
fn find_labeled_value<'a>(
    lines: &'a [OcrLine],
    normalized: &[String],
    label: &str,
) -> Option<(String, &'a OcrLine)> {
    if label.is_empty() {
        return None;
    }

    for (i, text) in normalized.iter().enumerate() {
        let Some(rest) = text.strip_prefix(label) else {
            continue;
        };
        // A label must end at a word boundary.
        if rest.chars().next().is_some_and(|c| c.is_alphanumeric()) {
            continue;
        }

        let original = original_remainder(&lines[i].text, label.chars().count());
        let value = original
            .trim_start_matches(|c: char| c == ':' || c == '-' || c.is_whitespace())
            .trim();
        if !value.is_empty() {
            return Some((value.to_string(), &lines[i]));
        }

        if let Some(next) = lines.get(i + 1) {
            let next_value = next.text.trim();
            if !next_value.is_empty() {
                return Some((next_value.to_string(), next));
            }
        }
    }

    None
}

/// The part of `text` after its first `label_chars` non-collapsed characters,
/// preserving the original casing.
fn original_remainder(text: &str, label_chars: usize) -> &str {
    let mut seen = 0;
    let mut last_was_space = true;
    for (idx, c) in text.char_indices() {
        if seen == label_chars {
            return &text[idx..];
        }
        if c.is_whitespace() {
            if !last_was_space {
                seen += 1;
            }
            last_was_space = true;
        } else {
            seen += 1;
            last_was_space = false;
        }
    }
    ""
}
