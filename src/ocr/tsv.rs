//! Parsing of Tesseract TSV output into text lines.
//!
//! Columns: level, page_num, block_num, par_num, line_num, word_num, left,
//! top, width, height, conf, text. Level 1 rows carry the page size, level 5
//! rows carry words.

use std::collections::BTreeMap;

use crate::models::BoundingBox;

const PAGE_LEVEL: u32 = 1;
const WORD_LEVEL: u32 = 5;

/// A recognized line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    /// Mean word confidence (0-100), if any word reported one.
    pub confidence: Option<f64>,
    /// Line position as fractions of the page size.
    pub bounding_box: Option<BoundingBox>,
}

struct Word {
    text: String,
    conf: f64,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

/// Parse TSV output into lines, ordered by page, block, paragraph and line.
///
/// Malformed rows and the header are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrLine> {
    let mut page_sizes: BTreeMap<u32, (f64, f64)> = BTreeMap::new();
    let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<Word>> = BTreeMap::new();

    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            continue;
        }

        let ints: Option<Vec<u32>> = cols[..6].iter().map(|c| c.trim().parse().ok()).collect();
        let Some(ints) = ints else {
            continue;
        };
        let geometry: Option<Vec<f64>> =
            cols[6..10].iter().map(|c| c.trim().parse().ok()).collect();
        let Some(geometry) = geometry else {
            continue;
        };

        let (level, page, block, par, line) = (ints[0], ints[1], ints[2], ints[3], ints[4]);

        match level {
            PAGE_LEVEL => {
                page_sizes.insert(page, (geometry[2], geometry[3]));
            }
            WORD_LEVEL => {
                let text = cols.get(11).map(|t| t.trim()).unwrap_or("");
                if text.is_empty() {
                    continue;
                }
                let conf = cols[10].trim().parse::<f64>().unwrap_or(-1.0);
                lines.entry((page, block, par, line)).or_default().push(Word {
                    text: text.to_string(),
                    conf,
                    left: geometry[0],
                    top: geometry[1],
                    width: geometry[2],
                    height: geometry[3],
                });
            }
            _ => {}
        }
    }

    lines
        .into_iter()
        .map(|((page, ..), words)| build_line(&words, page_sizes.get(&page).copied()))
        .collect()
}

fn build_line(words: &[Word], page_size: Option<(f64, f64)>) -> OcrLine {
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let confs: Vec<f64> = words.iter().map(|w| w.conf).filter(|c| *c >= 0.0).collect();
    let confidence = if confs.is_empty() {
        None
    } else {
        Some(confs.iter().sum::<f64>() / confs.len() as f64)
    };

    let bounding_box = page_size
        .filter(|(w, h)| *w > 0.0 && *h > 0.0)
        .and_then(|(page_w, page_h)| {
            words
                .iter()
                .map(|w| BoundingBox {
                    left: w.left / page_w,
                    top: w.top / page_h,
                    width: w.width / page_w,
                    height: w.height / page_h,
                })
                .reduce(|acc, b| acc.union(&b))
        });

    OcrLine {
        text,
        confidence,
        bounding_box,
    }
}
