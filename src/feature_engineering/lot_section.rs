//! Lot section extraction from tender PDF text
//!
//! Tender notices number their sections; the lot descriptions live under
//! heading 5 and run until heading 6. Extraction prefers the whole "5 Lot"
//! block and falls back to collecting "5.x" subsection blocks.

use once_cell::sync::Lazy;
use regex::Regex;

static LOT_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\n)\s*5\s+lot").expect("valid lot heading pattern"));

static SECTION_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*6\s+").expect("valid section terminator pattern"));

static SUBSECTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\n)\s*5\.\d+").expect("valid subsection pattern"));

static SUBSECTION_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*6\.\d+").expect("valid subsection terminator pattern"));

/// Extract the lot section from extracted PDF text.
///
/// Returns the trimmed "5 Lot ..." block up to the next top-level "6 "
/// heading, or the joined "5.x" subsection blocks when no top-level lot
/// heading exists. Returns an empty string when the text has no lot
/// section at all.
pub fn extract_lot_section(text: &str) -> String {
    if let Some(heading) = LOT_HEADING.find(text) {
        let after = heading.end();
        let end = SECTION_END
            .find(&text[after..])
            .map(|t| after + t.start())
            .unwrap_or(text.len());
        return text[heading.start()..end].trim().to_string();
    }

    let mut blocks = Vec::new();
    let mut offset = 0;
    while offset < text.len() {
        let Some(start) = SUBSECTION_START.find(&text[offset..]) else {
            break;
        };
        let block_start = offset + start.start();
        let after = offset + start.end();
        let block_end = SUBSECTION_END
            .find(&text[after..])
            .map(|t| after + t.start())
            .unwrap_or(text.len());

        let block = text[block_start..block_end].trim();
        if !block.is_empty() {
            blocks.push(block.to_string());
        }
        offset = block_end.max(after);
    }

    blocks.join("\n")
}
