// src/progress/extract.rs

//! Pure progress extraction.
//!
//! Workers announce units of work with lines such as
//!
//! ```text
//! [2/5] pkg-b: Running build...
//! ⚠️ [2/5] pkg-b: deprecated option
//! [2/5] pkg-b: completed
//! ✅ [3/5] pkg-c
//! ```
//!
//! [`extract_progress`] reads the whole buffer on every call and derives a
//! [`ProgressSnapshot`]; it keeps no state between calls.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::capture::clean::strip_ansi;

/// Label used by discovery announcements.
///
/// A marker carrying this label reports the discovered total and never names
/// the unit currently being worked on. Use [`discovery_line`] to produce one.
pub const DISCOVERY_LABEL: &str = "discovery";

/// Case-insensitive words in a marker's action that mark a unit as done.
pub const COMPLETION_TOKENS: &[&str] = &["completed", "success", "finished"];

/// Message used when nothing better can be derived.
pub const DEFAULT_MESSAGE: &str = "Processing...";

const SUCCESS_GLYPHS: &[char] = &['✅', '✓', '✔'];

/// `[index/total] label: action`, anywhere in the line.
static UNIT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(\d+)/(\d+)\]\s*([^:\[\]]+?)\s*:\s*(.*)$").expect("valid unit marker regex")
});

/// A success glyph directly followed by `[index/total]`, no label required.
static GLYPH_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[✅✓✔]\s*\[(\d+)/(\d+)\]").expect("valid glyph marker regex"));

/// Derived view of a log buffer at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_package: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_index: Option<u64>,
    pub completed_count: u64,
    pub message: String,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            current_package: None,
            current_index: None,
            completed_count: 0,
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

/// Format a discovery announcement the extractor will not treat as a unit.
pub fn discovery_line(total: u64, message: &str) -> String {
    format!("[0/{total}] {DISCOVERY_LABEL}: {message}")
}

struct UnitMarker<'a> {
    index: u64,
    total: u64,
    label: &'a str,
    action: &'a str,
}

fn parse_marker(line: &str) -> Option<UnitMarker<'_>> {
    let caps = UNIT_MARKER.captures(line)?;
    Some(UnitMarker {
        index: caps.get(1)?.as_str().parse().ok()?,
        total: caps.get(2)?.as_str().parse().ok()?,
        label: caps.get(3)?.as_str().trim(),
        action: caps.get(4).map_or("", |m| m.as_str()),
    })
}

fn is_completion_action(action: &str) -> bool {
    let lower = action.to_lowercase();
    COMPLETION_TOKENS.iter().any(|token| lower.contains(token))
        || action.contains(SUCCESS_GLYPHS)
}

/// Index completed by this line, if it is a completion signal at all.
fn completed_index(line: &str, marker: Option<&UnitMarker<'_>>) -> Option<u64> {
    let labelled = marker
        .filter(|m| is_completion_action(m.action))
        .map(|m| m.index);
    let glyph = GLYPH_MARKER
        .captures(line)
        .and_then(|caps| caps.get(1)?.as_str().parse::<u64>().ok());

    match (labelled, glyph) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Strip colour codes and the level marker from a displayed line.
fn clean_line(line: &str) -> String {
    let stripped = strip_ansi(line);
    let trimmed = stripped.trim();
    let without_marker = trimmed
        .strip_prefix('❌')
        .or_else(|| trimmed.strip_prefix("⚠️"))
        .unwrap_or(trimmed);
    without_marker.trim().to_string()
}

/// Derive a snapshot from `logs` (oldest first).
///
/// `known_total` takes precedence over totals embedded in the markers.
pub fn extract_progress(logs: &[String], known_total: Option<u64>) -> ProgressSnapshot {
    if logs.is_empty() {
        return ProgressSnapshot::default();
    }

    let mut current: Option<(String, u64, u64)> = None;
    let mut newest_total: Option<u64> = None;
    let mut completed_count = 0u64;

    for line in logs.iter().rev() {
        let marker = parse_marker(line);

        if let Some(m) = &marker {
            newest_total.get_or_insert(m.total);
            if current.is_none() && m.label != DISCOVERY_LABEL {
                current = Some((m.label.to_string(), m.index, m.total));
            }
        }

        if let Some(index) = completed_index(line, marker.as_ref()) {
            completed_count = completed_count.max(index);
        }
    }

    let total = known_total.or(current.as_ref().map(|(_, _, t)| *t)).or(newest_total);

    let message = match (&current, total) {
        (Some((package, index, _)), Some(total)) => {
            format!("Processing {package} ({index}/{total})")
        }
        (Some((package, _, _)), None) => format!("Processing {package}"),
        (None, Some(total)) => format!("Processed {completed_count}/{total}"),
        (None, None) => logs
            .iter()
            .rev()
            .map(|line| clean_line(line))
            .find(|line| !line.is_empty())
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
    };

    let (current_package, current_index) = match current {
        Some((package, index, _)) => (Some(package), Some(index)),
        None => (None, None),
    };

    ProgressSnapshot {
        current_package,
        current_index,
        completed_count,
        message,
    }
}
