// src/capture/clean.rs

//! Line cleaning and level classification.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::Level;

/// CSI / SGR escape sequences (colours, cursor movement).
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("valid ANSI regex")
});

/// Level-name prefixes such as `ERROR:`, `warn - ` or `[info]`.
static LEVEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:\[(error|warn|warning|info|debug|trace)\]|(error|warn|warning|info|debug|trace)(?:\s*:|\s+-\s))\s*",
    )
    .expect("valid level prefix regex")
});

const ERROR_MARKER: &str = "❌ ";
const WARN_MARKER: &str = "⚠️ ";

/// One cleaned, classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLogLine {
    pub level: Level,
    pub message: String,
}

impl CapturedLogLine {
    /// Plain text with the level marker in front.
    pub fn display(&self) -> String {
        format!("{}{}", level_marker(self.level), self.message)
    }
}

/// Small indicator prepended to displayed lines.
pub fn level_marker(level: Level) -> &'static str {
    match level {
        Level::ERROR => ERROR_MARKER,
        Level::WARN => WARN_MARKER,
        _ => "",
    }
}

pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_ESCAPE.replace_all(text, "")
}

/// Clean a raw line and work out its level.
///
/// A recognised level prefix (or an existing marker glyph) wins over
/// `default`, and is removed from the message. Returns `None` for lines that
/// are blank once cleaned.
pub fn classify(default: Level, raw: &str) -> Option<CapturedLogLine> {
    let stripped = strip_ansi(raw);
    let mut text = stripped.trim_end();
    let mut level = default;

    if let Some(caps) = LEVEL_PREFIX.captures(text) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        if let Some(parsed) = parse_level_name(&name) {
            level = parsed;
        }
        text = &text[caps.get(0).map_or(0, |m| m.end())..];
    } else if let Some(rest) = text.trim_start().strip_prefix(ERROR_MARKER.trim_end()) {
        level = Level::ERROR;
        text = rest;
    } else if let Some(rest) = text.trim_start().strip_prefix(WARN_MARKER.trim_end()) {
        level = Level::WARN;
        text = rest;
    }

    let message = text.trim();
    if message.is_empty() {
        return None;
    }

    Some(CapturedLogLine {
        level,
        message: message.to_string(),
    })
}

fn parse_level_name(name: &str) -> Option<Level> {
    match name {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
