// src/progress/mod.rs

//! Heuristic progress extraction from free-text log lines.

pub mod extract;

pub use extract::{
    COMPLETION_TOKENS, DEFAULT_MESSAGE, DISCOVERY_LABEL, ProgressSnapshot, discovery_line,
    extract_progress,
};
