// src/capture/mod.rs

//! Log capture layer.
//!
//! Worker operations only speak free text through `tracing`. This module
//! turns that text into an ordered, cleaned buffer the progress extractor can
//! read while the operation is still running.
//!
//! - [`facade`] holds the process-wide sink registry and the
//!   `tracing_subscriber::Layer` that feeds it.
//! - [`clean`] strips colour codes and level prefixes and classifies lines.
//! - [`collector`] is the per-run capturing sink with an explicit teardown.

pub mod clean;
pub mod collector;
pub mod facade;

pub use clean::{CapturedLogLine, level_marker};
pub use collector::{CollectorHandle, CollectorOptions, LogCollector, LogReader};
pub use facade::{FacadeLayer, LogFacade, LogRecord, LogSink, SinkId};
