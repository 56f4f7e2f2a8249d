// src/capture/collector.rs

//! Per-run capturing sink.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{Level, debug};

use super::clean::{CapturedLogLine, classify};
use super::facade::{LogFacade, LogRecord, LogSink, SinkId};

/// Options controlling what a collector keeps.
#[derive(Debug, Clone, Copy)]
pub struct CollectorOptions {
    /// Most verbose level that is still buffered.
    pub min_level: Level,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            min_level: Level::INFO,
        }
    }
}

/// Append-only buffer shared between the sink and its readers.
#[derive(Debug, Default)]
struct LineBuffer {
    lines: Mutex<Vec<CapturedLogLine>>,
}

impl LineBuffer {
    fn push(&self, line: CapturedLogLine) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    fn display_from(&self, start: usize) -> Vec<String> {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines
            .iter()
            .skip(start)
            .map(CapturedLogLine::display)
            .collect()
    }

    fn raw(&self) -> Vec<CapturedLogLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

struct BufferSink {
    buffer: Arc<LineBuffer>,
    min_level: Level,
}

impl LogSink for BufferSink {
    fn record(&self, record: &LogRecord<'_>) {
        for raw in record.text.lines() {
            let Some(line) = classify(record.level, raw) else {
                continue;
            };
            // More verbose levels compare greater.
            if line.level <= self.min_level {
                self.buffer.push(line);
            }
        }
    }
}

/// Read-only view of a collector's buffer.
///
/// Readers stay valid after teardown; they simply stop growing.
#[derive(Debug, Clone)]
pub struct LogReader {
    buffer: Arc<LineBuffer>,
}

impl LogReader {
    /// Ordered snapshot of every captured line, with level markers.
    pub fn read(&self) -> Vec<String> {
        self.buffer.display_from(0)
    }

    /// Lines appended at or after `cursor`.
    pub fn read_since(&self, cursor: usize) -> Vec<String> {
        self.buffer.display_from(cursor)
    }

    /// Snapshot of the structured lines.
    pub fn lines(&self) -> Vec<CapturedLogLine> {
        self.buffer.raw()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entry point for installing a collector.
pub struct LogCollector;

impl LogCollector {
    /// Attach a new capturing sink to `facade`.
    pub fn install(facade: &LogFacade, options: CollectorOptions) -> CollectorHandle {
        let buffer = Arc::new(LineBuffer::default());
        let sink = Arc::new(BufferSink {
            buffer: Arc::clone(&buffer),
            min_level: options.min_level,
        });
        let id = facade.attach(sink);
        debug!(?id, min_level = %options.min_level, "log collector installed");

        CollectorHandle {
            facade: facade.clone(),
            reader: LogReader { buffer },
            id: Some(id),
        }
    }
}

/// Owning handle for an installed collector.
///
/// The sink is detached by [`CollectorHandle::teardown`] or, failing that,
/// when the handle is dropped.
#[derive(Debug)]
pub struct CollectorHandle {
    facade: LogFacade,
    reader: LogReader,
    id: Option<SinkId>,
}

impl CollectorHandle {
    pub fn read(&self) -> Vec<String> {
        self.reader.read()
    }

    pub fn read_since(&self, cursor: usize) -> Vec<String> {
        self.reader.read_since(cursor)
    }

    pub fn len(&self) -> usize {
        self.reader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_empty()
    }

    /// A reader that outlives the handle.
    pub fn reader(&self) -> LogReader {
        self.reader.clone()
    }

    pub fn is_installed(&self) -> bool {
        self.id.is_some()
    }

    /// Detach the sink. Safe to call more than once.
    pub fn teardown(&mut self) {
        if let Some(id) = self.id.take() {
            let removed = self.facade.detach(id);
            debug!(?id, removed, lines = self.reader.len(), "log collector removed");
        }
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}
