// src/capture/facade.rs

//! Process-wide logging facade with an explicit sink registry.
//!
//! The facade is attached to the `tracing` pipeline once (see
//! [`crate::logging::init_logging`]) through [`FacadeLayer`]. Sinks are then
//! attached and detached at runtime without touching the subscriber itself,
//! so a collector never disturbs the formatter or any other sink.

use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Targets whose events are orchestration chatter rather than worker output.
///
/// Events from these modules still reach the formatter, but are never handed
/// to sinks: otherwise the orchestrator's own debug lines would end up in the
/// captured buffer and skew progress extraction.
const INTERNAL_TARGETS: &[&str] = &[
    "runwatch::capture",
    "runwatch::discovery",
    "runwatch::engine",
    "runwatch::exec",
    "runwatch::logging",
    "runwatch::notify",
    "runwatch::progress",
];

/// Identifier returned by [`LogFacade::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

/// A single event as seen by sinks.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: Level,
    pub target: &'a str,
    /// Message followed by any extra fields rendered as ` key=value`.
    pub text: &'a str,
}

/// Something that wants to observe log events.
pub trait LogSink: Send + Sync {
    fn record(&self, record: &LogRecord<'_>);
}

#[derive(Default)]
struct FacadeInner {
    sinks: RwLock<Vec<(SinkId, Arc<dyn LogSink>)>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a sink registry.
///
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct LogFacade {
    inner: Arc<FacadeInner>,
}

impl fmt::Debug for LogFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFacade")
            .field("sinks", &self.sink_count())
            .finish()
    }
}

impl LogFacade {
    /// Create an isolated registry (mostly useful for tests).
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry wired into the global subscriber.
    pub fn global() -> &'static LogFacade {
        static GLOBAL: OnceLock<LogFacade> = OnceLock::new();
        GLOBAL.get_or_init(LogFacade::new)
    }

    /// Register an additional sink.
    pub fn attach(&self, sink: Arc<dyn LogSink>) -> SinkId {
        let id = SinkId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, sink));
        id
    }

    /// Remove exactly the sink registered under `id`.
    ///
    /// Returns `false` if it was already gone.
    pub fn detach(&self, id: SinkId) -> bool {
        let mut sinks = self
            .inner
            .sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = sinks.len();
        sinks.retain(|(sid, _)| *sid != id);
        sinks.len() != before
    }

    pub fn sink_count(&self) -> usize {
        self.inner
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Build a layer that forwards events into this registry.
    pub fn layer(&self) -> FacadeLayer {
        FacadeLayer {
            facade: self.clone(),
        }
    }

    /// Hand a record to every attached sink.
    pub fn dispatch(&self, record: &LogRecord<'_>) {
        // Snapshot first so a sink that logs does not re-enter the lock.
        let sinks: Vec<Arc<dyn LogSink>> = self
            .inner
            .sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();

        for sink in sinks {
            sink.record(record);
        }
    }
}

/// `tracing_subscriber` layer feeding a [`LogFacade`].
#[derive(Debug, Clone)]
pub struct FacadeLayer {
    facade: LogFacade,
}

impl<S: Subscriber> Layer<S> for FacadeLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal_target(meta.target()) || self.facade.sink_count() == 0 {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let text = visitor.finish();

        self.facade.dispatch(&LogRecord {
            level: *meta.level(),
            target: meta.target(),
            text: &text,
        });
    }
}

fn is_internal_target(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Renders an event as `message key=value ...`.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
