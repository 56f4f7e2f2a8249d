use runwatch::capture::LogFacade;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry, EnvFilter};

/// An isolated logging facade wired into a thread-local subscriber.
///
/// Keeps tests independent of the process-wide facade: events emitted on
/// this thread while the scope is alive reach `facade` and nothing else.
/// Use it with the default current-thread `#[tokio::test]` runtime so that
/// spawned tasks run on the same thread.
pub struct CaptureScope {
    pub facade: LogFacade,
    _guard: DefaultGuard,
}

impl CaptureScope {
    pub fn facade(&self) -> &LogFacade {
        &self.facade
    }
}

/// Install a fresh facade as this thread's default subscriber.
pub fn capture_scope() -> CaptureScope {
    let facade = LogFacade::new();

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = registry()
        .with(
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .with_filter(console_filter),
        )
        .with(facade.layer());

    let guard = tracing::subscriber::set_default(subscriber);
    CaptureScope {
        facade,
        _guard: guard,
    }
}
