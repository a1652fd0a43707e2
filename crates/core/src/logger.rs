//! Pluggable logging for pipeline and adapter internals.
//!
//! Settled hook failures, detached-task errors, and similar diagnostics go
//! through the [`Logger`] trait rather than a fixed backend, so embedders
//! with their own logging stack can capture them. [`TracingLogger`] is the
//! default and forwards each level to the matching `tracing` macro.

use std::fmt;
use std::sync::Arc;

/// Sink for diagnostics the pipeline emits on its own behalf.
///
/// [`Adapters`](crate::adapters::Adapters) carries one of these; swap it
/// via `with_logger` to route diagnostics somewhere other than `tracing`.
///
/// # Example
///
/// ```rust
/// use tenantkit_core::logger::Logger;
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn info(&self, message: &str) {
///         eprintln!("info: {}", message);
///     }
///     fn warn(&self, message: &str) {
///         eprintln!("warn: {}", message);
///     }
///     fn error(&self, message: &str) {
///         eprintln!("error: {}", message);
///     }
///     fn debug(&self, message: &str) {
///         eprintln!("debug: {}", message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    fn debug(&self, message: &str);
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Logger")
    }
}

/// Forwards each level to the corresponding `tracing` macro.
#[derive(Debug, Clone)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// The logger wired in when the caller does not supply one.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}
