//! Diagnostics sink used by the dispatcher.

use std::error::Error;

/// Receives every diagnostic the client emits.
///
/// Swap it with [`crate::QuipClient::with_logger`] to route messages elsewhere
/// or to capture them in tests.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn error(&self, message: &str, detail: Option<&(dyn Error + 'static)>);
}

/// Default logger, forwarding to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn error(&self, message: &str, detail: Option<&(dyn Error + 'static)>) {
        match detail {
            Some(detail) => tracing::error!(error = %detail, "{message}"),
            None => tracing::error!("{message}"),
        }
    }
}
