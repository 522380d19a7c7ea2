//! # LogWriter: tracing-backed event writer
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`.
//! The host decides where the records go by installing a `tracing` subscriber.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO  watchvisor: unit transition unit=db status=starting attempts=0
//! INFO  watchvisor: unit transition unit=db status=running attempts=0
//! WARN  watchvisor: unit failed unit=mailer attempts=1 error=operation failed: smtp down
//! ERROR watchvisor: subscriber panicked subscriber=metrics info=boom
//! ```

use async_trait::async_trait;

use crate::core::Status;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::StatusChanged => {
                let Some(st) = &e.state else { return };
                match st.status {
                    Status::Failed => {
                        let error = st
                            .last_error
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default();
                        tracing::warn!(
                            target: "watchvisor",
                            unit = %st.id,
                            attempts = st.restart_attempts,
                            error = %error,
                            "unit failed"
                        );
                    }
                    status => {
                        tracing::info!(
                            target: "watchvisor",
                            unit = %st.id,
                            status = %status,
                            attempts = st.restart_attempts,
                            "unit transition"
                        );
                    }
                }
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(
                    target: "watchvisor",
                    subscriber = e.subscriber.unwrap_or("unknown"),
                    info = e.reason.as_deref().unwrap_or("unknown"),
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
