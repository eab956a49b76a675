//! Producer-side publishing with exactly-once termination.
//!
//! A [`StreamPublisher`] wraps a request's context so producers can emit
//! typed events without touching the queue directly. The terminal sequence
//! (`agent_output`/`error` followed by `end_of_stream`) is guarded by an
//! atomic flag: whichever producer terminates first wins, later terminal
//! publishes are dropped, and non-terminal events after termination are
//! discarded with a warning.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::RequestContext;
use crate::event::{ErrorKind, StreamEvent};

// ─────────────────────────────────────────────────────────────────────────────
// Stream Publisher
// ─────────────────────────────────────────────────────────────────────────────

/// Publishes typed events for one request, enforcing the termination
/// contract.
#[derive(Debug, Clone)]
pub struct StreamPublisher {
    context: Arc<RequestContext>,
    terminated: Arc<AtomicBool>,
}

impl StreamPublisher {
    /// Create a publisher over the given request context.
    pub fn new(context: Arc<RequestContext>) -> Self {
        Self {
            context,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The context this publisher writes to.
    pub fn context(&self) -> &Arc<RequestContext> {
        &self.context
    }

    /// Returns true once a terminal sequence has been published.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Publish a `tool_init` event with a human-readable label.
    pub fn tool_init(&self, label: impl Into<String>) {
        self.publish_non_terminal(StreamEvent::tool_init(label));
    }

    /// Publish a `tool_output` event carrying a tool's raw structured result.
    pub fn tool_output(&self, payload: serde_json::Value) {
        self.publish_non_terminal(StreamEvent::tool_output(payload));
    }

    /// Publish the final answer and terminate the stream.
    ///
    /// Emits `agent_output` followed by `end_of_stream`. No-op if the stream
    /// already terminated.
    pub fn finish(&self, message: impl Into<String>) {
        self.terminate_with(Some(StreamEvent::agent_output(message)));
    }

    /// Publish a classified failure and terminate the stream.
    ///
    /// Emits `error` followed by `end_of_stream`. No-op if the stream
    /// already terminated, so racing failure paths produce exactly one
    /// terminal sequence.
    pub fn fail(&self, kind: ErrorKind, description: impl Into<String>) {
        self.terminate_with(Some(StreamEvent::error(kind, description)));
    }

    /// Terminate the stream with no final payload event.
    pub fn end_of_stream(&self) {
        self.terminate_with(None);
    }

    /// Create a guard that force-terminates the stream when dropped.
    ///
    /// If nothing terminal has been published by the time the guard drops
    /// (early return, panic unwound past the producer), it emits an
    /// `internal_failure` error plus `end_of_stream` so the client stream
    /// can never hang open.
    pub fn guard(&self) -> TerminationGuard {
        TerminationGuard {
            publisher: self.clone(),
        }
    }

    fn publish_non_terminal(&self, event: StreamEvent) {
        if self.is_terminated() {
            tracing::warn!(?event, "Event dropped: stream already terminated");
            return;
        }
        self.context.publish(event);
    }

    fn terminate_with(&self, event: Option<StreamEvent>) {
        // First terminator wins; everyone else is a no-op.
        if self
            .terminated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        if let Some(event) = event {
            self.context.publish(event);
        }
        self.context.publish(StreamEvent::EndOfStream);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Termination Guard
// ─────────────────────────────────────────────────────────────────────────────

/// Guarantees the termination contract for a request.
///
/// Held by the orchestrating caller for the duration of all producer
/// activity; see [`StreamPublisher::guard`].
#[derive(Debug)]
pub struct TerminationGuard {
    publisher: StreamPublisher,
}

impl Drop for TerminationGuard {
    fn drop(&mut self) {
        if !self.publisher.is_terminated() {
            self.publisher.fail(
                ErrorKind::InternalFailure,
                "The request ended before producing a result",
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
