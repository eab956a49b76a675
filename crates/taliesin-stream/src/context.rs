//! Per-request context and event queue.
//!
//! A [`RequestContext`] is created when a client request arrives and torn
//! down when it ends; it is never shared across requests and never
//! persisted. It owns exactly one [`EventQueue`] for its lifetime plus the
//! request-scoped metadata (timezone, the free-form prompt text) tools need.

use futures::Stream;
use parking_lot::Mutex;
use std::pin::Pin;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::StreamEvent;

/// A finite, ordered stream of drained events.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send + 'static>>;

// ─────────────────────────────────────────────────────────────────────────────
// Event Queue
// ─────────────────────────────────────────────────────────────────────────────

/// Unbounded FIFO of [`StreamEvent`], written by N concurrent producers and
/// read by exactly one consumer.
///
/// Publishing never blocks; unbounded growth is the accepted trade-off for
/// keeping producers decoupled from a slow consumer. Draining is
/// single-consumption: the receiver half is handed out once.
#[derive(Debug)]
pub struct EventQueue {
    sender: mpsc::UnboundedSender<StreamEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<StreamEvent>>>,
}

impl EventQueue {
    /// Create a fresh, empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Enqueue an event. Never blocks.
    ///
    /// Events published after the consumer has gone away are dropped with a
    /// warning; by then nobody can observe them.
    pub fn publish(&self, event: StreamEvent) {
        if self.sender.send(event).is_err() {
            tracing::warn!("Event dropped: stream consumer is gone");
        }
    }

    /// Drain the queue as a lazy stream.
    ///
    /// Events arrive in enqueue order. The stream ends immediately after
    /// yielding the `end_of_stream` sentinel. A second call yields an empty
    /// stream: a queue is consumed at most once.
    pub fn drain(&self) -> EventStream {
        let receiver = self.receiver.lock().take();
        Box::pin(async_stream::stream! {
            let Some(mut receiver) = receiver else {
                return;
            };
            while let Some(event) = receiver.recv().await {
                let terminal = event.is_terminal();
                yield event;
                if terminal {
                    return;
                }
            }
        })
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Context
// ─────────────────────────────────────────────────────────────────────────────

/// Request-scoped state: one event queue plus metadata.
#[derive(Debug)]
pub struct RequestContext {
    request_id: Uuid,
    prompt: String,
    timezone: Option<String>,
    queue: EventQueue,
}

impl RequestContext {
    /// Create a context with a fresh queue and default metadata.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            prompt: String::new(),
            timezone: None,
            queue: EventQueue::new(),
        }
    }

    /// Set the free-form prompt text.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the client's timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// The correlation id for this request.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The prompt text this request carries.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The client's timezone, if it sent one.
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// Enqueue an event on this request's queue.
    pub fn publish(&self, event: StreamEvent) {
        self.queue.publish(event);
    }

    /// Drain this request's queue. Single-consumption.
    pub fn drain(&self) -> EventStream {
        self.queue.drain()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::event::ErrorKind;

    #[tokio::test]
    async fn test_events_drain_in_enqueue_order() {
        let queue = EventQueue::new();
        queue.publish(StreamEvent::tool_init("a"));
        queue.publish(StreamEvent::tool_init("b"));
        queue.publish(StreamEvent::EndOfStream);

        let events: Vec<_> = queue.drain().collect().await;
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], StreamEvent::ToolInit { message } if message == "a"));
        assert!(matches!(&events[1], StreamEvent::ToolInit { message } if message == "b"));
        assert!(events[2].is_terminal());
    }

    #[tokio::test]
    async fn test_drain_stops_at_sentinel() {
        let queue = EventQueue::new();
        queue.publish(StreamEvent::EndOfStream);
        queue.publish(StreamEvent::tool_init("after the end"));

        let events: Vec<_> = queue.drain().collect().await;
        assert_eq!(events, vec![StreamEvent::EndOfStream]);
    }

    #[tokio::test]
    async fn test_second_drain_is_empty() {
        let queue = EventQueue::new();
        queue.publish(StreamEvent::EndOfStream);

        let first: Vec<_> = queue.drain().collect().await;
        assert_eq!(first.len(), 1);

        let second: Vec<_> = queue.drain().collect().await;
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_publish_never_blocks_and_consumer_waits() {
        let context = Arc::new(RequestContext::new());

        // Consumer starts before any event exists.
        let drained = tokio::spawn({
            let context = context.clone();
            async move { context.drain().collect::<Vec<_>>().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        context.publish(StreamEvent::agent_output("answer"));
        context.publish(StreamEvent::EndOfStream);

        let events = tokio::time::timeout(Duration::from_secs(1), drained)
            .await
            .expect("drain must terminate")
            .unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }

    #[tokio::test]
    async fn test_concurrent_producers_interleave_but_stay_ordered() {
        let context = Arc::new(RequestContext::new());

        let mut producers = Vec::new();
        for producer in 0..4 {
            let context = context.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..25 {
                    context.publish(StreamEvent::tool_init(format!("{producer}:{i}")));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        context.publish(StreamEvent::EndOfStream);

        let events: Vec<_> = context.drain().collect().await;
        assert_eq!(events.len(), 101);

        // Per-producer order is preserved regardless of interleaving.
        for producer in 0..4 {
            let positions: Vec<usize> = events
                .iter()
                .filter_map(|e| match e {
                    StreamEvent::ToolInit { message } => message
                        .strip_prefix(&format!("{producer}:"))
                        .and_then(|i| i.parse().ok()),
                    _ => None,
                })
                .collect();
            assert_eq!(positions, (0..25).collect::<Vec<_>>());
        }
    }

    #[tokio::test]
    async fn test_publish_after_consumer_dropped_is_silent() {
        let queue = EventQueue::new();
        queue.publish(StreamEvent::EndOfStream);
        let _: Vec<_> = queue.drain().collect().await;

        // Receiver is gone; this must not panic or block.
        queue.publish(StreamEvent::error(ErrorKind::InternalFailure, "late"));
    }

    #[test]
    fn test_context_metadata() {
        let context = RequestContext::new()
            .with_prompt("what moved the market today?")
            .with_timezone("America/Edmonton");

        assert_eq!(context.prompt(), "what moved the market today?");
        assert_eq!(context.timezone(), Some("America/Edmonton"));
    }

    #[test]
    fn test_contexts_are_isolated() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.request_id(), b.request_id());

        a.publish(StreamEvent::tool_init("only in a"));
        // Queue b stays empty; nothing to assert beyond isolation of ids and
        // queues, which drain() tests cover.
        drop(b);
    }
}
