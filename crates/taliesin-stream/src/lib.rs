//! Request-scoped streaming event pipeline.
//!
//! Every inbound request gets one [`RequestContext`] owning one
//! [`EventQueue`]: an unbounded multi-producer / single-consumer channel of
//! [`StreamEvent`]s. Producers (tool invocations, the summarizer, the
//! top-level reasoning loop) publish through a [`StreamPublisher`]; the
//! transport layer drains the queue into the client connection until the
//! `end_of_stream` sentinel.
//!
//! # Invariants
//!
//! - Events reach the consumer in enqueue order; producers never block.
//! - Exactly one terminal `end_of_stream` is published per request, after
//!   all producers have finished or definitively failed; the publisher's
//!   atomic terminal flag and the [`TerminationGuard`] enforce this.
//! - Draining is single-consumption: the stream ends right after the
//!   sentinel and a second drain yields nothing.

pub mod context;
pub mod event;
pub mod publisher;

pub use context::{EventQueue, EventStream, RequestContext};
pub use event::{ErrorKind, StreamEvent};
pub use publisher::{StreamPublisher, TerminationGuard};
